//! Simulation core: the circuit model seam, simulation time, waveform
//! capture and the driver that ties them together.

/// Simulation clock (half-cycle tick counter).
pub mod clock;

/// Device handle lifecycle, clock engine and signal accessors.
pub mod driver;

/// Interface to an opaque clocked circuit model.
pub mod model;

/// Cycle-windowed waveform capture and the sink interface.
pub mod trace;

/// VCD waveform sink.
pub mod vcd;

pub use clock::{SimClock, TICKS_PER_CYCLE};
pub use driver::{Driver, RESET_CYCLES};
pub use model::{Model, TraceVar};
pub use trace::{TraceWindow, WaveformSink};
pub use vcd::VcdSink;
