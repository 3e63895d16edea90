//! Cycle-Accurate RTL Device Driver Library.
//!
//! This crate drives clocked circuit models from the outside, the way a
//! testbench drives a compiled RTL simulation: it resets the model, advances
//! it in two-phase clock cycles, stages and samples its ports, optionally
//! captures a time-windowed waveform, and layers handshake protocols on top.
//!
//! # Architecture
//!
//! * **Driver**: exclusive owner of one model; reset, clock engine, trace
//!   window and typed port accessors.
//! * **Protocols**: bounded ready/valid transfer, byte-serial transmit and
//!   receive, run-to-completion polling, and a testbench serial line codec.
//! * **Devices**: port tables and convenience operations for the ASCII
//!   rectangle unit, the UART loopback, the UART bridge and the rectangle
//!   search engine.
//!
//! # Modules
//!
//! * `common`: Error type and port declarations.
//! * `config`: Configuration loading and parsing.
//! * `devices`: Device specializations.
//! * `models`: In-process reference models.
//! * `protocol`: Protocol adapters.
//! * `sim`: Model interface, clock, driver and waveform capture.
//! * `stats`: Run statistics collection.

/// Shared error type and declarative port tables.
///
/// Provides the crate-wide `SimError`/`Result` pair and the `PortDecl`,
/// `Port<T>` and `PortSet` types every device binds its signals with.
pub mod common;

/// Configuration for timeouts, the trace window and the UART divisor.
///
/// Loads and validates TOML files; every field has a default so an empty
/// document is a valid configuration.
pub mod config;

/// Device specializations of the generic driver.
///
/// Each device declares its port set once and wraps a `Driver` with the
/// operations the device is exercised through.
pub mod devices;

/// Behavioral circuit models usable in place of compiled RTL.
pub mod models;

/// Handshake and polling idioms built on the clock engine and accessors.
pub mod protocol;

/// Simulation core: model interface, clock, driver and waveform capture.
///
/// Owns the two-phase clocking discipline and the cycle-windowed trace.
pub mod sim;

/// Run statistics collection and reporting.
pub mod stats;

pub use common::{Result, SimError};
pub use config::Config;
pub use protocol::Completion;
pub use sim::{Driver, Model};

/// Installs a `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when set. Calling it again once
/// a subscriber is installed has no effect.
///
/// # Arguments
///
/// * `level` - Default filter directive, for example `"info"` or
///   `"rtl_driver=debug"`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
