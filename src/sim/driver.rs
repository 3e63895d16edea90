//! Cycle-Accurate Device Driver.
//!
//! [`Driver`] owns one circuit model and is the only way to move it through
//! simulated time. It runs the reset sequence on construction, advances the
//! clock in two evaluations per cycle (clock low, then clock high), feeds the
//! optional trace window after each evaluation, and exposes typed access to
//! the model's declared ports.
//!
//! # Preconditions
//!
//! Using a driver after [`Driver::teardown`], or naming a port outside the
//! model's port set, is a programming error and panics.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::common::{Port, PortDecl, PortSet, PortValue, Result, CLOCK, RESET};
use crate::config::TraceConfig;
use crate::sim::clock::SimClock;
use crate::sim::model::Model;
use crate::sim::trace::{TraceWindow, WaveformSink};
use crate::sim::vcd::VcdSink;
use crate::stats::SimStats;

/// Full clock cycles driven with reset asserted during initialization.
pub const RESET_CYCLES: u32 = 5;

/// Exclusive owner of a live circuit model.
pub struct Driver<M: Model> {
    model: Option<M>,
    ports: &'static PortSet,
    clock: SimClock,
    trace: Option<TraceWindow>,
    trace_config: TraceConfig,
    /// Run statistics, updated by the clock engine and protocol adapters.
    pub stats: SimStats,
}

fn live<M>(slot: &Option<M>) -> &M {
    match slot {
        Some(model) => model,
        None => panic!("driver used after teardown"),
    }
}

fn live_mut<M>(slot: &mut Option<M>) -> &mut M {
    match slot {
        Some(model) => model,
        None => panic!("driver used after teardown"),
    }
}

impl<M: Model> Driver<M> {
    /// Takes ownership of `model` and resets it.
    ///
    /// Reset is asserted for exactly [`RESET_CYCLES`] full cycles, then
    /// released, and every input is staged at its idle value. The simulation
    /// clock starts at zero afterwards; reset cycles are not counted and are
    /// never traced.
    pub fn initialize(mut model: M) -> Self {
        let ports = model.port_set();
        let mut stats = SimStats::default();

        model.poke(&RESET, 1);
        for _ in 0..RESET_CYCLES {
            model.poke(&CLOCK, 0);
            model.eval();
            model.poke(&CLOCK, 1);
            model.eval();
            stats.evaluations += 2;
        }
        model.poke(&RESET, 0);

        for port in ports.inputs() {
            model.poke(port, ports.idle_value(port));
        }

        debug!(device = ports.name, "initialized");

        Self {
            model: Some(model),
            ports,
            clock: SimClock::new(),
            trace: None,
            trace_config: TraceConfig::default(),
            stats,
        }
    }

    /// Replaces the trace depth and timescale used by later
    /// [`Driver::enable_waveform`] calls.
    pub fn with_trace_config(mut self, config: &TraceConfig) -> Self {
        self.trace_config = config.clone();
        self
    }

    /// Releases the model.
    ///
    /// Closes any attached waveform sink, then finalizes and drops the model.
    /// Calling it again is a no-op.
    ///
    /// # Returns
    ///
    /// The sink's first write or close failure, if any. The model is torn
    /// down regardless.
    pub fn teardown(&mut self) -> Result<()> {
        let Some(mut model) = self.model.take() else {
            return Ok(());
        };

        let closed = match self.trace.take() {
            Some(window) => window.close(),
            None => Ok(()),
        };
        model.finalize();
        drop(model);

        debug!(device = self.ports.name, cycles = self.clock.cycle(), "torn down");
        closed
    }

    /// Checks whether the model is still live.
    pub fn is_live(&self) -> bool {
        self.model.is_some()
    }

    pub fn port_set(&self) -> &'static PortSet {
        self.ports
    }

    /// Borrows the model, for diagnostics.
    pub fn model(&self) -> &M {
        live(&self.model)
    }

    // ---------------------------------------------------------------------
    // Clock engine
    // ---------------------------------------------------------------------

    /// Advances one full cycle: evaluate with the clock low, then high.
    ///
    /// Each evaluation advances the simulation clock by one tick and, when a
    /// trace window covers the current cycle, is dumped at the tick value it
    /// was evaluated at.
    pub fn advance_one_cycle(&mut self) {
        let model = live_mut(&mut self.model);

        for level in [0, 1] {
            let cycle = self.clock.cycle();
            model.poke(&CLOCK, level);
            model.eval();
            if let Some(window) = self.trace.as_mut() {
                if window.sample(model, cycle, self.clock.ticks()) {
                    self.stats.waveform_dumps += 1;
                }
            }
            self.clock.tick();
        }

        self.stats.evaluations += 2;
        self.stats.cycles += 1;
    }

    /// Advances `n` full cycles, one at a time.
    pub fn advance_n_cycles(&mut self, n: u64) {
        for _ in 0..n {
            self.advance_one_cycle();
        }
    }

    /// Full cycles completed since reset.
    pub fn current_cycle(&self) -> u64 {
        self.clock.cycle()
    }

    /// Half-cycle ticks elapsed since reset.
    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    // ---------------------------------------------------------------------
    // Trace window
    // ---------------------------------------------------------------------

    /// Starts capturing cycles `from_cycle..=to_cycle` into a VCD file.
    ///
    /// Any previously attached sink is closed first, even if the new file
    /// cannot be created.
    pub fn enable_waveform<P: AsRef<Path>>(
        &mut self,
        path: P,
        from_cycle: u64,
        to_cycle: u64,
    ) -> Result<()> {
        self.close_previous_window();
        let sink = VcdSink::create(path.as_ref(), self.trace_config.timescale_ns)?;
        self.attach_sink(Box::new(sink), from_cycle, to_cycle)?;
        info!(path = %path.as_ref().display(), from_cycle, to_cycle, "waveform enabled");
        Ok(())
    }

    /// Starts capturing every cycle from `from_cycle` on into a VCD file.
    pub fn enable_waveform_from<P: AsRef<Path>>(&mut self, path: P, from_cycle: u64) -> Result<()> {
        self.enable_waveform(path, from_cycle, u64::MAX)
    }

    /// Starts capturing the configured `[trace]` window into a VCD file.
    pub fn enable_configured_waveform<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let (from, to) = (self.trace_config.from_cycle, self.trace_config.to_cycle);
        self.enable_waveform(path, from, to)
    }

    /// Attaches an arbitrary sink for cycles `from_cycle..=to_cycle`.
    ///
    /// Replaces, and closes, any previously attached sink; data that sink
    /// had not flushed may be lost.
    pub fn attach_sink(
        &mut self,
        sink: Box<dyn WaveformSink>,
        from_cycle: u64,
        to_cycle: u64,
    ) -> Result<()> {
        self.close_previous_window();
        let model = live(&self.model);
        let window = TraceWindow::open(sink, model, from_cycle, to_cycle, self.trace_config.depth)?;
        self.trace = Some(window);
        Ok(())
    }

    fn close_previous_window(&mut self) {
        if let Some(previous) = self.trace.take() {
            if let Err(e) = previous.close() {
                warn!(error = %e, "replaced waveform sink failed to close");
            }
        }
    }

    /// Stops capturing and closes the sink. Idempotent.
    pub fn disable_waveform(&mut self) -> Result<()> {
        match self.trace.take() {
            Some(window) => {
                info!(dumps = window.dumps(), "waveform disabled");
                window.close()
            }
            None => Ok(()),
        }
    }

    /// Checks whether a trace window is attached and still writing.
    pub fn is_tracing(&self) -> bool {
        self.trace.as_ref().map_or(false, |w| w.is_enabled())
    }

    // ---------------------------------------------------------------------
    // Signal accessors
    // ---------------------------------------------------------------------

    fn check_declared(&self, decl: &PortDecl) {
        if !self.ports.contains(decl) {
            panic!("port {} is not declared by {}", decl, self.ports.name);
        }
    }

    /// Stages `value` on an input port; it takes effect at the next
    /// evaluation.
    pub fn set<T: PortValue>(&mut self, port: Port<T>, value: T) {
        let decl = port.decl();
        debug_assert!(decl.width <= T::BITS);
        self.poke_decl(&decl, value.into_raw());
    }

    /// Samples a port as of the most recent evaluation.
    pub fn get<T: PortValue>(&self, port: Port<T>) -> T {
        let decl = port.decl();
        debug_assert!(decl.width <= T::BITS);
        T::from_raw(self.peek_decl(&decl))
    }

    /// Checks whether a one-bit port is high.
    pub fn is_high(&self, port: Port<u8>) -> bool {
        self.get(port) != 0
    }

    /// Stages a raw value on the input named `name`.
    pub fn poke_by_name(&mut self, name: &str, value: u64) {
        let decl = match self.ports.find(name) {
            Some(decl) => *decl,
            None => panic!("port '{}' is not declared by {}", name, self.ports.name),
        };
        self.poke_decl(&decl, value);
    }

    /// Samples the port named `name` as a raw value.
    pub fn peek_by_name(&self, name: &str) -> u64 {
        let decl = match self.ports.find(name) {
            Some(decl) => *decl,
            None => panic!("port '{}' is not declared by {}", name, self.ports.name),
        };
        self.peek_decl(&decl)
    }

    fn poke_decl(&mut self, decl: &PortDecl, value: u64) {
        self.check_declared(decl);
        if !decl.is_input() {
            panic!("cannot drive output port {} of {}", decl, self.ports.name);
        }
        #[cfg(feature = "always-trace")]
        tracing::trace!(port = decl.name, value, cycle = self.clock.cycle(), "poke");
        live_mut(&mut self.model).poke(decl, value & decl.mask());
    }

    fn peek_decl(&self, decl: &PortDecl) -> u64 {
        self.check_declared(decl);
        live(&self.model).peek(decl) & decl.mask()
    }

    /// Logs the value of every declared port.
    pub fn dump_state(&self) {
        let model = live(&self.model);
        info!(
            device = self.ports.name,
            cycle = self.clock.cycle(),
            ticks = self.clock.ticks(),
            "device state"
        );
        for port in self.ports.ports {
            info!("  {:<20} = {:#x}", port.name, model.peek(port) & port.mask());
        }
    }
}

impl<M: Model> Drop for Driver<M> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "teardown on drop failed");
        }
    }
}
