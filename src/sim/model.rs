//! Circuit Model Interface.
//!
//! The driver never looks inside a device. It stages input values, asks the
//! model to evaluate, and samples outputs, exactly like a testbench poking a
//! compiled RTL model. Everything device-specific sits behind [`Model`].

use crate::common::{PortDecl, PortSet};

/// A traced signal: a port or an internal net of the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceVar {
    /// Dotted hierarchical scope, rooted at the port set name
    /// (for example `impl_uart.uart_tx`).
    pub scope: &'static str,
    pub name: &'static str,
    pub width: u32,
}

impl TraceVar {
    pub const fn new(scope: &'static str, name: &'static str, width: u32) -> Self {
        Self { scope, name, width }
    }

    /// Number of hierarchy levels in `scope` (the root counts as one).
    pub fn depth(&self) -> u32 {
        self.scope.split('.').count() as u32
    }
}

/// Interface to a clocked circuit model.
///
/// # Contract
///
/// * `poke` stages an input value; it becomes visible to the circuit at the
///   next `eval`. The clock and reset inputs ([`crate::common::CLOCK`],
///   [`crate::common::RESET`]) are poked through the same call.
/// * `peek` returns outputs as of the most recent `eval`, and the staged value
///   for inputs.
/// * `eval` settles combinational logic against the staged inputs and fires
///   any edge-triggered logic whose clock edge the staged clock level implies.
pub trait Model {
    /// Returns the port set this model implements.
    fn port_set(&self) -> &'static PortSet;

    /// Stages `value` on input `port`.
    fn poke(&mut self, port: &PortDecl, value: u64);

    /// Samples `port`.
    fn peek(&self, port: &PortDecl) -> u64;

    /// Evaluates the circuit once.
    fn eval(&mut self);

    /// Lists every traceable signal, grouped by scope.
    ///
    /// The default lists the clock, reset and declared ports under the root
    /// scope. Models with internal hierarchy should extend it and override
    /// [`Model::trace_values`] to match.
    fn trace_vars(&self) -> Vec<TraceVar> {
        let set = self.port_set();
        set.all()
            .map(|p| TraceVar::new(set.name, p.name, p.width))
            .collect()
    }

    /// Appends the current value of every signal from
    /// [`Model::trace_vars`], in the same order.
    fn trace_values(&self, out: &mut Vec<u64>) {
        let set = self.port_set();
        out.extend(set.all().map(|p| self.peek(p) & p.mask()));
    }

    /// Runs end-of-simulation hooks before the model is dropped.
    fn finalize(&mut self) {}
}
