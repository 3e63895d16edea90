//! Protocol Adapters.
//!
//! Reusable handshake idioms built only from the driver's clock engine and
//! signal accessors: bounded ready/valid transfer, byte-serial transmit and
//! receive, and run-to-completion polling. Every adapter that can wait takes
//! an explicit cycle bound and reports the outcome as a [`Completion`] or an
//! `Option`; timeouts are results, never errors.

/// Bounded ready/valid send and non-blocking receive poll.
pub mod handshake;

/// Testbench-side 8N1 serial line encoder and decoder.
pub mod line;

/// Byte-serial transmit and receive over strobe/busy/valid ports.
pub mod serial;

use tracing::debug;

use crate::common::Port;
use crate::sim::{Driver, Model};

pub use handshake::ReadyValid;
pub use line::{SerialDecoder, SerialEncoder};
pub use serial::{ByteRx, ByteTx};

/// Outcome of a bounded wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The awaited condition held after `cycles` cycles.
    Completed { cycles: u64 },
    /// The bound was reached first; `cycles` were consumed.
    TimedOut { cycles: u64 },
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        matches!(self, Completion::Completed { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        !self.is_completed()
    }

    /// Cycles consumed, whatever the outcome.
    pub fn cycles(&self) -> u64 {
        match *self {
            Completion::Completed { cycles } | Completion::TimedOut { cycles } => cycles,
        }
    }
}

/// Advances until `done` holds or `max_cycles` cycles have been consumed.
///
/// The predicate is checked before any advance, so a predicate that already
/// holds returns `Completed { cycles: 0 }` without touching the clock. It is
/// also checked after the final advance; reaching the condition exactly on
/// the bound counts as completed.
pub fn run_until<M, F>(driver: &mut Driver<M>, max_cycles: u64, mut done: F) -> Completion
where
    M: Model,
    F: FnMut(&Driver<M>) -> bool,
{
    let mut cycles = 0;
    let mut finished = done(driver);
    while !finished && cycles < max_cycles {
        driver.advance_one_cycle();
        cycles += 1;
        finished = done(driver);
    }

    if finished {
        driver.stats.runs_completed += 1;
        debug!(cycles, "run completed");
        Completion::Completed { cycles }
    } else {
        driver.stats.runs_timed_out += 1;
        debug!(cycles, "run timed out");
        Completion::TimedOut { cycles }
    }
}

/// Runs until the one-bit port `flag` is high.
pub fn run_until_high<M: Model>(driver: &mut Driver<M>, flag: Port<u8>, max_cycles: u64) -> Completion {
    run_until(driver, max_cycles, |d| d.is_high(flag))
}
