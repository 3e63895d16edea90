//! Ready/valid transfers.

use tracing::debug;

use super::Completion;
use crate::common::{Port, PortValue};
use crate::sim::{Driver, Model};

/// The three ports of one ready/valid channel.
///
/// The same shape serves both directions: for a channel into the device the
/// driver owns `data` and `valid` and the device drives `ready`; for a
/// channel out of it the roles swap.
#[derive(Clone, Copy, Debug)]
pub struct ReadyValid<T: PortValue> {
    pub data: Port<T>,
    pub valid: Port<u8>,
    pub ready: Port<u8>,
}

impl<T: PortValue> ReadyValid<T> {
    pub const fn new(data: Port<T>, valid: Port<u8>, ready: Port<u8>) -> Self {
        Self { data, valid, ready }
    }

    /// Offers `value` to the device for at most `max_wait` cycles.
    ///
    /// `ready` is sampled before each advance; the transfer completes on the
    /// first cycle that starts with it high. Exactly one cycle is consumed
    /// per attempt, and `valid` is low again on return in every case.
    pub fn send<M: Model>(&self, driver: &mut Driver<M>, value: T, max_wait: u64) -> Completion {
        driver.set(self.data, value);
        driver.set(self.valid, 1);

        for attempt in 1..=max_wait {
            let accepted = driver.is_high(self.ready);
            driver.advance_one_cycle();
            if accepted {
                driver.set(self.valid, 0);
                driver.stats.handshakes_accepted += 1;
                return Completion::Completed { cycles: attempt };
            }
        }

        driver.set(self.valid, 0);
        driver.stats.handshakes_timed_out += 1;
        debug!(port = self.data.name(), value = ?value, max_wait, "handshake timed out");
        Completion::TimedOut { cycles: max_wait }
    }

    /// Takes the value on offer, if both `valid` and `ready` are high.
    ///
    /// Never advances the clock.
    pub fn poll<M: Model>(&self, driver: &mut Driver<M>) -> Option<T> {
        if driver.is_high(self.valid) && driver.is_high(self.ready) {
            driver.stats.polls_present += 1;
            Some(driver.get(self.data))
        } else {
            None
        }
    }
}
