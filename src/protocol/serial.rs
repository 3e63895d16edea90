//! Byte-serial transmit and receive.
//!
//! These adapters talk to a device's own serializer through its parallel
//! ports: a transmit strobe plus busy flag on the way out, a valid flag on
//! the way in. How long a byte takes on the wire is up to the device.

use tracing::debug;

use super::Completion;
use crate::common::{Port, PortValue};
use crate::sim::{Driver, Model};

/// Transmit side: data, one-cycle enable strobe, busy status.
#[derive(Clone, Copy, Debug)]
pub struct ByteTx<T: PortValue> {
    pub data: Port<T>,
    pub strobe: Port<u8>,
    pub busy: Port<u8>,
}

impl<T: PortValue> ByteTx<T> {
    pub const fn new(data: Port<T>, strobe: Port<u8>, busy: Port<u8>) -> Self {
        Self { data, strobe, busy }
    }

    /// Strobes `value` into the transmitter and waits for it to go idle.
    ///
    /// The strobe is held for exactly one cycle, which is counted and always
    /// consumed. Waiting continues while `busy` is high, up to `max_cycles`
    /// cycles in total.
    ///
    /// # Returns
    ///
    /// `Completed` with the total cycle count once `busy` is low, or
    /// `TimedOut` if it was still high at the bound.
    pub fn transmit<M: Model>(&self, driver: &mut Driver<M>, value: T, max_cycles: u64) -> Completion {
        driver.set(self.data, value);
        driver.set(self.strobe, 1);
        driver.advance_one_cycle();
        driver.set(self.strobe, 0);

        let mut cycles = 1;
        while driver.is_high(self.busy) && cycles < max_cycles {
            driver.advance_one_cycle();
            cycles += 1;
        }

        if driver.is_high(self.busy) {
            driver.stats.transmit_timeouts += 1;
            debug!(value = ?value, cycles, "transmit timed out");
            Completion::TimedOut { cycles }
        } else {
            driver.stats.bytes_transmitted += 1;
            Completion::Completed { cycles }
        }
    }
}

/// Receive side: data and its valid flag.
#[derive(Clone, Copy, Debug)]
pub struct ByteRx<T: PortValue> {
    pub data: Port<T>,
    pub valid: Port<u8>,
}

impl<T: PortValue> ByteRx<T> {
    pub const fn new(data: Port<T>, valid: Port<u8>) -> Self {
        Self { data, valid }
    }

    /// Waits up to `max_cycles` cycles for `valid`.
    ///
    /// `valid` is checked before each advance; the cycle in which it is seen
    /// is not consumed.
    pub fn receive<M: Model>(&self, driver: &mut Driver<M>, max_cycles: u64) -> Option<T> {
        for _ in 0..max_cycles {
            if driver.is_high(self.valid) {
                driver.stats.bytes_received += 1;
                return Some(driver.get(self.data));
            }
            driver.advance_one_cycle();
        }

        driver.stats.receive_timeouts += 1;
        debug!(max_cycles, "receive timed out");
        None
    }
}
