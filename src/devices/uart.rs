//! UART Loopback Unit (`impl_uart`).
//!
//! A transmitter and receiver whose serial line is wired back internally.
//! Bytes go in through `data`/`tx_enable` and come back out on
//! `rx_data`/`valid` once the frame has crossed the line.

use crate::common::{Port, PortSet, Result};
use crate::config::Config;
use crate::protocol::{ByteRx, ByteTx, Completion};
use crate::sim::{Driver, Model};

pub const TX_ENABLE: Port<u8> = Port::input("tx_enable", 1);
pub const DATA: Port<u8> = Port::input("data", 8);
pub const BUSY: Port<u8> = Port::output("busy", 1);
pub const TX: Port<u8> = Port::output("tx", 1);
pub const RX_BUSY: Port<u8> = Port::output("rx_busy", 1);
pub const RX_DATA: Port<u8> = Port::output("rx_data", 8);
pub const VALID: Port<u8> = Port::output("valid", 1);
pub const FRAME_ERROR: Port<u8> = Port::output("frame_error", 1);
pub const BREAK_DETECTED: Port<u8> = Port::output("break_detected", 1);

pub static PORTS: PortSet = PortSet::new(
    "impl_uart",
    &[
        TX_ENABLE.decl(),
        DATA.decl(),
        BUSY.decl(),
        TX.decl(),
        RX_BUSY.decl(),
        RX_DATA.decl(),
        VALID.decl(),
        FRAME_ERROR.decl(),
        BREAK_DETECTED.decl(),
    ],
    &[],
);

pub const TRANSMITTER: ByteTx<u8> = ByteTx::new(DATA, TX_ENABLE, BUSY);
pub const RECEIVER: ByteRx<u8> = ByteRx::new(RX_DATA, VALID);

/// Driver bound to the UART loopback unit.
pub struct UartDevice<M: Model> {
    driver: Driver<M>,
    transmit_cycles: u64,
    receive_cycles: u64,
}

impl<M: Model> UartDevice<M> {
    pub fn new(model: M, config: &Config) -> Result<Self> {
        Ok(Self {
            driver: super::bind(model, &PORTS, config)?,
            transmit_cycles: config.transmit_cycles(),
            receive_cycles: config.receive_cycles(),
        })
    }

    pub fn driver(&self) -> &Driver<M> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver<M> {
        &mut self.driver
    }

    /// Cycles [`UartDevice::receive_byte`] waits by default.
    pub fn default_receive_cycles(&self) -> u64 {
        self.receive_cycles
    }

    /// Transmits one byte, bounded by the configured transmit timeout.
    pub fn send_byte(&mut self, byte: u8) -> Completion {
        TRANSMITTER.transmit(&mut self.driver, byte, self.transmit_cycles)
    }

    /// Transmits `bytes` back to back, stopping at the first timeout.
    ///
    /// # Returns
    ///
    /// The total cycles consumed, `TimedOut` if any byte did not finish.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Completion {
        let mut cycles = 0;
        for &byte in bytes {
            let sent = self.send_byte(byte);
            cycles += sent.cycles();
            if sent.is_timed_out() {
                return Completion::TimedOut { cycles };
            }
        }
        Completion::Completed { cycles }
    }

    /// Waits up to `max_cycles` cycles for a received byte.
    pub fn receive_byte(&mut self, max_cycles: u64) -> Option<u8> {
        RECEIVER.receive(&mut self.driver, max_cycles)
    }

    /// Receives up to `count` bytes, stopping at the first timeout.
    pub fn receive_bytes(&mut self, count: usize, max_cycles_per_byte: u64) -> Vec<u8> {
        let mut received = Vec::with_capacity(count);
        for _ in 0..count {
            match self.receive_byte(max_cycles_per_byte) {
                Some(byte) => received.push(byte),
                None => break,
            }
        }
        received
    }

    pub fn busy(&self) -> bool {
        self.driver.is_high(BUSY)
    }

    pub fn tx(&self) -> bool {
        self.driver.is_high(TX)
    }

    pub fn rx_busy(&self) -> bool {
        self.driver.is_high(RX_BUSY)
    }

    pub fn rx_data(&self) -> u8 {
        self.driver.get(RX_DATA)
    }

    pub fn valid(&self) -> bool {
        self.driver.is_high(VALID)
    }

    pub fn frame_error(&self) -> bool {
        self.driver.is_high(FRAME_ERROR)
    }

    pub fn break_detected(&self) -> bool {
        self.driver.is_high(BREAK_DETECTED)
    }

    pub fn teardown(&mut self) -> Result<()> {
        self.driver.teardown()
    }
}
