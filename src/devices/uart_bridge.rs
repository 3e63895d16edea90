//! UART Bridge Unit (`impl_uart_bridge`).
//!
//! The ASCII rectangle unit behind a serial front end: polygon text arrives
//! on `uart_rx` and the result leaves on `uart_tx`, both 8N1 at the
//! configured baud divisor. The testbench side of the line is played by a
//! [`SerialEncoder`] and a [`SerialDecoder`] stepped once per cycle.

use std::iter;

use tracing::debug;

use crate::common::{IdleValue, Port, PortSet, Result};
use crate::config::Config;
use crate::protocol::{run_until_high, Completion, SerialDecoder, SerialEncoder};
use crate::sim::{Driver, Model};

use super::push_output;

pub const UART_RX: Port<u8> = Port::input("uart_rx", 1);
pub const UART_TX: Port<u8> = Port::output("uart_tx", 1);
pub const TX_READY: Port<u8> = Port::output("tx_ready", 1);
pub const TX_OVERFLOW: Port<u8> = Port::output("tx_overflow", 1);
pub const RX_VALID: Port<u8> = Port::output("rx_valid", 1);
pub const RX_OVERFLOW: Port<u8> = Port::output("rx_overflow", 1);
pub const PROCESSING: Port<u8> = Port::output("processing", 1);
pub const DONE: Port<u8> = Port::output("done", 1);

pub static PORTS: PortSet = PortSet::new(
    "impl_uart_bridge",
    &[
        UART_RX.decl(),
        UART_TX.decl(),
        TX_READY.decl(),
        TX_OVERFLOW.decl(),
        RX_VALID.decl(),
        RX_OVERFLOW.decl(),
        PROCESSING.decl(),
        DONE.decl(),
    ],
    &[IdleValue::new("uart_rx", 1)],
);

const LINE_IDLE: u8 = 1;

/// Driver bound to the UART bridge.
pub struct UartBridgeDevice<M: Model> {
    driver: Driver<M>,
    encoder: SerialEncoder,
    decoder: SerialDecoder,
    drain_cycles: u64,
}

impl<M: Model> UartBridgeDevice<M> {
    pub fn new(model: M, config: &Config) -> Result<Self> {
        Ok(Self {
            driver: super::bind(model, &PORTS, config)?,
            encoder: SerialEncoder::new(config.uart.baud_div),
            decoder: SerialDecoder::new(config.uart.baud_div),
            drain_cycles: config.bridge_drain_cycles(),
        })
    }

    pub fn driver(&self) -> &Driver<M> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver<M> {
        &mut self.driver
    }

    /// Drives `level` onto `uart_rx` for one cycle and decodes `uart_tx`.
    fn step(&mut self, level: u8, out: &mut String) {
        self.driver.set(UART_RX, level);
        self.driver.advance_one_cycle();
        let line = self.driver.get(UART_TX);
        if let Some(byte) = self.decoder.tick(line) {
            push_output(out, byte);
        }
    }

    /// Sends `text` and a terminating NUL over the serial line and collects
    /// the reply.
    ///
    /// Runs for at most `max_cycles` cycles. Once `done` is high and the
    /// whole input has been sent, the line is held idle for the configured
    /// drain period so the reply can finish.
    ///
    /// # Returns
    ///
    /// The reply with line terminators dropped, and the cycles consumed.
    pub fn process_polygon(&mut self, text: &str, max_cycles: u64) -> (String, u64) {
        self.encoder.extend(text.bytes().chain(iter::once(0)));

        let mut out = String::new();
        let mut cycles = 0;
        while cycles < max_cycles {
            let level = self.encoder.tick();
            self.step(level, &mut out);
            cycles += 1;

            if self.done() && self.encoder.is_idle() {
                debug!(cycles, drain = self.drain_cycles, "draining reply");
                for _ in 0..self.drain_cycles {
                    self.step(LINE_IDLE, &mut out);
                    cycles += 1;
                }
                break;
            }
        }
        (out, cycles)
    }

    pub fn run_until_done(&mut self, max_cycles: u64) -> Completion {
        run_until_high(&mut self.driver, DONE, max_cycles)
    }

    /// Bytes still queued for the serial line.
    pub fn pending_input(&self) -> usize {
        self.encoder.pending()
    }

    pub fn uart_tx(&self) -> bool {
        self.driver.is_high(UART_TX)
    }

    pub fn tx_ready(&self) -> bool {
        self.driver.is_high(TX_READY)
    }

    pub fn tx_overflow(&self) -> bool {
        self.driver.is_high(TX_OVERFLOW)
    }

    pub fn rx_valid(&self) -> bool {
        self.driver.is_high(RX_VALID)
    }

    pub fn rx_overflow(&self) -> bool {
        self.driver.is_high(RX_OVERFLOW)
    }

    pub fn processing(&self) -> bool {
        self.driver.is_high(PROCESSING)
    }

    pub fn done(&self) -> bool {
        self.driver.is_high(DONE)
    }

    pub fn teardown(&mut self) -> Result<()> {
        self.driver.teardown()
    }
}
