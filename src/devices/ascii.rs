//! ASCII Rectangle Unit (`impl_ascii`).
//!
//! Takes polygon text as a byte stream over a ready/valid input channel and
//! streams the decimal result back over a ready/valid output channel. The
//! output side's `ascii_out_ready` idles high so the unit never stalls on
//! the testbench.

use std::iter;

use tracing::debug;

use crate::common::{IdleValue, Port, PortSet, Result};
use crate::config::Config;
use crate::protocol::{run_until_high, Completion, ReadyValid};
use crate::sim::{Driver, Model};

use super::push_output;

pub const ASCII_IN: Port<u8> = Port::input("ascii_in", 8);
pub const ASCII_IN_VALID: Port<u8> = Port::input("ascii_in_valid", 1);
pub const ASCII_OUT_READY: Port<u8> = Port::input("ascii_out_ready", 1);
pub const ASCII_IN_READY: Port<u8> = Port::output("ascii_in_ready", 1);
pub const ASCII_OUT: Port<u8> = Port::output("ascii_out", 8);
pub const ASCII_OUT_VALID: Port<u8> = Port::output("ascii_out_valid", 1);
pub const PROCESSING: Port<u8> = Port::output("processing", 1);
pub const DONE: Port<u8> = Port::output("done", 1);

pub static PORTS: PortSet = PortSet::new(
    "impl_ascii",
    &[
        ASCII_IN.decl(),
        ASCII_IN_VALID.decl(),
        ASCII_OUT_READY.decl(),
        ASCII_IN_READY.decl(),
        ASCII_OUT.decl(),
        ASCII_OUT_VALID.decl(),
        PROCESSING.decl(),
        DONE.decl(),
    ],
    &[IdleValue::new("ascii_out_ready", 1)],
);

/// Testbench to device.
pub const INPUT: ReadyValid<u8> = ReadyValid::new(ASCII_IN, ASCII_IN_VALID, ASCII_IN_READY);

/// Device to testbench.
pub const OUTPUT: ReadyValid<u8> = ReadyValid::new(ASCII_OUT, ASCII_OUT_VALID, ASCII_OUT_READY);

/// Terminates a polygon description on the input stream.
const END_OF_POLYGON: u8 = 0;

/// Driver bound to the ASCII rectangle unit.
pub struct AsciiDevice<M: Model> {
    driver: Driver<M>,
    handshake_wait: u64,
    output_cycles: u64,
}

impl<M: Model> AsciiDevice<M> {
    pub fn new(model: M, config: &Config) -> Result<Self> {
        Ok(Self {
            driver: super::bind(model, &PORTS, config)?,
            handshake_wait: config.timeouts.handshake_wait,
            output_cycles: config.timeouts.output_cycles,
        })
    }

    pub fn driver(&self) -> &Driver<M> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver<M> {
        &mut self.driver
    }

    /// Offers one character, waiting at most `max_wait` cycles for
    /// `ascii_in_ready`.
    pub fn send_char(&mut self, c: u8, max_wait: u64) -> Completion {
        INPUT.send(&mut self.driver, c, max_wait)
    }

    /// Sends characters until one is not accepted in time.
    ///
    /// # Returns
    ///
    /// The number of characters accepted.
    pub fn send_string(&mut self, s: &str) -> usize {
        let wait = self.handshake_wait;
        s.bytes()
            .take_while(|&c| INPUT.send(&mut self.driver, c, wait).is_completed())
            .count()
    }

    /// Takes the output character on offer, without advancing the clock.
    pub fn receive_char(&mut self) -> Option<u8> {
        OUTPUT.poll(&mut self.driver)
    }

    /// Polls for output then advances, `max_cycles` times.
    ///
    /// # Returns
    ///
    /// Every character received, with line terminators dropped.
    pub fn receive_output(&mut self, max_cycles: u64) -> String {
        let mut out = String::new();
        for _ in 0..max_cycles {
            if let Some(c) = self.receive_char() {
                push_output(&mut out, c);
            }
            self.driver.advance_one_cycle();
        }
        out
    }

    /// [`AsciiDevice::receive_output`] over the configured output bound.
    pub fn receive_all_output(&mut self) -> String {
        self.receive_output(self.output_cycles)
    }

    /// Streams `text` and a terminating NUL into the unit, then runs until
    /// `done` or `max_cycles` cycles, collecting output along the way.
    ///
    /// Each character is offered for the configured handshake wait; a
    /// character that is not accepted ends the call with `TimedOut`. The
    /// reported cycle count covers the whole call.
    pub fn process_polygon(&mut self, text: &str, max_cycles: u64) -> (String, Completion) {
        let mut out = String::new();
        let mut cycles = 0;

        for c in text.bytes().chain(iter::once(END_OF_POLYGON)) {
            let sent = INPUT.send(&mut self.driver, c, self.handshake_wait);
            cycles += sent.cycles();
            if sent.is_timed_out() {
                debug!(byte = c, cycles, "input rejected");
                return (out, Completion::TimedOut { cycles });
            }
        }

        let mut waited = 0;
        while !self.done() && waited < max_cycles {
            self.driver.advance_one_cycle();
            if let Some(c) = self.receive_char() {
                push_output(&mut out, c);
            }
            waited += 1;
        }
        cycles += waited;

        let completion = if self.done() {
            Completion::Completed { cycles }
        } else {
            Completion::TimedOut { cycles }
        };
        (out, completion)
    }

    pub fn run_until_done(&mut self, max_cycles: u64) -> Completion {
        run_until_high(&mut self.driver, DONE, max_cycles)
    }

    pub fn processing(&self) -> bool {
        self.driver.is_high(PROCESSING)
    }

    pub fn done(&self) -> bool {
        self.driver.is_high(DONE)
    }

    pub fn ascii_in_ready(&self) -> bool {
        self.driver.is_high(ASCII_IN_READY)
    }

    pub fn ascii_out_valid(&self) -> bool {
        self.driver.is_high(ASCII_OUT_VALID)
    }

    pub fn teardown(&mut self) -> Result<()> {
        self.driver.teardown()
    }
}
