//! Testbench-side serial line codec.
//!
//! Devices that expose only a single-wire serial interface are driven one
//! line level per cycle. [`SerialEncoder`] produces those levels from a byte
//! queue and [`SerialDecoder`] recovers bytes from the device's output line.
//! Framing is 8N1: a low start bit, eight data bits LSB first, a high stop
//! bit, each held for `baud_div` cycles. The idle line is high.

use std::collections::VecDeque;

/// Start + data + stop bits in one frame.
const FRAME_BITS: u32 = 10;

/// Turns queued bytes into one line level per cycle.
#[derive(Debug, Clone)]
pub struct SerialEncoder {
    baud_div: u64,
    queue: VecDeque<u8>,
    shift: u16,
    bits_left: u32,
    counter: u64,
    transmitting: bool,
}

impl SerialEncoder {
    pub fn new(baud_div: u64) -> Self {
        Self {
            baud_div: baud_div.max(1),
            queue: VecDeque::new(),
            shift: 0xFFFF,
            bits_left: 0,
            counter: 0,
            transmitting: false,
        }
    }

    pub fn enqueue(&mut self, byte: u8) {
        self.queue.push_back(byte);
    }

    pub fn extend<I: IntoIterator<Item = u8>>(&mut self, bytes: I) {
        self.queue.extend(bytes);
    }

    /// Checks whether the queue is empty and no frame is on the line.
    pub fn is_idle(&self) -> bool {
        !self.transmitting && self.queue.is_empty()
    }

    /// Bytes still waiting, excluding the frame in flight.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns the line level for the current cycle and advances.
    pub fn tick(&mut self) -> u8 {
        if !self.transmitting {
            if let Some(byte) = self.queue.pop_front() {
                self.shift = (1 << 9) | ((byte as u16) << 1);
                self.bits_left = FRAME_BITS;
                self.counter = self.baud_div;
                self.transmitting = true;
            }
        }

        if !self.transmitting {
            return 1;
        }

        let level = (self.shift & 1) as u8;
        self.counter -= 1;
        if self.counter == 0 {
            self.shift = (self.shift >> 1) | 0x8000;
            self.bits_left -= 1;
            self.counter = self.baud_div;
            if self.bits_left == 0 {
                self.transmitting = false;
            }
        }
        level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    Start,
    Data,
    Stop,
}

/// Recovers bytes from one line level per cycle, sampling mid-bit.
///
/// A start bit that is no longer low at its midpoint is a false start and is
/// ignored. A frame whose stop bit is low is dropped.
#[derive(Debug, Clone)]
pub struct SerialDecoder {
    baud_div: u64,
    state: RxState,
    bits: u32,
    counter: u64,
    shift: u8,
}

impl SerialDecoder {
    pub fn new(baud_div: u64) -> Self {
        Self {
            baud_div: baud_div.max(1),
            state: RxState::Idle,
            bits: 0,
            counter: 0,
            shift: 0,
        }
    }

    /// Checks whether no frame is being received.
    pub fn is_idle(&self) -> bool {
        self.state == RxState::Idle
    }

    /// Consumes the line level of one cycle.
    ///
    /// # Returns
    ///
    /// The byte whose stop bit was sampled this cycle, if it was valid.
    pub fn tick(&mut self, level: u8) -> Option<u8> {
        let high = level & 1 != 0;
        match self.state {
            RxState::Idle => {
                if !high {
                    self.state = RxState::Start;
                    self.counter = (self.baud_div / 2).max(1);
                }
                None
            }
            RxState::Start => {
                self.counter -= 1;
                if self.counter == 0 {
                    if high {
                        self.state = RxState::Idle;
                    } else {
                        self.state = RxState::Data;
                        self.bits = 0;
                        self.counter = self.baud_div;
                        self.shift = 0;
                    }
                }
                None
            }
            RxState::Data => {
                self.counter -= 1;
                if self.counter == 0 {
                    self.shift = (self.shift >> 1) | ((high as u8) << 7);
                    self.bits += 1;
                    self.counter = self.baud_div;
                    if self.bits == 8 {
                        self.state = RxState::Stop;
                    }
                }
                None
            }
            RxState::Stop => {
                self.counter -= 1;
                if self.counter == 0 {
                    self.state = RxState::Idle;
                    if high {
                        return Some(self.shift);
                    }
                }
                None
            }
        }
    }
}
