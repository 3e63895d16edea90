//! UART Loopback Reference Model.
//!
//! A cycle-level model of the `impl_uart` device: an 8N1 transmitter whose
//! line output feeds an 8N1 receiver. Registers update on rising clock edges
//! while reset is low; combinational outputs are re-settled on every
//! evaluation. A byte strobed into the transmitter takes `10 * baud_div`
//! cycles, strobe included, and the receiver flags it `valid` on the cycle
//! the transmitter goes idle.

use crate::common::{PortDecl, PortSet, Result, SimError};
use crate::devices::uart;
use crate::sim::{Model, TraceVar};

const TX_SCOPE: &str = "impl_uart.uart_tx";
const RX_SCOPE: &str = "impl_uart.uart_rx";

/// Start + 8 data + stop, LSB shifted out first.
const TX_FRAME_BITS: u32 = 10;
/// Receiver shift register: frame bits plus the idle marker.
const RX_SHIFT_BITS: u32 = 11;
const RX_IDLE_MARKER: u16 = 1 << (RX_SHIFT_BITS - 1);

#[derive(Debug, Clone)]
struct UartTx {
    reload: u64,
    shift: u16,
    counter: u64,

    tick: bool,
    busy: bool,
    line: bool,
    start: bool,
}

impl UartTx {
    fn new(reload: u64) -> Self {
        let mut tx = Self {
            reload,
            shift: 0,
            counter: reload,
            tick: false,
            busy: false,
            line: true,
            start: false,
        };
        tx.settle(false);
        tx
    }

    fn reset(&mut self) {
        self.shift = 0;
        self.counter = self.reload;
    }

    fn settle(&mut self, enable: bool) {
        self.tick = self.counter == 0;
        self.busy = (self.shift >> 1) != 0 || ((self.shift & 1 != 0) ^ self.tick);
        self.line = self.shift & 1 != 0 || !self.busy;
        self.start = enable && !self.busy;
    }

    fn clock(&mut self, data: u8) {
        self.counter = if self.tick || self.start || !self.busy {
            self.reload
        } else {
            self.counter - 1
        };

        if self.start {
            self.shift = (1 << (TX_FRAME_BITS - 1)) | ((data as u16) << 1);
        } else if self.tick {
            self.shift >>= 1;
        }
    }
}

#[derive(Debug, Clone)]
struct UartRx {
    reload: u64,
    sample_offset: u64,
    shift: u16,
    counter: u64,
    latch: u8,
    initialized: bool,
    busy_reg: bool,

    line: bool,
    transfer_complete: bool,
    start_detected: bool,
    receiving: bool,
    sample: bool,
    busy: bool,
    data: u8,
    valid: bool,
    frame_error: bool,
    break_detected: bool,
}

impl UartRx {
    fn new(reload: u64, sample_offset: u64) -> Self {
        let mut rx = Self {
            reload,
            sample_offset,
            shift: RX_IDLE_MARKER,
            counter: reload,
            latch: 0,
            initialized: false,
            busy_reg: false,
            line: true,
            transfer_complete: false,
            start_detected: false,
            receiving: false,
            sample: false,
            busy: false,
            data: 0,
            valid: false,
            frame_error: false,
            break_detected: false,
        };
        rx.settle(true);
        rx
    }

    fn reset(&mut self) {
        self.shift = RX_IDLE_MARKER;
        self.counter = self.reload;
        self.latch = 0;
        self.initialized = false;
        self.busy_reg = false;
    }

    fn frame_data(&self) -> u8 {
        (self.shift >> 2) as u8
    }

    fn settle(&mut self, line: bool) {
        self.line = line;
        self.transfer_complete = self.counter == 0 && self.shift & 1 != 0;
        self.start_detected = self.initialized && !line && !self.busy_reg;
        self.busy = if self.transfer_complete {
            false
        } else {
            self.start_detected || self.busy_reg
        };
        self.receiving = self.busy_reg || self.start_detected;
        self.data = if self.transfer_complete {
            self.frame_data()
        } else {
            self.latch
        };

        if self.transfer_complete {
            let stop_ok = self.shift & RX_IDLE_MARKER != 0;
            self.frame_error = (self.shift >> 1) & 1 != 0 || !stop_ok;
            self.valid = !self.frame_error;
            self.break_detected = (self.shift >> 1) == 0;
        } else {
            self.frame_error = false;
            self.valid = false;
            self.break_detected = false;
        }

        self.sample = self.receiving && self.counter == self.sample_offset;
    }

    fn clock(&mut self) {
        self.counter = if self.counter == 0 || !self.receiving {
            self.reload
        } else {
            self.counter - 1
        };

        if self.transfer_complete {
            self.latch = self.frame_data();
            self.shift = RX_IDLE_MARKER;
        } else if self.sample {
            self.shift = (self.shift >> 1) | ((self.line as u16) << (RX_SHIFT_BITS - 1));
        }

        if self.start_detected {
            self.busy_reg = true;
        }
        if self.transfer_complete {
            self.busy_reg = false;
        }
        self.initialized = true;
    }
}

/// Transmitter looped back into receiver, at a fixed clock divisor.
#[derive(Debug, Clone)]
pub struct UartLoopbackModel {
    baud_div: u64,
    clk: bool,
    rst: bool,
    tx_enable: bool,
    data: u8,
    last_clk: bool,
    tx: UartTx,
    rx: UartRx,
}

impl UartLoopbackModel {
    /// Builds a model whose bit period is `baud_div` clock cycles.
    pub fn new(baud_div: u64) -> Result<Self> {
        if baud_div < 2 {
            return Err(SimError::ModelConstruction(format!(
                "uart loopback needs a baud divisor of at least 2, got {}",
                baud_div
            )));
        }

        let reload = baud_div - 1;
        let mut model = Self {
            baud_div,
            clk: false,
            rst: false,
            tx_enable: false,
            data: 0,
            last_clk: false,
            tx: UartTx::new(reload),
            rx: UartRx::new(reload, baud_div / 2),
        };
        model.settle();
        Ok(model)
    }

    pub fn baud_div(&self) -> u64 {
        self.baud_div
    }

    fn settle(&mut self) {
        self.tx.settle(self.tx_enable);
        self.rx.settle(self.tx.line);
    }

    fn counter_width(&self) -> u32 {
        (64 - (self.baud_div - 1).leading_zeros()).max(1)
    }
}

impl Model for UartLoopbackModel {
    fn port_set(&self) -> &'static PortSet {
        &uart::PORTS
    }

    fn poke(&mut self, port: &PortDecl, value: u64) {
        match port.name {
            "clk" => self.clk = value & 1 != 0,
            "rst" => self.rst = value & 1 != 0,
            "tx_enable" => self.tx_enable = value & 1 != 0,
            "data" => self.data = value as u8,
            _ => {}
        }
    }

    fn peek(&self, port: &PortDecl) -> u64 {
        let bit = |b: bool| b as u64;
        match port.name {
            "clk" => bit(self.clk),
            "rst" => bit(self.rst),
            "tx_enable" => bit(self.tx_enable),
            "data" => self.data as u64,
            "busy" => bit(self.tx.busy),
            "tx" => bit(self.tx.line),
            "rx_busy" => bit(self.rx.busy),
            "rx_data" => self.rx.data as u64,
            "valid" => bit(self.rx.valid),
            "frame_error" => bit(self.rx.frame_error),
            "break_detected" => bit(self.rx.break_detected),
            _ => 0,
        }
    }

    fn eval(&mut self) {
        let rising = self.clk && !self.last_clk;
        self.last_clk = self.clk;

        self.settle();
        if rising {
            if self.rst {
                self.tx.reset();
                self.rx.reset();
            } else {
                self.tx.clock(self.data);
                self.rx.clock();
            }
            self.settle();
        }
    }

    fn trace_vars(&self) -> Vec<TraceVar> {
        let set = self.port_set();
        let width = self.counter_width();
        let mut vars: Vec<TraceVar> = set
            .all()
            .map(|p| TraceVar::new(set.name, p.name, p.width))
            .collect();
        vars.extend([
            TraceVar::new(TX_SCOPE, "shift_reg", TX_FRAME_BITS),
            TraceVar::new(TX_SCOPE, "cycle_counter", width),
            TraceVar::new(TX_SCOPE, "tick", 1),
            TraceVar::new(TX_SCOPE, "tx_start", 1),
            TraceVar::new(RX_SCOPE, "rx", 1),
            TraceVar::new(RX_SCOPE, "shift_reg", RX_SHIFT_BITS),
            TraceVar::new(RX_SCOPE, "cycle_counter", width),
            TraceVar::new(RX_SCOPE, "data_latch", 8),
            TraceVar::new(RX_SCOPE, "initialized", 1),
            TraceVar::new(RX_SCOPE, "sample", 1),
        ]);
        vars
    }

    fn trace_values(&self, out: &mut Vec<u64>) {
        let set = self.port_set();
        out.extend(set.all().map(|p| self.peek(p) & p.mask()));
        out.extend([
            self.tx.shift as u64,
            self.tx.counter,
            self.tx.tick as u64,
            self.tx.start as u64,
            self.rx.line as u64,
            self.rx.shift as u64,
            self.rx.counter,
            self.rx.latch as u64,
            self.rx.initialized as u64,
            self.rx.sample as u64,
        ]);
    }
}
