//! Shared test models and sinks.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use rtl_driver::common::{IdleValue, Port, PortDecl, PortSet};
use rtl_driver::devices::{ascii, max_rect, uart_bridge};
use rtl_driver::protocol::{SerialDecoder, SerialEncoder};
use rtl_driver::sim::{Model, TraceVar, WaveformSink};
use rtl_driver::Config;

// ---------------------------------------------------------------------------
// Generic counter device
// ---------------------------------------------------------------------------

pub const DATA_IN: Port<u8> = Port::input("data_in", 8);
pub const VALID_IN: Port<u8> = Port::input("valid_in", 1);
pub const ACK: Port<u8> = Port::input("ack", 1);
pub const WIDE_IN: Port<u32> = Port::input("wide_in", 32);
pub const NIBBLE: Port<u8> = Port::input("nibble", 4);
pub const READY_OUT: Port<u8> = Port::output("ready_out", 1);
pub const BUSY: Port<u8> = Port::output("busy", 1);
pub const DONE: Port<u8> = Port::output("done", 1);
pub const COUNT: Port<u32> = Port::output("count", 32);
pub const FALLS: Port<u32> = Port::output("falls", 32);
pub const ECHO: Port<u8> = Port::output("echo", 8);
pub const BIG: Port<u64> = Port::output("big", 64);

pub static MOCK_PORTS: PortSet = PortSet::new(
    "mock_dev",
    &[
        DATA_IN.decl(),
        VALID_IN.decl(),
        ACK.decl(),
        WIDE_IN.decl(),
        NIBBLE.decl(),
        READY_OUT.decl(),
        BUSY.decl(),
        DONE.decl(),
        COUNT.decl(),
        FALLS.decl(),
        ECHO.decl(),
        BIG.decl(),
    ],
    &[IdleValue::new("ack", 1)],
);

/// One evaluation as seen by the model: clock level, then the falling and
/// rising edge counters after it settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalRecord {
    pub clk: u8,
    pub falls: u32,
    pub count: u32,
}

/// Counts rising edges in `count` and falling edges in `falls`.
///
/// `ready_out` rises once `count >= ready_after`, `done` once
/// `count >= done_after`, and `busy` holds while `count < busy_until`. A
/// byte on `data_in` is accepted into `echo` on a rising edge that starts
/// with both `valid_in` and `ready_out` high.
pub struct CounterModel {
    pub ready_after: u32,
    pub done_after: u32,
    pub busy_until: u32,

    pub evals: Vec<EvalRecord>,
    pub reset_edges: u32,
    pub accepted: Vec<u8>,
    pub finalized: Rc<Cell<u32>>,

    clk: u8,
    rst: u8,
    last_clk: u8,
    data_in: u8,
    valid_in: u8,
    ack: u8,
    wide_in: u32,
    nibble: u8,

    count: u32,
    falls: u32,
    echo: u8,

    ready_out: u8,
    busy: u8,
    done: u8,
}

impl CounterModel {
    pub fn new() -> Self {
        Self {
            ready_after: 0,
            done_after: u32::MAX,
            busy_until: 0,
            evals: Vec::new(),
            reset_edges: 0,
            accepted: Vec::new(),
            finalized: Rc::new(Cell::new(0)),
            clk: 0,
            rst: 0,
            last_clk: 0,
            data_in: 0,
            valid_in: 0,
            ack: 0,
            wide_in: 0,
            nibble: 0,
            count: 0,
            falls: 0,
            echo: 0,
            ready_out: 0,
            busy: 0,
            done: 0,
        }
    }

    pub fn ready_after(mut self, cycles: u32) -> Self {
        self.ready_after = cycles;
        self
    }

    pub fn done_after(mut self, cycles: u32) -> Self {
        self.done_after = cycles;
        self
    }

    pub fn busy_until(mut self, cycles: u32) -> Self {
        self.busy_until = cycles;
        self
    }

    fn settle(&mut self) {
        self.ready_out = (self.count >= self.ready_after) as u8;
        self.done = (self.count >= self.done_after) as u8;
        self.busy = (self.count < self.busy_until) as u8;
    }
}

impl Model for CounterModel {
    fn port_set(&self) -> &'static PortSet {
        &MOCK_PORTS
    }

    fn poke(&mut self, port: &PortDecl, value: u64) {
        match port.name {
            "clk" => self.clk = value as u8,
            "rst" => self.rst = value as u8,
            "data_in" => self.data_in = value as u8,
            "valid_in" => self.valid_in = value as u8,
            "ack" => self.ack = value as u8,
            "wide_in" => self.wide_in = value as u32,
            "nibble" => self.nibble = value as u8,
            other => panic!("mock poked unknown port {}", other),
        }
    }

    fn peek(&self, port: &PortDecl) -> u64 {
        match port.name {
            "clk" => self.clk as u64,
            "rst" => self.rst as u64,
            "data_in" => self.data_in as u64,
            "valid_in" => self.valid_in as u64,
            "ack" => self.ack as u64,
            "wide_in" => self.wide_in as u64,
            "nibble" => self.nibble as u64,
            "ready_out" => self.ready_out as u64,
            "busy" => self.busy as u64,
            "done" => self.done as u64,
            "count" => self.count as u64,
            "falls" => self.falls as u64,
            "echo" => self.echo as u64,
            "big" => ((self.wide_in as u64) << 32) | self.count as u64,
            other => panic!("mock peeked unknown port {}", other),
        }
    }

    fn eval(&mut self) {
        let rising = self.clk == 1 && self.last_clk == 0;
        let falling = self.clk == 0 && self.last_clk == 1;
        self.last_clk = self.clk;

        if rising {
            if self.rst == 1 {
                self.count = 0;
                self.falls = 0;
                self.echo = 0;
                self.reset_edges += 1;
            } else {
                if self.valid_in == 1 && self.ready_out == 1 {
                    self.accepted.push(self.data_in);
                    self.echo = self.data_in;
                }
                self.count += 1;
            }
        }
        if falling && self.rst == 0 {
            self.falls += 1;
        }

        self.settle();
        self.evals.push(EvalRecord {
            clk: self.clk,
            falls: self.falls,
            count: self.count,
        });
    }

    fn finalize(&mut self) {
        self.finalized.set(self.finalized.get() + 1);
    }
}

// ---------------------------------------------------------------------------
// Waveform sinks
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Recording {
    pub vars: Vec<TraceVar>,
    pub dumps: Vec<(u64, Vec<u64>)>,
    pub closes: u32,
}

impl Recording {
    pub fn times(&self) -> Vec<u64> {
        self.dumps.iter().map(|(t, _)| *t).collect()
    }
}

/// Records every call; optionally fails every dump after the first `n`.
pub struct RecordingSink {
    log: Rc<RefCell<Recording>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> (Box<Self>, Rc<RefCell<Recording>>) {
        let log = Rc::new(RefCell::new(Recording::default()));
        let sink = Self {
            log: Rc::clone(&log),
            fail_after: None,
        };
        (Box::new(sink), log)
    }

    pub fn failing_after(n: usize) -> (Box<Self>, Rc<RefCell<Recording>>) {
        let (mut sink, log) = Self::new();
        sink.fail_after = Some(n);
        (sink, log)
    }
}

impl WaveformSink for RecordingSink {
    fn begin(&mut self, vars: &[TraceVar]) -> io::Result<()> {
        self.log.borrow_mut().vars = vars.to_vec();
        Ok(())
    }

    fn dump(&mut self, time: u64, values: &[u64]) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        if let Some(n) = self.fail_after {
            if log.dumps.len() >= n {
                return Err(io::Error::new(io::ErrorKind::Other, "sink full"));
            }
        }
        log.dumps.push((time, values.to_vec()));
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.log.borrow_mut().closes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Device stand-ins
// ---------------------------------------------------------------------------

/// Rising and falling clock edge tracking shared by the stand-ins.
#[derive(Default)]
struct Edges {
    clk: bool,
    rst: bool,
    last: bool,
}

impl Edges {
    fn rising(&mut self) -> bool {
        let rising = self.clk && !self.last;
        self.last = self.clk;
        rising
    }
}

/// Accepts characters until a NUL, thinks for `latency` cycles, then streams
/// back the number of characters received as decimal text plus CR/LF.
pub struct AsciiCountModel {
    pub accept_limit: Option<usize>,
    pub latency: u32,
    edges: Edges,
    ascii_in: u8,
    in_valid: bool,
    out_ready: bool,

    received: Vec<u8>,
    countdown: u32,
    processing: bool,
    emitting: bool,
    done: bool,
    reply: VecDeque<u8>,

    in_ready: bool,
}

impl AsciiCountModel {
    pub fn new() -> Self {
        Self {
            accept_limit: None,
            latency: 3,
            edges: Edges::default(),
            ascii_in: 0,
            in_valid: false,
            out_ready: false,
            received: Vec::new(),
            countdown: 0,
            processing: false,
            emitting: false,
            done: false,
            reply: VecDeque::new(),
            in_ready: false,
        }
    }

    pub fn accepting(mut self, limit: usize) -> Self {
        self.accept_limit = Some(limit);
        self
    }

    pub fn received(&self) -> &[u8] {
        &self.received
    }

    fn reset(&mut self) {
        self.received.clear();
        self.countdown = 0;
        self.processing = false;
        self.emitting = false;
        self.done = false;
        self.reply.clear();
    }

    fn settle(&mut self) {
        let room = self.accept_limit.map_or(true, |n| self.received.len() < n);
        self.in_ready = !self.processing && !self.emitting && !self.done && room;
    }

    fn clock(&mut self) {
        if self.in_valid && self.in_ready {
            if self.ascii_in == 0 {
                self.processing = true;
                self.countdown = self.latency;
            } else {
                self.received.push(self.ascii_in);
            }
        } else if self.processing {
            if self.countdown > 0 {
                self.countdown -= 1;
            } else {
                self.processing = false;
                self.emitting = true;
                self.reply
                    .extend(format!("{}\r\n", self.received.len()).bytes());
            }
        } else if self.emitting && self.out_ready {
            self.reply.pop_front();
            if self.reply.is_empty() {
                self.emitting = false;
                self.done = true;
            }
        }
    }
}

impl Model for AsciiCountModel {
    fn port_set(&self) -> &'static PortSet {
        &ascii::PORTS
    }

    fn poke(&mut self, port: &PortDecl, value: u64) {
        let high = value & 1 != 0;
        match port.name {
            "clk" => self.edges.clk = high,
            "rst" => self.edges.rst = high,
            "ascii_in" => self.ascii_in = value as u8,
            "ascii_in_valid" => self.in_valid = high,
            "ascii_out_ready" => self.out_ready = high,
            _ => {}
        }
    }

    fn peek(&self, port: &PortDecl) -> u64 {
        let out_valid = self.emitting && !self.reply.is_empty();
        match port.name {
            "clk" => self.edges.clk as u64,
            "rst" => self.edges.rst as u64,
            "ascii_in" => self.ascii_in as u64,
            "ascii_in_valid" => self.in_valid as u64,
            "ascii_out_ready" => self.out_ready as u64,
            "ascii_in_ready" => self.in_ready as u64,
            "ascii_out" => self.reply.front().copied().unwrap_or(0) as u64,
            "ascii_out_valid" => out_valid as u64,
            "processing" => self.processing as u64,
            "done" => self.done as u64,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        self.settle();
        if self.edges.rising() {
            if self.edges.rst {
                self.reset();
            } else {
                self.clock();
            }
            self.settle();
        }
    }
}

/// Serial counterpart of [`AsciiCountModel`]: decodes `uart_rx` until a
/// NUL, then sends back the count of received characters on `uart_tx`.
pub struct BridgeCountModel {
    baud_div: u64,
    edges: Edges,
    uart_rx: u8,
    decoder: SerialDecoder,
    encoder: SerialEncoder,
    received: Vec<u8>,
    done: bool,
    line: u8,
}

impl BridgeCountModel {
    pub fn new(baud_div: u64) -> Self {
        Self {
            baud_div,
            edges: Edges::default(),
            uart_rx: 1,
            decoder: SerialDecoder::new(baud_div),
            encoder: SerialEncoder::new(baud_div),
            received: Vec::new(),
            done: false,
            line: 1,
        }
    }

    pub fn for_config(config: &Config) -> Self {
        Self::new(config.uart.baud_div)
    }

    pub fn received(&self) -> &[u8] {
        &self.received
    }
}

impl Model for BridgeCountModel {
    fn port_set(&self) -> &'static PortSet {
        &uart_bridge::PORTS
    }

    fn poke(&mut self, port: &PortDecl, value: u64) {
        let high = value & 1 != 0;
        match port.name {
            "clk" => self.edges.clk = high,
            "rst" => self.edges.rst = high,
            "uart_rx" => self.uart_rx = value as u8,
            _ => {}
        }
    }

    fn peek(&self, port: &PortDecl) -> u64 {
        match port.name {
            "clk" => self.edges.clk as u64,
            "rst" => self.edges.rst as u64,
            "uart_rx" => self.uart_rx as u64,
            "uart_tx" => self.line as u64,
            "tx_ready" => 1,
            "processing" => (!self.received.is_empty() && !self.done) as u64,
            "done" => self.done as u64,
            _ => 0,
        }
    }

    fn eval(&mut self) {
        if !self.edges.rising() {
            return;
        }
        if self.edges.rst {
            self.decoder = SerialDecoder::new(self.baud_div);
            self.encoder = SerialEncoder::new(self.baud_div);
            self.received.clear();
            self.done = false;
            self.line = 1;
            return;
        }

        if let Some(byte) = self.decoder.tick(self.uart_rx) {
            if byte == 0 {
                self.done = true;
                self.encoder
                    .extend(format!("{}\r\n", self.received.len()).bytes());
            } else {
                self.received.push(byte);
            }
        }
        self.line = self.encoder.tick();
    }
}

/// Collects vertices, then after `start_search` spends one cycle per vertex
/// before reporting the bounding-box area.
pub struct BoundingBoxModel {
    edges: Edges,
    vertex_x: u32,
    vertex_y: u32,
    vertex_valid: bool,
    vertex_last: bool,
    start: bool,

    vertices: Vec<(u32, u32)>,
    loaded: bool,
    countdown: u32,
    busy: bool,
    done: bool,
    max_area: u64,
    validation_cycles: u32,
}

impl BoundingBoxModel {
    pub fn new() -> Self {
        Self {
            edges: Edges::default(),
            vertex_x: 0,
            vertex_y: 0,
            vertex_valid: false,
            vertex_last: false,
            start: false,
            vertices: Vec::new(),
            loaded: false,
            countdown: 0,
            busy: false,
            done: false,
            max_area: 0,
            validation_cycles: 0,
        }
    }

    fn area(&self) -> u64 {
        let xs = self.vertices.iter().map(|v| v.0);
        let ys = self.vertices.iter().map(|v| v.1);
        match (xs.clone().min(), xs.max(), ys.clone().min(), ys.max()) {
            (Some(x0), Some(x1), Some(y0), Some(y1)) => (x1 - x0) as u64 * (y1 - y0) as u64,
            _ => 0,
        }
    }

    fn state(&self) -> u64 {
        if self.done {
            3
        } else if self.busy {
            2
        } else if !self.vertices.is_empty() {
            1
        } else {
            0
        }
    }
}

impl Model for BoundingBoxModel {
    fn port_set(&self) -> &'static PortSet {
        &max_rect::PORTS
    }

    fn poke(&mut self, port: &PortDecl, value: u64) {
        let high = value & 1 != 0;
        match port.name {
            "clk" => self.edges.clk = high,
            "rst" => self.edges.rst = high,
            "vertex_x" => self.vertex_x = value as u32,
            "vertex_y" => self.vertex_y = value as u32,
            "vertex_valid" => self.vertex_valid = high,
            "vertex_last" => self.vertex_last = high,
            "start_search" => self.start = high,
            _ => {}
        }
    }

    fn peek(&self, port: &PortDecl) -> u64 {
        let n = self.vertices.len() as u64;
        match port.name {
            "clk" => self.edges.clk as u64,
            "rst" => self.edges.rst as u64,
            "vertex_x" => self.vertex_x as u64,
            "vertex_y" => self.vertex_y as u64,
            "vertex_valid" => self.vertex_valid as u64,
            "vertex_last" => self.vertex_last as u64,
            "start_search" => self.start as u64,
            "busy" => self.busy as u64,
            "done" => self.done as u64,
            "valid" => (self.done && self.max_area > 0) as u64,
            "max_area" | "debug_max_area" => self.max_area,
            "rectangles_tested" | "debug_rect_count" => {
                if self.done {
                    n * n.saturating_sub(1) / 2
                } else {
                    0
                }
            }
            "rectangles_pruned" => 0,
            "vertices_loaded" | "debug_num_vertices" => n,
            "validation_cycles" => self.validation_cycles as u64,
            "debug_state" => self.state(),
            _ => 0,
        }
    }

    fn eval(&mut self) {
        if !self.edges.rising() {
            return;
        }
        if self.edges.rst {
            self.vertices.clear();
            self.loaded = false;
            self.countdown = 0;
            self.busy = false;
            self.done = false;
            self.max_area = 0;
            self.validation_cycles = 0;
            return;
        }

        if self.vertex_valid && !self.loaded {
            self.vertices.push((self.vertex_x, self.vertex_y));
            self.loaded = self.vertex_last;
        }
        if self.busy {
            self.validation_cycles += 1;
            if self.countdown == 0 {
                self.busy = false;
                self.done = true;
                self.max_area = self.area();
            } else {
                self.countdown -= 1;
            }
        } else if self.start && self.loaded && !self.done {
            self.busy = true;
            self.countdown = self.vertices.len() as u32;
        }
    }
}
