//! Rectangle Search Engine (`rtl_max_rect`).
//!
//! Polygon vertices are streamed in one per cycle with `vertex_valid`, the
//! final one flagged with `vertex_last`. A one-cycle `start_search` strobe
//! kicks off the search; `done` rises when `max_area` and the diagnostic
//! counters are final.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::common::{Port, PortSet, Result, SimError};
use crate::config::Config;
use crate::protocol::{run_until_high, Completion};
use crate::sim::{Driver, Model};

pub const VERTEX_X: Port<u32> = Port::input("vertex_x", 20);
pub const VERTEX_Y: Port<u32> = Port::input("vertex_y", 20);
pub const VERTEX_VALID: Port<u8> = Port::input("vertex_valid", 1);
pub const VERTEX_LAST: Port<u8> = Port::input("vertex_last", 1);
pub const START_SEARCH: Port<u8> = Port::input("start_search", 1);

pub const BUSY: Port<u8> = Port::output("busy", 1);
pub const DONE: Port<u8> = Port::output("done", 1);
pub const VALID: Port<u8> = Port::output("valid", 1);
pub const MAX_AREA: Port<u64> = Port::output("max_area", 40);
pub const RECTANGLES_TESTED: Port<u64> = Port::output("rectangles_tested", 64);
pub const RECTANGLES_PRUNED: Port<u64> = Port::output("rectangles_pruned", 64);
pub const VERTICES_LOADED: Port<u32> = Port::output("vertices_loaded", 32);
pub const VALIDATION_CYCLES: Port<u32> = Port::output("validation_cycles", 32);
pub const DEBUG_STATE: Port<u8> = Port::output("debug_state", 4);
pub const DEBUG_NUM_VERTICES: Port<u32> = Port::output("debug_num_vertices", 32);
pub const DEBUG_RECT_COUNT: Port<u64> = Port::output("debug_rect_count", 64);
pub const DEBUG_MAX_AREA: Port<u64> = Port::output("debug_max_area", 40);

pub static PORTS: PortSet = PortSet::new(
    "rtl_max_rect",
    &[
        VERTEX_X.decl(),
        VERTEX_Y.decl(),
        VERTEX_VALID.decl(),
        VERTEX_LAST.decl(),
        START_SEARCH.decl(),
        BUSY.decl(),
        DONE.decl(),
        VALID.decl(),
        MAX_AREA.decl(),
        RECTANGLES_TESTED.decl(),
        RECTANGLES_PRUNED.decl(),
        VERTICES_LOADED.decl(),
        VALIDATION_CYCLES.decl(),
        DEBUG_STATE.decl(),
        DEBUG_NUM_VERTICES.decl(),
        DEBUG_RECT_COUNT.decl(),
        DEBUG_MAX_AREA.decl(),
    ],
    &[],
);

/// One polygon corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub x: u32,
    pub y: u32,
}

impl Vertex {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Parses `x,y` lines into vertices.
///
/// Parsing stops at the first blank line. Lines with fewer than two fields
/// are skipped; extra fields are ignored.
///
/// # Returns
///
/// `SimError::MalformedVertex` if a coordinate is not an unsigned integer.
pub fn parse_polygon(text: &str) -> Result<Vec<Vertex>> {
    let mut vertices = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            break;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 2 {
            continue;
        }

        let coord = |field: &str| {
            field.trim().parse::<u32>().map_err(|_| SimError::MalformedVertex {
                line: index + 1,
                text: line.to_string(),
            })
        };
        vertices.push(Vertex::new(coord(fields[0])?, coord(fields[1])?));
    }
    Ok(vertices)
}

/// Reads and parses a polygon file.
pub fn load_polygon_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vertex>> {
    parse_polygon(&fs::read_to_string(path)?)
}

/// Driver bound to the rectangle search engine.
pub struct MaxRectDevice<M: Model> {
    driver: Driver<M>,
    run_cycles: u64,
}

impl<M: Model> MaxRectDevice<M> {
    pub fn new(model: M, config: &Config) -> Result<Self> {
        Ok(Self {
            driver: super::bind(model, &PORTS, config)?,
            run_cycles: config.timeouts.run_cycles,
        })
    }

    pub fn driver(&self) -> &Driver<M> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut Driver<M> {
        &mut self.driver
    }

    /// Presents one vertex for exactly one cycle.
    pub fn load_vertex(&mut self, vertex: Vertex, last: bool) {
        self.driver.set(VERTEX_X, vertex.x);
        self.driver.set(VERTEX_Y, vertex.y);
        self.driver.set(VERTEX_VALID, 1);
        self.driver.set(VERTEX_LAST, last as u8);
        self.driver.advance_one_cycle();
        self.driver.set(VERTEX_VALID, 0);
        self.driver.set(VERTEX_LAST, 0);
    }

    /// Streams `vertices`, flagging the final one as last.
    pub fn load_polygon(&mut self, vertices: &[Vertex]) {
        let count = vertices.len();
        for (i, &vertex) in vertices.iter().enumerate() {
            self.load_vertex(vertex, i + 1 == count);
        }
        debug!(count, "polygon loaded");
    }

    /// Pulses `start_search` for one cycle.
    pub fn start_search(&mut self) {
        self.driver.set(START_SEARCH, 1);
        self.driver.advance_one_cycle();
        self.driver.set(START_SEARCH, 0);
    }

    /// Runs until `done`, for at most `max_cycles` cycles.
    pub fn wait_done(&mut self, max_cycles: u64) -> Completion {
        run_until_high(&mut self.driver, DONE, max_cycles)
    }

    /// Loads `vertices`, starts the search and waits for it within the
    /// configured run bound.
    pub fn search(&mut self, vertices: &[Vertex]) -> Completion {
        self.load_polygon(vertices);
        self.start_search();
        self.wait_done(self.run_cycles)
    }

    pub fn busy(&self) -> bool {
        self.driver.is_high(BUSY)
    }

    pub fn done(&self) -> bool {
        self.driver.is_high(DONE)
    }

    /// Checks whether the search found a rectangle.
    pub fn valid(&self) -> bool {
        self.driver.is_high(VALID)
    }

    pub fn max_area(&self) -> u64 {
        self.driver.get(MAX_AREA)
    }

    pub fn rectangles_tested(&self) -> u64 {
        self.driver.get(RECTANGLES_TESTED)
    }

    pub fn rectangles_pruned(&self) -> u64 {
        self.driver.get(RECTANGLES_PRUNED)
    }

    pub fn vertices_loaded(&self) -> u32 {
        self.driver.get(VERTICES_LOADED)
    }

    pub fn validation_cycles(&self) -> u32 {
        self.driver.get(VALIDATION_CYCLES)
    }

    pub fn debug_state(&self) -> u8 {
        self.driver.get(DEBUG_STATE)
    }

    pub fn debug_num_vertices(&self) -> u32 {
        self.driver.get(DEBUG_NUM_VERTICES)
    }

    pub fn debug_rect_count(&self) -> u64 {
        self.driver.get(DEBUG_RECT_COUNT)
    }

    pub fn debug_max_area(&self) -> u64 {
        self.driver.get(DEBUG_MAX_AREA)
    }

    pub fn teardown(&mut self) -> Result<()> {
        self.driver.teardown()
    }
}
