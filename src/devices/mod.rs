//! Device Specializations.
//!
//! Each submodule declares one device's port table and wraps a [`Driver`]
//! with the convenience operations that device is exercised through. The
//! wrappers are generic over the circuit model, so any [`Model`] reporting the
//! matching port set can be bound.

/// ASCII max-rectangle unit with byte-stream ready/valid channels.
pub mod ascii;

/// Rectangle search engine fed with a vertex stream.
pub mod max_rect;

/// UART transceiver in loopback.
pub mod uart;

/// Single-wire serial front end to the ASCII unit.
pub mod uart_bridge;

use tracing::debug;

use crate::common::{PortSet, Result, SimError};
use crate::config::Config;
use crate::sim::{Driver, Model};

pub use ascii::AsciiDevice;
pub use max_rect::{load_polygon_file, parse_polygon, MaxRectDevice, Vertex};
pub use uart::UartDevice;
pub use uart_bridge::UartBridgeDevice;

/// Checks that `model` implements `ports`, then resets it under a new driver.
pub(crate) fn bind<M: Model>(model: M, ports: &'static PortSet, config: &Config) -> Result<Driver<M>> {
    let actual = model.port_set();
    if actual != ports {
        return Err(SimError::ModelConstruction(format!(
            "model implements '{}', expected '{}'",
            actual.name, ports.name
        )));
    }

    debug!(device = ports.name, "binding model");
    Ok(Driver::initialize(model).with_trace_config(&config.trace))
}

/// Appends one output byte, dropping carriage returns and line feeds.
pub(crate) fn push_output(out: &mut String, byte: u8) {
    let c = byte as char;
    if c != '\r' && c != '\n' {
        out.push(c);
    }
}
