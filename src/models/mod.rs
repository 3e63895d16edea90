//! In-process circuit models.
//!
//! Behavioral stand-ins for compiled RTL, implementing [`crate::sim::Model`]
//! so the driver and its device bindings can be exercised without an
//! external simulator.

/// UART transmitter looped back into a receiver.
pub mod uart_loopback;

pub use uart_loopback::UartLoopbackModel;
