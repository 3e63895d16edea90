//! Common types used throughout the driver.
//!
//! This module provides the error type shared by every component and the
//! declarative port tables each device specialization is bound to.

/// Error types and the crate `Result` alias.
pub mod error;

/// Port declarations, typed port handles, and port sets.
pub mod port;

pub use error::{Result, SimError};
pub use port::{IdleValue, Port, PortDecl, PortDirection, PortSet, PortValue, CLOCK, RESET};
