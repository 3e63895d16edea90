//! Driver Error Types.
//!
//! Recoverable failures surfaced by the driver: model construction, waveform
//! sink setup and I/O, configuration loading, and input parsing. Protocol
//! timeouts are deliberately absent; they are ordinary results
//! (see [`crate::protocol::Completion`]).

use std::io;
use std::path::PathBuf;

/// Errors reported by the simulation driver.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The circuit model could not be constructed or does not match the
    /// device it is bound to.
    #[error("model construction failed: {0}")]
    ModelConstruction(String),

    /// The waveform sink could not be created at the requested path.
    #[error("cannot open waveform sink '{}': {source}", path.display())]
    WaveformOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to an attached waveform sink failed.
    #[error("waveform write failed: {0}")]
    WaveformWrite(#[source] io::Error),

    /// A trace window was requested with `from_cycle > to_cycle`.
    #[error("invalid trace window: from cycle {from} is after to cycle {to}")]
    InvalidTraceWindow { from: u64, to: u64 },

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A configuration file is not valid TOML for [`crate::config::Config`].
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Statistics could not be serialized.
    #[error("stats serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A polygon description line could not be parsed.
    #[error("malformed vertex on line {line}: '{text}'")]
    MalformedVertex { line: usize, text: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
