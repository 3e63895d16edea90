use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::{Result, SimError};

const DEFAULT_BAUD_DIV: u64 = 234;
const DEFAULT_TRACE_DEPTH: u32 = 99;
const DEFAULT_TIMESCALE_NS: u32 = 1;

const HANDSHAKE_WAIT: u64 = 1000;
const OUTPUT_CYCLES: u64 = 1000;
const RUN_CYCLES: u64 = 10_000_000_000;

const RECEIVE_BIT_PERIODS: u64 = 15;
const TRANSMIT_BIT_PERIODS: u64 = 20;
const DRAIN_BIT_PERIODS: u64 = 150;

/// Largest divisor whose derived timeouts fit in a `u64`.
const MAX_BAUD_DIV: u64 = u64::MAX / DRAIN_BIT_PERIODS;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trace: TraceConfig,
    #[serde(default)]
    pub uart: UartConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl Config {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uart.baud_div < 2 {
            return Err(SimError::ConfigValidation(format!(
                "uart.baud_div must be at least 2, got {}",
                self.uart.baud_div
            )));
        }
        if self.uart.baud_div > MAX_BAUD_DIV {
            return Err(SimError::ConfigValidation(format!(
                "uart.baud_div must be at most {}, got {}",
                MAX_BAUD_DIV, self.uart.baud_div
            )));
        }
        if self.trace.from_cycle > self.trace.to_cycle {
            return Err(SimError::ConfigValidation(format!(
                "trace.from_cycle ({}) is after trace.to_cycle ({})",
                self.trace.from_cycle, self.trace.to_cycle
            )));
        }
        if self.trace.timescale_ns == 0 {
            return Err(SimError::ConfigValidation(
                "trace.timescale_ns must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Cycles to wait for one received byte.
    pub fn receive_cycles(&self) -> u64 {
        self.timeouts
            .receive_cycles
            .unwrap_or(self.uart.baud_div * RECEIVE_BIT_PERIODS)
    }

    /// Upper bound on one byte transmission, strobe cycle included.
    pub fn transmit_cycles(&self) -> u64 {
        self.timeouts
            .transmit_cycles
            .unwrap_or(self.uart.baud_div * TRANSMIT_BIT_PERIODS)
    }

    /// Cycles the bridge keeps running after `done` to flush its output.
    pub fn bridge_drain_cycles(&self) -> u64 {
        self.timeouts
            .bridge_drain_cycles
            .unwrap_or(self.uart.baud_div * DRAIN_BIT_PERIODS)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceConfig {
    #[serde(default = "default_trace_depth")]
    pub depth: u32,

    #[serde(default)]
    pub from_cycle: u64,

    #[serde(default = "default_to_cycle")]
    pub to_cycle: u64,

    #[serde(default = "default_timescale_ns")]
    pub timescale_ns: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            depth: default_trace_depth(),
            from_cycle: 0,
            to_cycle: default_to_cycle(),
            timescale_ns: default_timescale_ns(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UartConfig {
    #[serde(default = "default_baud_div")]
    pub baud_div: u64,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baud_div: default_baud_div(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_handshake_wait")]
    pub handshake_wait: u64,

    #[serde(default = "default_output_cycles")]
    pub output_cycles: u64,

    #[serde(default = "default_run_cycles")]
    pub run_cycles: u64,

    /// Derived from `uart.baud_div` when unset.
    #[serde(default)]
    pub receive_cycles: Option<u64>,

    /// Derived from `uart.baud_div` when unset.
    #[serde(default)]
    pub transmit_cycles: Option<u64>,

    /// Derived from `uart.baud_div` when unset.
    #[serde(default)]
    pub bridge_drain_cycles: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            handshake_wait: default_handshake_wait(),
            output_cycles: default_output_cycles(),
            run_cycles: default_run_cycles(),
            receive_cycles: None,
            transmit_cycles: None,
            bridge_drain_cycles: None,
        }
    }
}

fn default_trace_depth() -> u32 {
    DEFAULT_TRACE_DEPTH
}

fn default_to_cycle() -> u64 {
    u64::MAX
}

fn default_timescale_ns() -> u32 {
    DEFAULT_TIMESCALE_NS
}

fn default_baud_div() -> u64 {
    DEFAULT_BAUD_DIV
}

fn default_handshake_wait() -> u64 {
    HANDSHAKE_WAIT
}

fn default_output_cycles() -> u64 {
    OUTPUT_CYCLES
}

fn default_run_cycles() -> u64 {
    RUN_CYCLES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.uart.baud_div, 234);
        assert_eq!(config.trace.depth, 99);
        assert_eq!(config.trace.to_cycle, u64::MAX);
        assert_eq!(config.timeouts.handshake_wait, 1000);
        assert_eq!(config.receive_cycles(), 234 * 15);
        assert_eq!(config.bridge_drain_cycles(), 234 * 150);
    }

    #[test]
    fn explicit_timeouts_override_derived_ones() {
        let config = Config::from_toml_str(
            "[uart]\nbaud_div = 4\n[timeouts]\nreceive_cycles = 7\n",
        )
        .unwrap();
        assert_eq!(config.receive_cycles(), 7);
        assert_eq!(config.transmit_cycles(), 80);
    }

    #[test]
    fn rejects_reversed_trace_window() {
        let err = Config::from_toml_str("[trace]\nfrom_cycle = 9\nto_cycle = 3\n").unwrap_err();
        assert!(matches!(err, SimError::ConfigValidation(_)));
    }

    #[test]
    fn rejects_degenerate_baud_divisor() {
        let err = Config::from_toml_str("[uart]\nbaud_div = 1\n").unwrap_err();
        assert!(matches!(err, SimError::ConfigValidation(_)));
    }
}
