//! Time-Windowed Waveform Capture.
//!
//! A [`TraceWindow`] owns a [`WaveformSink`] and forwards the model's full
//! signal state to it after every evaluation whose cycle index lies inside
//! the inclusive `[from_cycle, to_cycle]` range. Outside the range nothing is
//! written, which keeps trace files small when only a narrow slice of a long
//! run is of interest.

use std::io;

use tracing::warn;

use crate::common::{Result, SimError};
use crate::sim::model::{Model, TraceVar};

/// Destination for signal-state dumps.
///
/// The encoding is up to the implementation; the driver only promises to
/// call `begin` once, then `dump` with values in the order of the declared
/// variables and strictly increasing times, then `close`.
pub trait WaveformSink {
    /// Declares the traced variables.
    fn begin(&mut self, vars: &[TraceVar]) -> io::Result<()>;

    /// Records the value of every declared variable at `time` (in ticks).
    fn dump(&mut self, time: u64, values: &[u64]) -> io::Result<()>;

    /// Flushes and closes the sink. Must tolerate repeated calls.
    fn close(&mut self) -> io::Result<()>;
}

/// An attached waveform sink and the cycle range it captures.
pub struct TraceWindow {
    sink: Box<dyn WaveformSink>,
    from_cycle: u64,
    to_cycle: u64,
    enabled: bool,
    /// Indices into the model's trace variables kept at the configured
    /// depth; `None` keeps all of them.
    selected: Option<Vec<usize>>,
    raw: Vec<u64>,
    values: Vec<u64>,
    dumps: u64,
    error: Option<io::Error>,
}

impl TraceWindow {
    /// Declares the model's signals on `sink` and starts an enabled window.
    ///
    /// Only signals whose scope is at most `depth` levels deep are captured.
    pub fn open<M: Model + ?Sized>(
        mut sink: Box<dyn WaveformSink>,
        model: &M,
        from_cycle: u64,
        to_cycle: u64,
        depth: u32,
    ) -> Result<Self> {
        if from_cycle > to_cycle {
            return Err(SimError::InvalidTraceWindow {
                from: from_cycle,
                to: to_cycle,
            });
        }

        let vars = model.trace_vars();
        let keep: Vec<usize> = (0..vars.len()).filter(|&i| vars[i].depth() <= depth).collect();
        let (declared, selected) = if keep.len() == vars.len() {
            (vars, None)
        } else {
            (keep.iter().map(|&i| vars[i]).collect(), Some(keep))
        };

        sink.begin(&declared).map_err(SimError::WaveformWrite)?;

        Ok(Self {
            sink,
            from_cycle,
            to_cycle,
            enabled: true,
            selected,
            raw: Vec::with_capacity(declared.len()),
            values: Vec::with_capacity(declared.len()),
            dumps: 0,
            error: None,
        })
    }

    pub fn from_cycle(&self) -> u64 {
        self.from_cycle
    }

    pub fn to_cycle(&self) -> u64 {
        self.to_cycle
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of dumps written so far.
    pub fn dumps(&self) -> u64 {
        self.dumps
    }

    /// Checks whether `cycle` falls inside the inclusive window.
    pub fn covers(&self, cycle: u64) -> bool {
        cycle >= self.from_cycle && cycle <= self.to_cycle
    }

    /// Dumps the model's state at `tick` if `cycle` is inside the window.
    ///
    /// # Returns
    ///
    /// `true` if a dump was written.
    pub fn sample<M: Model + ?Sized>(&mut self, model: &M, cycle: u64, tick: u64) -> bool {
        if !self.enabled || !self.covers(cycle) {
            return false;
        }

        self.raw.clear();
        model.trace_values(&mut self.raw);
        let values = match &self.selected {
            None => &self.raw,
            Some(keep) => {
                self.values.clear();
                self.values.extend(keep.iter().map(|&i| self.raw[i]));
                &self.values
            }
        };

        match self.sink.dump(tick, values) {
            Ok(()) => {
                self.dumps += 1;
                true
            }
            Err(e) => {
                warn!(tick, error = %e, "waveform dump failed, tracing disabled");
                self.error = Some(e);
                self.enabled = false;
                false
            }
        }
    }

    /// Closes the sink.
    ///
    /// Reports the first dump failure if one occurred, otherwise any failure
    /// to close.
    pub fn close(mut self) -> Result<()> {
        let closed = self.sink.close();
        if let Some(e) = self.error.take() {
            return Err(SimError::WaveformWrite(e));
        }
        closed.map_err(SimError::WaveformWrite)
    }
}
