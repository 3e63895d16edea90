//! Driver statistics collection and reporting.
//!
//! Tracks how much simulated time a driver consumed, how many model
//! evaluations and waveform dumps it performed, and the outcome counts of
//! the protocol adapters.

use std::time::Instant;

use serde::Serialize;

use crate::common::Result;

/// Statistics for one driver instance.
///
/// Counters are cumulative from `initialize()`; reset evaluations are
/// counted in `evaluations` but not in `cycles`.
#[derive(Debug, Clone, Serialize)]
pub struct SimStats {
    #[serde(skip)]
    start_time: Instant,
    pub cycles: u64,
    pub evaluations: u64,
    pub waveform_dumps: u64,

    pub handshakes_accepted: u64,
    pub handshakes_timed_out: u64,
    pub polls_present: u64,

    pub bytes_transmitted: u64,
    pub transmit_timeouts: u64,
    pub bytes_received: u64,
    pub receive_timeouts: u64,

    pub runs_completed: u64,
    pub runs_timed_out: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            evaluations: 0,
            waveform_dumps: 0,
            handshakes_accepted: 0,
            handshakes_timed_out: 0,
            polls_present: 0,
            bytes_transmitted: 0,
            transmit_timeouts: 0,
            bytes_received: 0,
            receive_timeouts: 0,
            runs_completed: 0,
            runs_timed_out: 0,
        }
    }
}

impl SimStats {
    /// Simulated cycles per host second, in millions.
    pub fn mcycles_per_sec(&self) -> f64 {
        let seconds = self.start_time.elapsed().as_secs_f64();
        if seconds > 0.0 {
            self.cycles as f64 / seconds / 1_000_000.0
        } else {
            0.0
        }
    }

    /// Serializes the counters as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Prints a formatted summary of all counters.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();

        let pct = |part: u64, whole: u64| {
            if whole > 0 {
                (part as f64 / whole as f64) * 100.0
            } else {
                0.0
            }
        };

        println!("\n==========================================================");
        println!("RTL DRIVER STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_rate                 {:.2} M cycles/s", self.mcycles_per_sec());
        println!("sim_evaluations          {}", self.evaluations);
        println!("waveform_dumps           {}", self.waveform_dumps);
        println!("----------------------------------------------------------");
        println!("HANDSHAKE");
        let hs_total = self.handshakes_accepted + self.handshakes_timed_out;
        println!(
            "  hs.accepted            {} ({:.2}%)",
            self.handshakes_accepted,
            pct(self.handshakes_accepted, hs_total)
        );
        println!("  hs.timed_out           {}", self.handshakes_timed_out);
        println!("  poll.present           {}", self.polls_present);
        println!("----------------------------------------------------------");
        println!("SERIAL");
        println!("  tx.bytes               {}", self.bytes_transmitted);
        println!("  tx.timeouts            {}", self.transmit_timeouts);
        println!("  rx.bytes               {}", self.bytes_received);
        println!("  rx.timeouts            {}", self.receive_timeouts);
        println!("----------------------------------------------------------");
        println!("RUN TO COMPLETION");
        let run_total = self.runs_completed + self.runs_timed_out;
        println!(
            "  run.completed          {} ({:.2}%)",
            self.runs_completed,
            pct(self.runs_completed, run_total)
        );
        println!("  run.timed_out          {}", self.runs_timed_out);
        println!("==========================================================");
    }
}
