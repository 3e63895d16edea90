//! Simulation time.

/// Half-cycle ticks per full clock cycle.
pub const TICKS_PER_CYCLE: u64 = 2;

/// Monotonic half-cycle counter, zero immediately after reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    ticks: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self { ticks: 0 }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Full cycles completed; also the index of the cycle in progress.
    pub fn cycle(&self) -> u64 {
        self.ticks / TICKS_PER_CYCLE
    }

    /// Advances by one half cycle.
    pub fn tick(&mut self) {
        self.ticks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_is_half_the_tick_count() {
        let mut clock = SimClock::new();
        assert_eq!(clock.cycle(), 0);
        clock.tick();
        assert_eq!(clock.ticks(), 1);
        assert_eq!(clock.cycle(), 0);
        clock.tick();
        assert_eq!(clock.cycle(), 1);
    }
}
