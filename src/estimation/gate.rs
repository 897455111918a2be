use crate::config::TimingConfig;
use crate::constants::MICROS_PER_SEC;

/// Outcome of timing a cycle against the previous one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleTiming {
    /// `dt` inside the open validity window; the estimators may run
    Valid(f32),
    /// `dt` outside the window (stale, too fast, or out of order)
    Rejected(f32),
}

impl CycleTiming {
    pub fn dt(&self) -> f32 {
        match self {
            Self::Valid(dt) | Self::Rejected(dt) => *dt,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Tracks the last-update timestamp and decides whether a cycle's `dt` is usable.
///
/// The timestamp advances on every evaluated cycle, accepted or not, so one
/// stale cycle does not turn into an oversized `dt` on the next call.
/// Timestamps are subtracted with wrapping arithmetic: a timestamp earlier than
/// the last one produces a huge `dt` and is rejected.
#[derive(Debug, Clone)]
pub struct CycleGate {
    min_dt: f32,
    max_dt: f32,
    last_update_us: u64,
}

impl CycleGate {
    pub fn new(config: &TimingConfig, start_us: u64) -> Self {
        Self {
            min_dt: config.min_dt_secs,
            max_dt: config.max_dt_secs,
            last_update_us: start_us,
        }
    }

    /// Time the cycle ending at `now_us` and record it as the last update.
    pub fn advance(&mut self, now_us: u64) -> CycleTiming {
        let elapsed_us = now_us.wrapping_sub(self.last_update_us);
        let dt = elapsed_us as f32 / MICROS_PER_SEC;
        self.last_update_us = now_us;

        if dt > self.min_dt && dt < self.max_dt {
            CycleTiming::Valid(dt)
        } else {
            CycleTiming::Rejected(dt)
        }
    }

    pub fn last_update_us(&self) -> u64 {
        self.last_update_us
    }

    pub fn reset(&mut self, now_us: u64) {
        self.last_update_us = now_us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CycleGate {
        CycleGate::new(&TimingConfig::default(), 1_000_000)
    }

    #[test]
    fn test_nominal_cycle_is_valid() {
        let mut g = gate();
        let timing = g.advance(1_020_000);
        assert!(timing.is_valid());
        assert!((timing.dt() - 0.02).abs() < 1e-6);
        assert_eq!(g.last_update_us(), 1_020_000);
    }

    #[test]
    fn test_window_bounds_are_exclusive() {
        let mut g = gate();
        // exactly 100 us
        assert!(!g.advance(1_000_100).is_valid());
        // exactly 100 ms
        assert!(!g.advance(1_100_100).is_valid());
        assert!(g.advance(1_100_201).is_valid());
        assert!(g.advance(1_200_200).is_valid());
    }

    #[test]
    fn test_rejected_cycle_still_advances_timestamp() {
        let mut g = gate();
        let stale = g.advance(1_500_000);
        assert!(!stale.is_valid());
        assert!((stale.dt() - 0.5).abs() < 1e-6);
        assert_eq!(g.last_update_us(), 1_500_000);

        // next cycle measures from the stale one, not from the start
        let next = g.advance(1_520_000);
        assert!(next.is_valid());
        assert!((next.dt() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_zero_and_out_of_order() {
        let mut g = gate();
        assert!(!g.advance(1_000_000).is_valid());
        let backwards = g.advance(999_000);
        assert!(!backwards.is_valid());
        assert!(backwards.dt() > 1.0);
        assert_eq!(g.last_update_us(), 999_000);
    }
}
