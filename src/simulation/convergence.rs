//! Stopping rule for a run.
//!
//! After the warm-up, every probe interval compares the overflow ratio
//! (queued or blocked arrivals over all arrivals) with the previous probe.
//! The run is stable once two probes differ by less than the tolerance, and
//! capped when the hard tick limit is reached first.

use crate::simulation::{RunStatistics, SECONDS_PER_HOUR, SimulationSettings};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stable,
    Capped,
}

#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    warmup_ticks: u64,
    probe_interval_ticks: u64,
    max_ticks: u64,
    tolerance: f64,
    /// `None` after a probe with no arrivals; the next probe only records.
    previous_ratio: Option<f64>,
}

impl ConvergenceMonitor {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            warmup_ticks: settings.warmup_hours * SECONDS_PER_HOUR,
            probe_interval_ticks: settings.probe_interval_hours.max(1) * SECONDS_PER_HOUR,
            max_ticks: settings.max_hours.max(1) * SECONDS_PER_HOUR,
            tolerance: settings.tolerance,
            previous_ratio: Some(0.0),
        }
    }

    /// Called after tick number `tick` (1-based) has been processed.
    pub fn observe(&mut self, tick: u64, statistics: &RunStatistics) -> Verdict {
        let stable = self.is_probe_tick(tick) && self.probe(tick, statistics);

        if tick >= self.max_ticks {
            return Verdict::Capped;
        }
        if stable {
            return Verdict::Stable;
        }
        Verdict::Continue
    }

    fn is_probe_tick(&self, tick: u64) -> bool {
        tick > self.warmup_ticks && tick % self.probe_interval_ticks == 0
    }

    fn probe(&mut self, tick: u64, statistics: &RunStatistics) -> bool {
        let ratio = statistics.overflow_ratio();
        let delta = ratio
            .zip(self.previous_ratio)
            .map(|(current, previous)| (current - previous).abs());
        debug!(
            hour = tick / SECONDS_PER_HOUR,
            ratio = ?ratio,
            previous = ?self.previous_ratio,
            delta = ?delta,
            "Convergence probe"
        );
        self.previous_ratio = ratio;
        delta.is_some_and(|delta| delta < self.tolerance)
    }
}
