//! Structured results of a run, ready for rendering or serialisation.

use crate::simulation::aggregation::PercentileRow;
use crate::simulation::occupancy::OverflowPolicy;
use crate::simulation::{
    RunOutcome, SECONDS_PER_HOUR, SimulationConfig, SimulationSettings, Termination, run_seeded,
};
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub arrival_rate: u32,
    pub service_time: u32,
    pub spaces: u32,
    pub policy: OverflowPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub compute_time_ms: u64,
    pub termination: Termination,
    pub total_arrivals: u64,
    pub total_queued_arrivals: u64,
    pub total_blocked_arrivals: u64,
    pub queued_percent: Option<f64>,
    pub blocked_percent: Option<f64>,
    pub average_wait_per_arrival_secs: Option<f64>,
    pub average_wait_per_queued_secs: Option<f64>,
    pub observed_arrivals_per_hour: Option<f64>,
    /// `round(arrivals / hours * service_time / 3600)`
    pub demand_spaces: Option<u64>,
    pub theoretical_demand_spaces: f64,
    pub percentiles: Vec<PercentileRow>,
}

impl SimulationReport {
    pub fn from_outcome(outcome: &RunOutcome, compute_time: Duration) -> Self {
        let stats = &outcome.statistics;
        let hours = outcome.termination.hours();
        let service_time = outcome.config.service_time;

        let observed_arrivals_per_hour = ratio(stats.total_arrivals, hours);
        let demand_spaces = observed_arrivals_per_hour.map(|per_hour| {
            (per_hour * service_time as f64 / SECONDS_PER_HOUR as f64).round() as u64
        });

        Self {
            arrival_rate: outcome.config.arrival_rate,
            service_time,
            spaces: outcome.config.spaces,
            policy: outcome.policy,
            seed: outcome.seed,
            compute_time_ms: u64::try_from(compute_time.as_millis()).unwrap_or(u64::MAX),
            termination: outcome.termination,
            total_arrivals: stats.total_arrivals,
            total_queued_arrivals: stats.total_queued_arrivals,
            total_blocked_arrivals: stats.total_blocked_arrivals,
            queued_percent: ratio(stats.total_queued_arrivals * 100, stats.total_arrivals),
            blocked_percent: ratio(stats.total_blocked_arrivals * 100, stats.total_arrivals),
            average_wait_per_arrival_secs: ratio(stats.total_queue_wait_secs, stats.total_arrivals),
            average_wait_per_queued_secs: ratio(
                stats.total_queue_wait_secs,
                stats.total_queued_arrivals,
            ),
            observed_arrivals_per_hour,
            demand_spaces,
            theoretical_demand_spaces: outcome.config.theoretical_demand(),
            percentiles: outcome.percentiles.clone(),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

/// Run a seeded simulation and time it.
pub fn run_and_report(
    config: SimulationConfig,
    settings: SimulationSettings,
    seed: u64,
) -> SimulationReport {
    let started = Instant::now();
    let outcome = run_seeded(config, settings, seed);
    SimulationReport::from_outcome(&outcome, started.elapsed())
}
