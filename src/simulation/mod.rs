//! Time-stepped Monte Carlo model of a car park with an overflow queue.
//!
//! One tick is one simulated second. Every tick the arrival source is polled,
//! the car park advances, and the sampled occupancy/queue levels land in two
//! histograms. The convergence monitor decides when to stop; the histograms
//! are then turned into cumulative percentile tables.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub mod aggregation;
pub mod arrivals;
pub mod convergence;
pub mod occupancy;

use aggregation::{Histogram, PercentileRow, PercentileTable, histogram_bound, percentile_rows};
use arrivals::{ArrivalSource, DRAW_RANGE, UniformArrivals};
use convergence::{ConvergenceMonitor, Verdict};
use occupancy::{ArrivalOutcome, CarPark, OccupancySampling, OverflowPolicy, TickOutcome};

pub const SECONDS_PER_HOUR: u64 = 3600;
pub const DEFAULT_PERCENTILES: [u32; 12] = [10, 20, 30, 40, 50, 60, 70, 80, 90, 95, 98, 99];
pub const DEFAULT_WARMUP_HOURS: u64 = 100;
pub const DEFAULT_PROBE_INTERVAL_HOURS: u64 = 10;
pub const DEFAULT_MAX_HOURS: u64 = 3000;
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("service time must be at least one second")]
    ZeroServiceTime,
    #[error("space count must be at least one")]
    ZeroSpaces,
    #[error("at least one percentile is required")]
    NoPercentiles,
    #[error("percentile {0} is outside 1..=100")]
    PercentileOutOfRange(u32),
    #[error("{0} must be at least one hour")]
    ZeroHours(&'static str),
    #[error("tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),
}

/// The three inputs of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Expected arrivals per hour.
    pub arrival_rate: u32,
    /// Seconds each car occupies a space.
    pub service_time: u32,
    pub spaces: u32,
}

impl SimulationConfig {
    /// A zero arrival rate is accepted and produces a degenerate run.
    pub fn new(arrival_rate: u32, service_time: u32, spaces: u32) -> Result<Self, ParameterError> {
        if service_time == 0 {
            return Err(ParameterError::ZeroServiceTime);
        }
        if spaces == 0 {
            return Err(ParameterError::ZeroSpaces);
        }
        if arrival_rate > DRAW_RANGE {
            warn!(
                arrival_rate,
                max = DRAW_RANGE,
                "Arrival rate above one car per second saturates"
            );
        }
        Ok(Self {
            arrival_rate,
            service_time,
            spaces,
        })
    }

    /// Demand in spaces if arrivals were perfectly spread: `rate * service / 3600`.
    pub fn theoretical_demand(&self) -> f64 {
        self.arrival_rate as f64 * self.service_time as f64 / SECONDS_PER_HOUR as f64
    }
}

/// Run-wide knobs, normally read from the `[simulation]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub policy: OverflowPolicy,
    pub occupancy_sampling: OccupancySampling,
    pub warmup_hours: u64,
    pub probe_interval_hours: u64,
    pub max_hours: u64,
    pub tolerance: f64,
    pub percentiles: Vec<u32>,
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            policy: OverflowPolicy::default(),
            occupancy_sampling: OccupancySampling::default(),
            warmup_hours: DEFAULT_WARMUP_HOURS,
            probe_interval_hours: DEFAULT_PROBE_INTERVAL_HOURS,
            max_hours: DEFAULT_MAX_HOURS,
            tolerance: DEFAULT_TOLERANCE,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            seed: None,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.percentiles.is_empty() {
            return Err(ParameterError::NoPercentiles);
        }
        if let Some(&bad) = self.percentiles.iter().find(|&&p| p == 0 || p > 100) {
            return Err(ParameterError::PercentileOutOfRange(bad));
        }
        if self.probe_interval_hours == 0 {
            return Err(ParameterError::ZeroHours("probe_interval_hours"));
        }
        if self.max_hours == 0 {
            return Err(ParameterError::ZeroHours("max_hours"));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ParameterError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Accumulators updated once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunStatistics {
    pub total_arrivals: u64,
    pub total_queued_arrivals: u64,
    pub total_blocked_arrivals: u64,
    /// Queue length summed over every tick (car-seconds spent waiting).
    pub total_queue_wait_secs: u64,
    pub elapsed_ticks: u64,
}

impl RunStatistics {
    /// Share of arrivals that could not park straight away, `None` before
    /// the first arrival.
    pub fn overflow_ratio(&self) -> Option<f64> {
        if self.total_arrivals == 0 {
            return None;
        }
        let overflowed = self.total_queued_arrivals + self.total_blocked_arrivals;
        Some(overflowed as f64 / self.total_arrivals as f64)
    }

    fn record(&mut self, outcome: &TickOutcome) {
        self.elapsed_ticks += 1;
        self.total_queue_wait_secs += outcome.sample.queue_length;
        match outcome.arrival {
            Some(ArrivalOutcome::Parked) => self.total_arrivals += 1,
            Some(ArrivalOutcome::Queued) => {
                self.total_arrivals += 1;
                self.total_queued_arrivals += 1;
            }
            Some(ArrivalOutcome::Blocked) => {
                self.total_arrivals += 1;
                self.total_blocked_arrivals += 1;
            }
            None => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Termination {
    Stable { at_hour: u64 },
    Capped { at_hour: u64 },
}

impl Termination {
    pub fn hours(&self) -> u64 {
        match self {
            Termination::Stable { at_hour } | Termination::Capped { at_hour } => *at_hour,
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Termination::Stable { .. })
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub config: SimulationConfig,
    pub policy: OverflowPolicy,
    pub seed: Option<u64>,
    pub statistics: RunStatistics,
    pub termination: Termination,
    pub occupancy_histogram: Histogram,
    pub queue_histogram: Histogram,
    pub occupancy_table: PercentileTable,
    pub queue_table: PercentileTable,
    pub percentiles: Vec<PercentileRow>,
}

pub struct Simulation<A> {
    config: SimulationConfig,
    settings: SimulationSettings,
    arrivals: A,
    car_park: CarPark,
    occupancy: Histogram,
    queue: Histogram,
    statistics: RunStatistics,
    monitor: ConvergenceMonitor,
}

impl<A: ArrivalSource> Simulation<A> {
    pub fn new(config: SimulationConfig, settings: SimulationSettings, arrivals: A) -> Self {
        let bound = histogram_bound(config.arrival_rate, config.service_time);
        Self {
            car_park: CarPark::new(
                config.spaces as usize,
                config.service_time,
                settings.policy,
                settings.occupancy_sampling,
            ),
            occupancy: Histogram::with_bound(bound),
            queue: Histogram::with_bound(bound),
            statistics: RunStatistics::default(),
            monitor: ConvergenceMonitor::new(&settings),
            config,
            settings,
            arrivals,
        }
    }

    pub fn car_park(&self) -> &CarPark {
        &self.car_park
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    /// Advance one tick and fold its sample into the histograms.
    pub fn step(&mut self) -> TickOutcome {
        let arrived = self.arrivals.next_arrival();
        let outcome = self.car_park.tick(arrived);
        self.occupancy.record(outcome.sample.occupancy_index);
        self.queue.record(outcome.sample.queue_length as usize);
        self.statistics.record(&outcome);
        outcome
    }

    /// Step until the convergence monitor stops the run.
    pub fn run(mut self) -> RunOutcome {
        info!(
            arrival_rate = self.config.arrival_rate,
            service_time = self.config.service_time,
            spaces = self.config.spaces,
            policy = ?self.settings.policy,
            max_hours = self.settings.max_hours,
            "Simulation starting"
        );

        let termination = loop {
            self.step();
            let tick = self.statistics.elapsed_ticks;
            match self.monitor.observe(tick, &self.statistics) {
                Verdict::Continue => {}
                Verdict::Stable => {
                    break Termination::Stable {
                        at_hour: tick / SECONDS_PER_HOUR,
                    };
                }
                Verdict::Capped => {
                    break Termination::Capped {
                        at_hour: tick / SECONDS_PER_HOUR,
                    };
                }
            }
        };

        info!(
            hours = termination.hours(),
            stable = termination.is_stable(),
            arrivals = self.statistics.total_arrivals,
            queued = self.statistics.total_queued_arrivals,
            blocked = self.statistics.total_blocked_arrivals,
            "Simulation finished"
        );

        self.finish(termination)
    }

    fn finish(self, termination: Termination) -> RunOutcome {
        let elapsed = self.statistics.elapsed_ticks;
        let occupancy_table = PercentileTable::from_histogram(&self.occupancy, elapsed);
        let queue_table = PercentileTable::from_histogram(&self.queue, elapsed);
        let percentiles = percentile_rows(&self.settings.percentiles, &occupancy_table, &queue_table);

        RunOutcome {
            config: self.config,
            policy: self.settings.policy,
            seed: None,
            statistics: self.statistics,
            termination,
            occupancy_histogram: self.occupancy,
            queue_histogram: self.queue,
            occupancy_table,
            queue_table,
            percentiles,
        }
    }
}

/// Run with uniform arrivals from a seeded ChaCha generator.
pub fn run_seeded(config: SimulationConfig, settings: SimulationSettings, seed: u64) -> RunOutcome {
    let arrivals = UniformArrivals::seeded(config.arrival_rate, seed);
    let mut outcome = Simulation::new(config, settings, arrivals).run();
    outcome.seed = Some(seed);
    outcome
}
