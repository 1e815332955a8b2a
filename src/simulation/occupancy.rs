//! Parked cars and the overflow queue, advanced one second per tick.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What happens to an arrival that finds every space taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Wait in the unbounded queue until a space frees up.
    #[default]
    Queue,
    /// Leave immediately (loss system).
    Block,
}

/// How the occupancy level is bucketed when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancySampling {
    /// Index of the last occupied slot, `max(len - 1, 0)`.
    #[default]
    LastSlot,
    /// Number of occupied spaces.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkedCar {
    pub remaining_secs: u32,
}

/// Levels recorded at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub occupancy_index: usize,
    pub queue_length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    Parked,
    Queued,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub sample: Sample,
    pub departed: bool,
    pub admitted_from_queue: bool,
    pub arrival: Option<ArrivalOutcome>,
}

#[derive(Debug, Clone)]
pub struct CarPark {
    parked: VecDeque<ParkedCar>,
    queue_length: u64,
    capacity: usize,
    service_time: u32,
    policy: OverflowPolicy,
    sampling: OccupancySampling,
}

impl CarPark {
    pub fn new(
        capacity: usize,
        service_time: u32,
        policy: OverflowPolicy,
        sampling: OccupancySampling,
    ) -> Self {
        Self {
            parked: VecDeque::with_capacity(capacity),
            queue_length: 0,
            capacity,
            service_time,
            policy,
            sampling,
        }
    }

    pub fn occupied(&self) -> usize {
        self.parked.len()
    }

    pub fn queue_length(&self) -> u64 {
        self.queue_length
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn parked(&self) -> impl Iterator<Item = &ParkedCar> {
        self.parked.iter()
    }

    /// Advance one second: sample, age, then admit the arrival (if any).
    pub fn tick(&mut self, arrived: bool) -> TickOutcome {
        let sample = self.sample();
        let (departed, admitted_from_queue) = self.age();
        let arrival = arrived.then(|| self.arrive());

        assert!(
            self.parked.len() <= self.capacity,
            "occupancy {} exceeds capacity {}",
            self.parked.len(),
            self.capacity
        );

        TickOutcome {
            sample,
            departed,
            admitted_from_queue,
            arrival,
        }
    }

    pub fn sample(&self) -> Sample {
        let occupancy_index = match self.sampling {
            OccupancySampling::LastSlot => self.parked.len().saturating_sub(1),
            OccupancySampling::Count => self.parked.len(),
        };
        Sample {
            occupancy_index,
            queue_length: self.queue_length,
        }
    }

    // Only the front car is checked, so at most one departure per tick.
    fn age(&mut self) -> (bool, bool) {
        for car in self.parked.iter_mut() {
            car.remaining_secs = car.remaining_secs.saturating_sub(1);
        }

        let front_done = self
            .parked
            .front()
            .is_some_and(|car| car.remaining_secs == 0);
        if !front_done {
            return (false, false);
        }

        self.parked.pop_front();
        if self.queue_length > 0 {
            self.park();
            self.queue_length -= 1;
            return (true, true);
        }
        (true, false)
    }

    fn arrive(&mut self) -> ArrivalOutcome {
        if self.parked.len() < self.capacity {
            self.park();
            return ArrivalOutcome::Parked;
        }
        match self.policy {
            OverflowPolicy::Queue => {
                self.queue_length += 1;
                ArrivalOutcome::Queued
            }
            OverflowPolicy::Block => ArrivalOutcome::Blocked,
        }
    }

    fn park(&mut self) {
        self.parked.push_back(ParkedCar {
            remaining_secs: self.service_time,
        });
    }
}
