//! Per-tick histograms and the cumulative percentile tables built from them.

use serde::Serialize;
use tracing::debug;

/// Tick counts per level (occupied slot index or queue length).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u64>,
    initial_bound: usize,
}

impl Histogram {
    /// Zeroed histogram pre-sized to `bound` levels. Grows if a level
    /// beyond the bound is ever recorded.
    pub fn with_bound(bound: usize) -> Self {
        Self {
            counts: vec![0; bound],
            initial_bound: bound,
        }
    }

    pub fn from_counts(counts: Vec<u64>) -> Self {
        let initial_bound = counts.len();
        Self {
            counts,
            initial_bound,
        }
    }

    pub fn record(&mut self, level: usize) {
        if level >= self.counts.len() {
            if self.counts.len() == self.initial_bound {
                debug!(
                    level,
                    bound = self.initial_bound,
                    "Histogram level exceeds heuristic bound, growing"
                );
            }
            self.counts.resize(level + 1, 0);
        }
        self.counts[level] += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Prefix sums: entry `i` holds the ticks spent at level `i` or below.
    pub fn cumulative(&self) -> Vec<u64> {
        self.counts
            .iter()
            .scan(0u64, |running, count| {
                *running += count;
                Some(*running)
            })
            .collect()
    }
}

/// Cumulative distribution as whole percentages of elapsed ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PercentileTable {
    percentages: Vec<u32>,
}

impl PercentileTable {
    pub fn from_histogram(histogram: &Histogram, elapsed_ticks: u64) -> Self {
        let percentages = histogram
            .cumulative()
            .into_iter()
            .map(|cumulative| to_percentage(cumulative, elapsed_ticks))
            .collect();
        Self { percentages }
    }

    pub fn percentages(&self) -> &[u32] {
        &self.percentages
    }

    /// Smallest level whose cumulative percentage reaches `percentile`,
    /// or `None` when the table never gets there.
    pub fn first_index_at_or_above(&self, percentile: u32) -> Option<usize> {
        self.percentages
            .iter()
            .position(|&percentage| percentage >= percentile)
    }
}

fn to_percentage(cumulative: u64, elapsed_ticks: u64) -> u32 {
    if elapsed_ticks == 0 {
        return 0;
    }
    (100.0 * cumulative as f64 / elapsed_ticks as f64).round() as u32
}

/// One line of the percentile report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentileRow {
    pub percentile: u32,
    pub occupancy: Option<usize>,
    pub queue: Option<usize>,
}

pub fn percentile_rows(
    percentiles: &[u32],
    occupancy: &PercentileTable,
    queue: &PercentileTable,
) -> Vec<PercentileRow> {
    percentiles
        .iter()
        .map(|&percentile| PercentileRow {
            percentile,
            occupancy: occupancy.first_index_at_or_above(percentile),
            queue: queue.first_index_at_or_above(percentile),
        })
        .collect()
}

/// Initial histogram size: `arrival_rate * floor(service_time / 600) + 200`.
pub fn histogram_bound(arrival_rate: u32, service_time: u32) -> usize {
    arrival_rate as usize * (service_time / 600) as usize + 200
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_histogram() -> Histogram {
        Histogram::from_counts(vec![50, 0, 30, 15, 5, 0])
    }

    #[test]
    fn cumulative_is_non_decreasing_and_ends_at_total() {
        let histogram = sample_histogram();
        let cumulative = histogram.cumulative();

        assert!(cumulative.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(cumulative.last().copied(), Some(histogram.total()));
        assert_eq!(cumulative, vec![50, 50, 80, 95, 100, 100]);
    }

    #[test]
    fn record_grows_past_the_initial_bound() {
        let mut histogram = Histogram::with_bound(2);
        histogram.record(0);
        histogram.record(5);

        assert_eq!(histogram.counts(), &[1, 0, 0, 0, 0, 1]);
        assert_eq!(histogram.total(), 2);
    }

    #[test]
    fn percentages_are_rounded_shares_of_elapsed_ticks() {
        let table = PercentileTable::from_histogram(&sample_histogram(), 100);
        assert_eq!(table.percentages(), &[50, 50, 80, 95, 100, 100]);

        let thirds = Histogram::from_counts(vec![1, 1, 1]);
        let table = PercentileTable::from_histogram(&thirds, 3);
        assert_eq!(table.percentages(), &[33, 67, 100]);
    }

    #[test]
    fn lookup_returns_first_level_reaching_percentile() {
        let table = PercentileTable::from_histogram(&sample_histogram(), 100);

        assert_eq!(table.first_index_at_or_above(10), Some(0));
        assert_eq!(table.first_index_at_or_above(50), Some(0));
        assert_eq!(table.first_index_at_or_above(51), Some(2));
        assert_eq!(table.first_index_at_or_above(95), Some(3));
        assert_eq!(table.first_index_at_or_above(99), Some(4));
    }

    #[test]
    fn lookup_is_monotonic_in_percentile() {
        let table = PercentileTable::from_histogram(&sample_histogram(), 100);
        let levels: Vec<Option<usize>> = (0..=100)
            .map(|p| table.first_index_at_or_above(p))
            .collect();

        assert!(levels.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn lookup_reports_unbounded_when_never_reached() {
        let empty = PercentileTable::from_histogram(&Histogram::with_bound(4), 0);
        assert_eq!(empty.percentages(), &[0, 0, 0, 0]);
        assert_eq!(empty.first_index_at_or_above(10), None);

        let table = PercentileTable::from_histogram(&sample_histogram(), 100);
        assert_eq!(table.first_index_at_or_above(101), None);
    }

    #[test]
    fn percentages_recover_cumulative_counts_within_rounding() {
        let histogram = Histogram::from_counts(vec![1234, 877, 3021, 95, 4, 0, 1]);
        let elapsed = histogram.total();
        let cumulative = histogram.cumulative();
        let table = PercentileTable::from_histogram(&histogram, elapsed);
        let tolerance = elapsed as f64 / 200.0;

        for (count, percentage) in cumulative.iter().zip(table.percentages()) {
            let recovered = (*percentage as f64 * elapsed as f64 / 100.0).round();
            assert!(
                (recovered - *count as f64).abs() <= tolerance + 1.0,
                "{count} recovered as {recovered}"
            );
        }
    }

    #[test]
    fn rows_pair_occupancy_and_queue_levels() {
        let occupancy = PercentileTable::from_histogram(&sample_histogram(), 100);
        let queue = PercentileTable::from_histogram(&Histogram::from_counts(vec![100]), 100);

        let rows = percentile_rows(&[50, 90], &occupancy, &queue);

        assert_eq!(
            rows,
            vec![
                PercentileRow {
                    percentile: 50,
                    occupancy: Some(0),
                    queue: Some(0),
                },
                PercentileRow {
                    percentile: 90,
                    occupancy: Some(3),
                    queue: Some(0),
                },
            ]
        );
    }

    #[test]
    fn bound_scales_with_long_service_times() {
        assert_eq!(histogram_bound(100, 100), 200);
        assert_eq!(histogram_bound(100, 1200), 400);
    }
}
