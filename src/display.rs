//! Plain-text rendering of a [`SimulationReport`].

use crate::report::SimulationReport;
use crate::simulation::Termination;
use crate::simulation::occupancy::OverflowPolicy;
use std::fmt::Write;

pub fn render_text(report: &SimulationReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &SimulationReport) -> std::fmt::Result {
    writeln!(out, "Model completed in {} ms", report.compute_time_ms)?;
    match report.termination {
        Termination::Stable { at_hour } => {
            writeln!(out, "Stable solution found after {at_hour} hours of survey data")?
        }
        Termination::Capped { at_hour } => writeln!(
            out,
            "Stability not found; cap reached after {at_hour} hours of survey data"
        )?,
    }
    if let Some(seed) = report.seed {
        writeln!(out, "Seed = {seed}")?;
    }

    writeln!(
        out,
        "Random arrivals = {}/hour (requested {})",
        fixed(report.observed_arrivals_per_hour, 1),
        report.arrival_rate
    )?;
    writeln!(out, "Service time = {} seconds", report.service_time)?;
    writeln!(
        out,
        "Perfect arrivals demand = {} spaces (theoretical {:.2})",
        report
            .demand_spaces
            .map_or_else(|| "n/a".to_string(), |spaces| spaces.to_string()),
        report.theoretical_demand_spaces
    )?;

    match report.policy {
        OverflowPolicy::Queue => {
            writeln!(out, "Cars queued = {}%", fixed(report.queued_percent, 2))?;
            writeln!(
                out,
                "Average queue time per arrival = {} seconds",
                fixed(report.average_wait_per_arrival_secs, 1)
            )?;
            writeln!(
                out,
                "Average queue time per queued vehicle = {} seconds",
                fixed(report.average_wait_per_queued_secs, 1)
            )?;
        }
        OverflowPolicy::Block => {
            writeln!(out, "Cars blocked = {}%", fixed(report.blocked_percent, 2))?;
        }
    }

    writeln!(out, "Operating combined percentiles ({} spaces)", report.spaces)?;
    for row in &report.percentiles {
        writeln!(
            out,
            "{:>3}th percentile: {} parked and {} queued",
            row.percentile,
            level(row.occupancy),
            level(row.queue)
        )?;
    }
    Ok(())
}

fn fixed(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "n/a".to_string(),
    }
}

fn level(value: Option<usize>) -> String {
    match value {
        Some(level) => level.to_string(),
        None => "unbounded".to_string(),
    }
}
