use crate::report::SimulationReport;
use crate::simulation::SimulationSettings;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    pub report: SimulationReport,
    pub finished_at: SystemTime,
}

/// Shared state behind the HTTP API.
#[derive(Debug)]
pub struct AppState {
    settings: SimulationSettings,
    latest: Option<CompletedRun>,
    runs_completed: u64,
}

impl AppState {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            latest: None,
            runs_completed: 0,
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn latest(&self) -> Option<&CompletedRun> {
        self.latest.as_ref()
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed
    }

    pub fn record_run(&mut self, report: SimulationReport, finished_at: SystemTime) {
        self.latest = Some(CompletedRun {
            report,
            finished_at,
        });
        self.runs_completed += 1;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SimulationSettings::default())
    }
}
