//! Run report with graceful degradation
//!
//! Collects per-state outcomes for the console summary and the persisted
//! `report.json`. A failed state never aborts the run; it shows up here.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::state::StateSummary;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Every state processed
    Success,
    /// Some states processed, some failed or were skipped
    PartialSuccess,
    /// No state processed
    Failed,
}

/// One failed state with its reason
#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    pub state: String,
    pub message: String,
}

/// Complete run report
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Snapshot date label of the run
    pub date: String,
    pub duration_secs: f64,
    pub status: RunStatus,
    pub states_processed: usize,
    pub states_failed: usize,
    pub by_state: Vec<StateSummary>,
    pub errors: Vec<RunError>,
}

impl RunReport {
    pub fn new(date: &str) -> Self {
        Self {
            date: date.to_string(),
            duration_secs: 0.0,
            status: RunStatus::Success,
            states_processed: 0,
            states_failed: 0,
            by_state: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self, summary: StateSummary) {
        self.states_processed += 1;
        self.by_state.push(summary);
    }

    pub fn record_failure(&mut self, state: &str, message: &str) {
        self.states_failed += 1;
        self.errors.push(RunError {
            state: state.to_string(),
            message: message.to_string(),
        });
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Determines the final status from the recorded outcomes
    pub fn finalize(&mut self) {
        self.status = match (self.states_processed, self.states_failed) {
            (0, _) => RunStatus::Failed,
            (_, 0) => RunStatus::Success,
            _ => RunStatus::PartialSuccess,
        };
    }

    /// Prints the report to the console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("ABGLEICH REPORT - {}", self.date);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "States: {} processed, {} failed",
            self.states_processed, self.states_failed
        );

        if !self.by_state.is_empty() {
            println!("\n--- BY STATE ---");
            for s in &self.by_state {
                println!(
                    "  {}: {} addresses, {} missing, {:.2}% coverage, {} corrections, {} districts ({:.2}s)",
                    s.state, s.total, s.missing, s.coverage, s.corrections, s.districts, s.duration_secs
                );
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in &self.errors {
                println!("  [{}] {}", e.state, e.message);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Saves the report as JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: &str) -> StateSummary {
        StateSummary {
            state: state.to_string(),
            total: 10,
            osm_total: 9,
            missing: 1,
            coverage: 90.0,
            corrections: 0,
            districts: 2,
            duration_secs: 0.1,
        }
    }

    #[test]
    fn test_finalize_success() {
        let mut report = RunReport::new("2026-08-01");
        report.record_success(summary("nds"));
        report.finalize();
        assert_eq!(report.status, RunStatus::Success);
    }

    #[test]
    fn test_finalize_partial() {
        let mut report = RunReport::new("2026-08-01");
        report.record_success(summary("nds"));
        report.record_failure("nrw", "missing input");
        report.finalize();
        assert_eq!(report.status, RunStatus::PartialSuccess);
        assert_eq!(report.states_failed, 1);
    }

    #[test]
    fn test_finalize_failed() {
        let mut report = RunReport::new("2026-08-01");
        report.record_failure("nds", "missing input");
        report.finalize();
        assert_eq!(report.status, RunStatus::Failed);
    }
}
