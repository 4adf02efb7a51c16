//! Upload run summary and reporting

use crate::domain::{EntryStatus, Ledger};
use std::time::Duration;

/// How an upload run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every queued file was attempted
    Finished,
    /// Cancellation was observed before the queue drained
    Cancelled,
    /// The ledger has no organization file; nothing was uploaded
    OrganizationMissing,
    /// The organization file could not be uploaded; nothing else was attempted
    OrganizationFailed,
}

/// Summary of an upload run
#[derive(Debug, Clone)]
pub struct UploadSummary {
    /// How the run ended
    pub outcome: RunOutcome,

    /// Entries in the ledger when the run ended
    pub total_entries: usize,

    /// Entries with status `Completed`
    pub completed: usize,

    /// Entries with status `Failed`
    pub failed: usize,

    /// Entries with status `Ongoing`
    pub ongoing: usize,

    /// Entries with status `NotStarted`
    pub not_started: usize,

    /// Files a worker or the organization phase picked up in this run
    pub attempted: usize,

    /// Duration of the run
    pub duration: Duration,
}

impl UploadSummary {
    /// Build a summary from the ledger state at the end of a run
    pub fn from_ledger(outcome: RunOutcome, ledger: &Ledger, attempted: usize) -> Self {
        Self {
            outcome,
            total_entries: ledger.len(),
            completed: ledger.count_with_status(EntryStatus::Completed),
            failed: ledger.count_with_status(EntryStatus::Failed),
            ongoing: ledger.count_with_status(EntryStatus::Ongoing),
            not_started: ledger.count_with_status(EntryStatus::NotStarted),
            attempted,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check if every entry of the folder is uploaded
    pub fn is_successful(&self) -> bool {
        self.outcome == RunOutcome::Finished && self.completed == self.total_entries
    }

    /// Log the summary
    pub fn log_summary(&self) {
        crate::log_upload_complete!(self.completed, self.failed, self.duration);
        tracing::info!(
            outcome = ?self.outcome,
            total_entries = self.total_entries,
            completed = self.completed,
            failed = self.failed,
            ongoing = self.ongoing,
            not_started = self.not_started,
            attempted = self.attempted,
            duration_secs = self.duration.as_secs(),
            "Upload summary"
        );

        match self.outcome {
            RunOutcome::OrganizationMissing => {
                tracing::warn!("No organization file in the working folder, nothing was uploaded")
            }
            RunOutcome::OrganizationFailed => {
                tracing::warn!("Organization file upload failed, remaining files were left untouched")
            }
            RunOutcome::Cancelled => tracing::warn!("Upload run was cancelled"),
            RunOutcome::Finished if self.failed > 0 => {
                tracing::warn!(failed = self.failed, "Upload finished with failed files")
            }
            RunOutcome::Finished => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LedgerEntry;

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add_entry(LedgerEntry::new("ExportData.dat"));
        ledger.add_entry(LedgerEntry::new("Patients/a.pat"));
        ledger
    }

    #[test]
    fn test_counts_from_ledger() {
        let summary = UploadSummary::from_ledger(RunOutcome::Finished, &ledger(), 2)
            .with_duration(Duration::from_secs(3));

        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.not_started, 2);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.duration, Duration::from_secs(3));
        assert!(!summary.is_successful());
    }

    #[test]
    fn test_empty_finished_run_is_successful() {
        let summary = UploadSummary::from_ledger(RunOutcome::Finished, &Ledger::new(), 0);
        assert!(summary.is_successful());

        let summary = UploadSummary::from_ledger(RunOutcome::Cancelled, &Ledger::new(), 0);
        assert!(!summary.is_successful());
    }
}
