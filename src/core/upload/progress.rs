//! Progress reporting for upload runs
//!
//! Events are pushed onto an unbounded channel so workers never wait on the
//! consumer. A closed receiver is not an error.

use crate::domain::EntryStatus;
use tokio::sync::mpsc::UnboundedSender;

/// Event emitted while an upload run progresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The run has begun
    RunStarted,
    /// An entry changed status or received its resume token
    FileStatusChanged {
        relative_path: String,
        status: EntryStatus,
    },
    /// All work finished or the organization file could not be uploaded
    Finished,
    /// The run stopped early after cancellation
    Cancelled,
}

/// Sender half handed to the scheduler
#[derive(Clone)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A reporter that drops every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn report_run_started(&self) {
        self.send(ProgressEvent::RunStarted);
    }

    pub fn report_file_status(&self, relative_path: &str, status: EntryStatus) {
        self.send(ProgressEvent::FileStatusChanged {
            relative_path: relative_path.to_string(),
            status,
        });
    }

    pub fn report_finished(&self) {
        self.send(ProgressEvent::Finished);
    }

    pub fn report_cancelled(&self) {
        self.send(ProgressEvent::Cancelled);
    }

    fn send(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
