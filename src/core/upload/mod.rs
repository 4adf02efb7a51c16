//! Upload orchestration
//!
//! - [`UploadScheduler`] - runs one upload pass over the ledger
//! - [`UploadQueue`] - FIFO shared by the workers
//! - [`ProgressReporter`] / [`ProgressEvent`] - progress sink for front-ends
//! - [`UploadSummary`] / [`RunOutcome`] - result of a run

pub mod progress;
pub mod queue;
pub mod scheduler;
pub mod summary;

pub use progress::{ProgressEvent, ProgressReporter};
pub use queue::UploadQueue;
pub use scheduler::{SchedulerConfig, UploadScheduler};
pub use summary::{RunOutcome, UploadSummary};
