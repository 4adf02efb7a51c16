//! Upload scheduler - orchestrates one upload run over the ledger
//!
//! The organization file is uploaded first, on the scheduler's own task. Only
//! once it is completed are the remaining entries queued and handed to a
//! fixed pool of workers.

use super::progress::ProgressReporter;
use super::queue::UploadQueue;
use super::summary::{RunOutcome, UploadSummary};
use crate::adapters::tus::{ResumableTransferClient, DEFAULT_CHUNK_SIZE};
use crate::config::UploadConfig;
use crate::core::ledger::LedgerStore;
use crate::domain::{EntryStatus, LedgerEntry, Result, SessionId, WorkerId};
use crate::{log_error_with_context, log_upload_start};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Content type sent with every created upload
const CONTENT_TYPE: &str = "application/octet-stream";

/// Settings for one scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Address new uploads are created at
    pub upload_api: String,
    /// Number of concurrent workers
    pub upload_threads: usize,
    /// PATCH body size in bytes
    pub chunk_size: usize,
}

impl SchedulerConfig {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            upload_api: config.upload_api.clone(),
            upload_threads: config.upload_threads,
            chunk_size: config.chunk_size_bytes(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            upload_api: String::new(),
            upload_threads: 4,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// State shared by the organization phase and every worker
struct UploadContext {
    store: Arc<LedgerStore>,
    client: Arc<dyn ResumableTransferClient>,
    config: SchedulerConfig,
    progress: ProgressReporter,
    shutdown: watch::Receiver<bool>,
    attempted: AtomicUsize,
}

impl UploadContext {
    fn is_cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Upload scheduler
///
/// # Example
///
/// ```no_run
/// use sfm_importer::adapters::tus::TusClient;
/// use sfm_importer::config::UploadConfig;
/// use sfm_importer::core::ledger::{LedgerReconciler, LedgerStore};
/// use sfm_importer::core::upload::{ProgressReporter, SchedulerConfig, UploadScheduler};
/// use std::sync::Arc;
///
/// # async fn example() -> sfm_importer::domain::Result<()> {
/// let config = UploadConfig::default();
/// let store = Arc::new(LedgerStore::new());
/// LedgerReconciler::new(store.clone()).open("/data/export").await?;
///
/// let client = Arc::new(TusClient::new(&config)?);
/// let scheduler = UploadScheduler::new(store, client, SchedulerConfig::from_config(&config));
///
/// let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
/// let summary = scheduler.run(shutdown_rx, ProgressReporter::disabled()).await?;
/// println!("Completed: {}", summary.completed);
/// # Ok(())
/// # }
/// ```
pub struct UploadScheduler {
    store: Arc<LedgerStore>,
    client: Arc<dyn ResumableTransferClient>,
    config: SchedulerConfig,
}

impl UploadScheduler {
    pub fn new(
        store: Arc<LedgerStore>,
        client: Arc<dyn ResumableTransferClient>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Upload every entry of the loaded ledger that is not yet completed
    ///
    /// Individual file failures are recorded in the ledger and never abort
    /// the run. Setting the shutdown flag stops workers from taking new
    /// files; uploads already in flight finish.
    ///
    /// # Errors
    ///
    /// Returns an error only when no ledger is loaded.
    pub async fn run(
        &self,
        shutdown: watch::Receiver<bool>,
        progress: ProgressReporter,
    ) -> Result<UploadSummary> {
        let start_time = Instant::now();
        progress.report_run_started();
        tracing::info!(
            upload_api = %self.config.upload_api,
            upload_threads = self.config.upload_threads,
            chunk_size = self.config.chunk_size,
            "Upload scheduler started"
        );

        let ledger = self.store.snapshot().await?;
        let Some(organization) = ledger.organization_entry().cloned() else {
            tracing::warn!("Could not find organization file, nothing to upload");
            return Ok(
                UploadSummary::from_ledger(RunOutcome::OrganizationMissing, &ledger, 0)
                    .with_duration(start_time.elapsed()),
            );
        };

        let ctx = Arc::new(UploadContext {
            store: self.store.clone(),
            client: self.client.clone(),
            config: self.config.clone(),
            progress,
            shutdown,
            attempted: AtomicUsize::new(0),
        });

        if !organization.is_completed() {
            if ctx.is_cancelled() {
                return self.finish(&ctx, RunOutcome::Cancelled, start_time).await;
            }

            ctx.attempted.fetch_add(1, Ordering::Relaxed);
            upload_file(&ctx, WorkerId::generate(), &organization).await;

            if ctx.is_cancelled() {
                tracing::info!("Cancelled after organization upload, terminating");
                return self.finish(&ctx, RunOutcome::Cancelled, start_time).await;
            }

            let organization = self.store.entry(organization.relative_path()).await?;
            if !organization.is_completed() {
                tracing::error!(
                    relative_path = %organization.relative_path(),
                    status = ?organization.status(),
                    "Organization file was not uploaded, remaining files are left untouched"
                );
                return self
                    .finish(&ctx, RunOutcome::OrganizationFailed, start_time)
                    .await;
            }
        }

        let queue: Arc<UploadQueue> = Arc::new(
            self.store
                .snapshot()
                .await?
                .pending_entries()
                .cloned()
                .collect(),
        );
        let queued = queue.len().await;
        tracing::info!(queued = queued, "Queued files for upload");

        let workers: Vec<_> = (0..ctx.config.upload_threads.max(1))
            .map(|_| {
                let ctx = ctx.clone();
                let queue = queue.clone();
                tokio::spawn(async move { run_worker(ctx, queue).await })
            })
            .collect();

        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Upload worker terminated abnormally");
            }
        }

        let outcome = if ctx.is_cancelled() {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Finished
        };
        self.finish(&ctx, outcome, start_time).await
    }

    /// Emit the terminal event and build the summary
    async fn finish(
        &self,
        ctx: &UploadContext,
        outcome: RunOutcome,
        start_time: Instant,
    ) -> Result<UploadSummary> {
        match outcome {
            RunOutcome::Cancelled => {
                tracing::info!("Cancelled, scheduler closing");
                ctx.progress.report_cancelled();
            }
            RunOutcome::Finished | RunOutcome::OrganizationFailed => {
                tracing::info!("All work completed, scheduler closing");
                ctx.progress.report_finished();
            }
            RunOutcome::OrganizationMissing => {}
        }

        let ledger = self.store.snapshot().await?;
        Ok(UploadSummary::from_ledger(
            outcome,
            &ledger,
            ctx.attempted.load(Ordering::Relaxed),
        )
        .with_duration(start_time.elapsed()))
    }
}

/// Take entries from the queue until it is empty or the run is cancelled
async fn run_worker(ctx: Arc<UploadContext>, queue: Arc<UploadQueue>) {
    let worker_id = WorkerId::generate();
    tracing::debug!(worker_id = %worker_id, "Worker started");

    while let Some(entry) = queue.try_pop().await {
        if ctx.is_cancelled() {
            tracing::info!(worker_id = %worker_id, "Cancelled, worker terminating");
            return;
        }
        ctx.attempted.fetch_add(1, Ordering::Relaxed);
        upload_file(&ctx, worker_id, &entry).await;
    }

    tracing::debug!(worker_id = %worker_id, "No work left, worker terminating");
}

/// Upload one file; failures are recorded on the entry, never returned
async fn upload_file(ctx: &UploadContext, worker_id: WorkerId, entry: &LedgerEntry) {
    if ctx.is_cancelled() {
        return;
    }

    let relative_path = entry.relative_path();
    log_upload_start!(worker_id, relative_path);

    if let Err(e) = transfer(ctx, worker_id, entry).await {
        tracing::error!(
            worker_id = %worker_id,
            relative_path = %relative_path,
            error = %e,
            "Upload failed"
        );
        if let Err(e) = ctx.store.set_status(relative_path, EntryStatus::Failed).await {
            log_error_with_context!(e, "Failed to record upload failure in ledger");
        }
        ctx.progress
            .report_file_status(relative_path, EntryStatus::Failed);
    }
}

async fn transfer(ctx: &UploadContext, worker_id: WorkerId, entry: &LedgerEntry) -> Result<()> {
    let relative_path = entry.relative_path();
    let file = ctx.store.file_to_import(relative_path).await?;

    let resume_token = match entry.resume_token() {
        Some(token) => token.to_string(),
        None => {
            let byte_length = tokio::fs::metadata(&file).await?.len();
            let metadata = upload_metadata(entry, ctx.store.session_id().await?);

            if ctx.is_cancelled() {
                return Ok(());
            }

            let token = ctx
                .client
                .create(&ctx.config.upload_api, byte_length, &metadata)
                .await?;
            tracing::info!(
                worker_id = %worker_id,
                relative_path = %relative_path,
                remote_url = %token,
                "Remote upload created"
            );
            ctx.store.set_resume_token(relative_path, &token).await?;
            ctx.progress
                .report_file_status(relative_path, EntryStatus::Ongoing);
            token
        }
    };

    if ctx.is_cancelled() {
        return Ok(());
    }

    ctx.client
        .upload(&resume_token, &file, ctx.config.chunk_size)
        .await?;
    ctx.store
        .set_status(relative_path, EntryStatus::Completed)
        .await?;
    ctx.progress
        .report_file_status(relative_path, EntryStatus::Completed);

    tracing::info!(
        worker_id = %worker_id,
        relative_path = %relative_path,
        remote_url = %resume_token,
        "File uploaded"
    );
    Ok(())
}

/// Metadata sent when creating a remote upload
fn upload_metadata(entry: &LedgerEntry, session_id: SessionId) -> Vec<(String, String)> {
    vec![
        ("name".to_string(), entry.file_name().to_string()),
        ("contentType".to_string(), CONTENT_TYPE.to_string()),
        ("FileType".to_string(), entry.kind().metadata_name().to_string()),
        ("SessionId".to_string(), session_id.to_string()),
    ]
}
