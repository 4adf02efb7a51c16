//! Integration tests for the upload scheduler
//!
//! A recording transfer client stands in for the import API so ordering,
//! cancellation and resume behaviour can be checked against the ledger.

use async_trait::async_trait;
use sfm_importer::adapters::tus::ResumableTransferClient;
use sfm_importer::core::ledger::{LedgerReconciler, LedgerStore};
use sfm_importer::core::upload::{
    ProgressEvent, ProgressReporter, RunOutcome, SchedulerConfig, UploadScheduler, UploadSummary,
};
use sfm_importer::domain::{EntryStatus, Result, TransferError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

const REMOTE_BASE: &str = "http://sfm.test/files/";

#[derive(Default)]
struct RecordingClient {
    /// File names passed in `name` metadata, in call order
    created: Mutex<Vec<String>>,
    /// Resume tokens passed to upload, in call order
    uploaded: Mutex<Vec<String>>,
    /// File names whose upload fails
    failing: HashSet<String>,
    /// File name whose upload raises the shutdown flag
    cancel_on: Option<(String, watch::Sender<bool>)>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Resume tokens whose upload is running right now
    active: Mutex<HashSet<String>>,
    /// Set when an upload starts for a token that is already being uploaded
    overlapped: AtomicBool,
}

impl RecordingClient {
    fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    fn cancelling_on(name: &str, shutdown: watch::Sender<bool>) -> Self {
        Self {
            cancel_on: Some((name.to_string(), shutdown)),
            ..Self::default()
        }
    }

    fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumableTransferClient for RecordingClient {
    async fn create(
        &self,
        _address: &str,
        _byte_length: u64,
        metadata: &[(String, String)],
    ) -> Result<String> {
        let name = metadata
            .iter()
            .find(|(key, _)| key == "name")
            .map(|(_, value)| value.clone())
            .unwrap();
        self.created.lock().unwrap().push(name.clone());
        Ok(format!("{REMOTE_BASE}{name}"))
    }

    async fn upload(&self, resume_token: &str, _file: &Path, _chunk_size: usize) -> Result<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.uploaded.lock().unwrap().push(resume_token.to_string());
        if !self.active.lock().unwrap().insert(resume_token.to_string()) {
            self.overlapped.store(true, Ordering::SeqCst);
        }

        let name = resume_token.rsplit('/').next().unwrap_or_default().to_string();
        if let Some((cancel_name, shutdown)) = &self.cancel_on {
            if *cancel_name == name {
                shutdown.send(true).unwrap();
            }
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        self.active.lock().unwrap().remove(resume_token);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&name) {
            return Err(TransferError::UploadFailed {
                status: 500,
                message: format!("{name} rejected"),
            }
            .into());
        }
        Ok(())
    }
}

fn create_export_folder(with_organization: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    if with_organization {
        std::fs::write(dir.path().join("ExportData.dat"), b"organization").unwrap();
    }
    std::fs::create_dir(dir.path().join("Patients")).unwrap();
    std::fs::create_dir(dir.path().join("Reports")).unwrap();
    std::fs::write(dir.path().join("Patients/0001.pat"), b"patient one").unwrap();
    std::fs::write(dir.path().join("Patients/0002.pat"), b"patient two").unwrap();
    std::fs::write(dir.path().join("Reports/0001.rpt"), b"report one").unwrap();
    dir
}

async fn open_store(folder: &Path) -> Arc<LedgerStore> {
    let store = Arc::new(LedgerStore::new());
    LedgerReconciler::new(store.clone())
        .open(folder)
        .await
        .unwrap();
    store
}

async fn run_scheduler(
    store: Arc<LedgerStore>,
    client: Arc<RecordingClient>,
    upload_threads: usize,
    shutdown: watch::Receiver<bool>,
) -> (UploadSummary, Vec<ProgressEvent>) {
    let config = SchedulerConfig {
        upload_api: REMOTE_BASE.to_string(),
        upload_threads,
        ..SchedulerConfig::default()
    };
    let scheduler = UploadScheduler::new(store, client, config);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let summary = scheduler
        .run(shutdown, ProgressReporter::new(tx))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (summary, events)
}

fn position(events: &[ProgressEvent], path: &str, status: EntryStatus) -> Option<usize> {
    events.iter().position(|e| {
        matches!(e, ProgressEvent::FileStatusChanged { relative_path, status: s }
            if relative_path == path && *s == status)
    })
}

fn count(events: &[ProgressEvent], wanted: &ProgressEvent) -> usize {
    events.iter().filter(|e| *e == wanted).count()
}

#[tokio::test]
async fn test_uploads_every_file_organization_first() {
    let folder = create_export_folder(true);
    let store = open_store(folder.path()).await;
    let client = Arc::new(RecordingClient::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let (summary, events) = run_scheduler(store.clone(), client.clone(), 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::Finished);
    assert_eq!(summary.total_entries, 4);
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.attempted, 4);
    assert!(summary.is_successful());

    let created = client.created();
    assert_eq!(created.len(), 4);
    assert_eq!(created[0], "ExportData.dat");
    assert!(client.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert!(!client.overlapped.load(Ordering::SeqCst));

    // Each file is uploaded once, by exactly one worker
    let uploaded = client.uploaded();
    let distinct: HashSet<_> = uploaded.iter().collect();
    assert_eq!(uploaded.len(), 4);
    assert_eq!(distinct.len(), 4);

    assert_eq!(events.first(), Some(&ProgressEvent::RunStarted));
    assert_eq!(events.last(), Some(&ProgressEvent::Finished));
    assert_eq!(count(&events, &ProgressEvent::Finished), 1);
    assert_eq!(count(&events, &ProgressEvent::Cancelled), 0);

    let organization_done = position(&events, "ExportData.dat", EntryStatus::Completed).unwrap();
    for path in ["Patients/0001.pat", "Patients/0002.pat", "Reports/0001.rpt"] {
        let started = position(&events, path, EntryStatus::Ongoing).unwrap();
        assert!(organization_done < started, "{path} started before organization file");
    }

    // Reload from disk: every status change was persisted
    let reloaded = open_store(folder.path()).await;
    let ledger = reloaded.snapshot().await.unwrap();
    assert_eq!(ledger.count_with_status(EntryStatus::Completed), 4);
    for entry in ledger.entries() {
        assert_eq!(
            entry.resume_token(),
            Some(format!("{REMOTE_BASE}{}", entry.file_name()).as_str())
        );
    }
}

#[tokio::test]
async fn test_missing_organization_file_uploads_nothing() {
    let folder = create_export_folder(false);
    let store = open_store(folder.path()).await;
    let before = store.snapshot().await.unwrap();
    let client = Arc::new(RecordingClient::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let (summary, events) = run_scheduler(store.clone(), client.clone(), 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::OrganizationMissing);
    assert_eq!(summary.attempted, 0);
    assert_eq!(summary.not_started, 3);
    assert!(client.created().is_empty());
    assert!(client.uploaded().is_empty());
    assert_eq!(store.snapshot().await.unwrap(), before);
    assert_eq!(events, vec![ProgressEvent::RunStarted]);
}

#[tokio::test]
async fn test_failed_organization_file_stops_run() {
    let folder = create_export_folder(true);
    let store = open_store(folder.path()).await;
    let client = Arc::new(RecordingClient::failing(&["ExportData.dat"]));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let (summary, events) = run_scheduler(store.clone(), client.clone(), 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::OrganizationFailed);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.not_started, 3);
    assert_eq!(client.created(), vec!["ExportData.dat".to_string()]);

    let ledger = store.snapshot().await.unwrap();
    assert_eq!(
        ledger.entry("ExportData.dat").unwrap().status(),
        EntryStatus::Failed
    );
    for path in ["Patients/0001.pat", "Patients/0002.pat", "Reports/0001.rpt"] {
        assert_eq!(ledger.entry(path).unwrap().status(), EntryStatus::NotStarted);
    }

    assert!(position(&events, "ExportData.dat", EntryStatus::Failed).is_some());
    assert_eq!(count(&events, &ProgressEvent::Finished), 1);
    assert_eq!(events.last(), Some(&ProgressEvent::Finished));
}

#[tokio::test]
async fn test_cancellation_lets_in_flight_upload_finish() {
    let folder = create_export_folder(true);
    let store = open_store(folder.path()).await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let client = Arc::new(RecordingClient::cancelling_on("0001.pat", shutdown_tx));

    let (summary, events) = run_scheduler(store.clone(), client.clone(), 1, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert!(!summary.is_successful());

    let ledger = store.snapshot().await.unwrap();
    assert!(ledger.entry("ExportData.dat").unwrap().is_completed());
    assert!(ledger.entry("Patients/0001.pat").unwrap().is_completed());
    assert_eq!(
        ledger.entry("Patients/0002.pat").unwrap().status(),
        EntryStatus::NotStarted
    );
    assert_eq!(
        ledger.entry("Reports/0001.rpt").unwrap().status(),
        EntryStatus::NotStarted
    );

    assert_eq!(events.last(), Some(&ProgressEvent::Cancelled));
    assert_eq!(count(&events, &ProgressEvent::Cancelled), 1);
    assert_eq!(count(&events, &ProgressEvent::Finished), 0);
}

#[tokio::test]
async fn test_cancelled_before_start_touches_nothing() {
    let folder = create_export_folder(true);
    let store = open_store(folder.path()).await;
    let before = store.snapshot().await.unwrap();
    let client = Arc::new(RecordingClient::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let (summary, events) = run_scheduler(store.clone(), client.clone(), 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert_eq!(summary.attempted, 0);
    assert!(client.created().is_empty());
    assert_eq!(store.snapshot().await.unwrap(), before);
    assert_eq!(
        events,
        vec![ProgressEvent::RunStarted, ProgressEvent::Cancelled]
    );
}

#[tokio::test]
async fn test_restart_resumes_with_recorded_token() {
    let folder = create_export_folder(true);
    let existing = "http://sfm.test/files/existing-upload";
    {
        let store = open_store(folder.path()).await;
        store
            .set_resume_token("Patients/0001.pat", existing)
            .await
            .unwrap();
    }

    // A new process: load the ledger from disk again
    let store = open_store(folder.path()).await;
    assert_eq!(
        store
            .entry("Patients/0001.pat")
            .await
            .unwrap()
            .status(),
        EntryStatus::Ongoing
    );

    let client = Arc::new(RecordingClient::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (summary, _) = run_scheduler(store.clone(), client.clone(), 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::Finished);
    assert_eq!(summary.completed, 4);
    assert!(!client.created().contains(&"0001.pat".to_string()));
    assert!(client.uploaded().contains(&existing.to_string()));

    let entry = store.entry("Patients/0001.pat").await.unwrap();
    assert!(entry.is_completed());
    assert_eq!(entry.resume_token(), Some(existing));
}

#[tokio::test]
async fn test_failed_file_is_retried_on_next_run() {
    let folder = create_export_folder(true);

    let store = open_store(folder.path()).await;
    let client = Arc::new(RecordingClient::failing(&["0002.pat"]));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (summary, _) = run_scheduler(store, client, 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::Finished);
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_successful());

    let store = open_store(folder.path()).await;
    let client = Arc::new(RecordingClient::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let (summary, _) = run_scheduler(store.clone(), client.clone(), 2, shutdown_rx).await;

    assert_eq!(summary.outcome, RunOutcome::Finished);
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.attempted, 1);
    // The remote upload created on the first run is reused
    assert!(client.created().is_empty());
    assert_eq!(
        client.uploaded(),
        vec![format!("{REMOTE_BASE}0002.pat")]
    );
}
