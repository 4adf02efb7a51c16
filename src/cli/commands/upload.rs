//! Upload command implementation
//!
//! Opens a working folder, reconciles its ledger and uploads everything that
//! is not yet completed.

use super::{exit_code_for, resolve_folder, EXIT_CONFIG_ERROR, EXIT_FATAL};
use crate::adapters::tus::TusClient;
use crate::config::{load_config, secret_string};
use crate::core::ledger::{LedgerReconciler, LedgerStore};
use crate::core::upload::{
    ProgressEvent, ProgressReporter, RunOutcome, SchedulerConfig, UploadScheduler, UploadSummary,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Working folder containing ExportData.dat, Patients/ and Reports/
    pub folder: Option<PathBuf>,

    /// Bearer token for the upload API
    #[arg(long, env = "SFM_IMPORTER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Number of concurrent upload workers
    #[arg(long)]
    pub threads: Option<usize>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl UploadArgs {
    /// Execute the upload command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting upload command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        if let Some(token) = &self.token {
            tracing::info!("Using upload token from command line");
            config.upload.token = Some(secret_string(token.clone()));
        }
        if let Some(threads) = self.threads {
            tracing::info!(threads = threads, "Overriding upload threads from CLI");
            config.upload.upload_threads = threads;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }
        if config.upload.token.is_none() {
            eprintln!("❌ No upload token. Set upload.token, SFM_IMPORTER_TOKEN or --token");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let Some(folder) = resolve_folder(self.folder.as_deref(), config.upload.folder.as_deref())
        else {
            eprintln!("❌ No working folder given. Pass FOLDER or set upload.folder");
            return Ok(EXIT_CONFIG_ERROR);
        };

        let store = Arc::new(LedgerStore::new());
        let report = match LedgerReconciler::new(store.clone()).open(&folder).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, folder = %folder.display(), "Failed to open working folder");
                eprintln!("❌ Failed to open {}: {e}", folder.display());
                return Ok(exit_code_for(&e));
            }
        };

        let ledger = store.snapshot().await?;
        println!("Working folder: {}", folder.display());
        println!("  Session: {}", ledger.session_id());
        println!("  Files in ledger: {}", ledger.len());
        println!("  New files found: {}", report.entries_added);
        println!("  Waiting for upload: {}", ledger.pending_entries().count());
        println!("  Upload API: {}", config.upload.upload_api);
        println!("  Workers: {}", config.upload.upload_threads);
        println!();

        if !self.yes {
            print!("Proceed with upload? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Upload cancelled.");
                return Ok(0);
            }
        }

        let client = match TusClient::new(&config.upload) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                eprintln!("❌ Failed to create upload client: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let scheduler = UploadScheduler::new(
            store.clone(),
            client,
            SchedulerConfig::from_config(&config.upload),
        );

        let (progress, monitor) = spawn_progress_monitor();
        println!("🚀 Starting upload...");
        let result = scheduler.run(shutdown_signal, progress).await;
        // The scheduler has dropped its reporter; the monitor drains and exits.
        let _ = monitor.await;

        let summary = match result {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Upload failed");
                eprintln!("Upload failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };
        summary.log_summary();
        print_summary(&summary);

        Ok(exit_code(&summary))
    }
}

/// Print progress events as they arrive
fn spawn_progress_monitor() -> (ProgressReporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let reporter = ProgressReporter::new(tx);
    let join = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ProgressEvent::RunStarted => {}
                ProgressEvent::FileStatusChanged {
                    relative_path,
                    status,
                } => println!("  {:<20} {}", status.display_name(), relative_path),
                ProgressEvent::Finished => println!("Upload run finished."),
                ProgressEvent::Cancelled => {
                    println!("⚠️  Upload cancelled. Run the same command to resume.")
                }
            }
        }
    });
    (reporter, join)
}

fn print_summary(summary: &UploadSummary) {
    println!();
    println!("📊 Upload Summary:");
    println!("  Files in ledger: {}", summary.total_entries);
    println!("  Completed: {}", summary.completed);
    println!("  Failed: {}", summary.failed);
    println!("  Ongoing: {}", summary.ongoing);
    println!("  Not started: {}", summary.not_started);
    println!("  Attempted this run: {}", summary.attempted);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    match summary.outcome {
        RunOutcome::OrganizationMissing => {
            println!("⚠️  No ExportData.dat in the working folder, nothing was uploaded")
        }
        RunOutcome::OrganizationFailed => {
            println!("⚠️  ExportData.dat could not be uploaded, other files were not attempted")
        }
        RunOutcome::Cancelled => println!("⚠️  Upload interrupted. Progress is saved in the ledger."),
        RunOutcome::Finished if summary.is_successful() => {
            println!("✅ All files uploaded successfully!")
        }
        RunOutcome::Finished => println!("⚠️  Upload completed with failures"),
    }
}

/// Map a run summary to the process exit code
fn exit_code(summary: &UploadSummary) -> i32 {
    match summary.outcome {
        RunOutcome::Cancelled => 130,
        RunOutcome::OrganizationMissing | RunOutcome::OrganizationFailed => 1,
        RunOutcome::Finished if summary.failed > 0 => 1,
        RunOutcome::Finished => 0,
    }
}
