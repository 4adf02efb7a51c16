//! Status command implementation
//!
//! Reconciles a working folder and prints its ledger.

use super::{exit_code_for, resolve_folder, EXIT_CONFIG_ERROR};
use crate::config::load_config;
use crate::core::ledger::{LedgerReconciler, LedgerStore};
use crate::domain::{EntryStatus, Ledger};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Working folder; defaults to upload.folder from the configuration
    pub folder: Option<PathBuf>,

    /// Only list entries that are not completed
    #[arg(long)]
    pub pending: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking upload status");

        let config_folder = if self.folder.is_none() {
            match load_config(config_path) {
                Ok(c) => c.upload.folder,
                Err(e) => {
                    println!("❌ Failed to load configuration file");
                    println!("   Error: {e}");
                    return Ok(EXIT_CONFIG_ERROR);
                }
            }
        } else {
            None
        };

        let Some(folder) = resolve_folder(self.folder.as_deref(), config_folder.as_deref()) else {
            println!("❌ No working folder given. Pass FOLDER or set upload.folder");
            return Ok(EXIT_CONFIG_ERROR);
        };

        let store = Arc::new(LedgerStore::new());
        if let Err(e) = LedgerReconciler::new(store.clone()).open(&folder).await {
            println!("❌ Failed to open {}", folder.display());
            println!("   Error: {e}");
            return Ok(exit_code_for(&e));
        }

        let ledger = store.snapshot().await?;

        println!("📊 Upload Status: {}", folder.display());
        println!("  Session: {}", ledger.session_id());
        println!();

        if ledger.is_empty() {
            println!("No export files found in this folder.");
            return Ok(0);
        }

        print!("{}", render_table(&ledger, self.pending));
        println!();
        println!(
            "  {} files: {} {}, {} {}, {} {}, {} {}",
            ledger.len(),
            ledger.count_with_status(EntryStatus::Completed),
            EntryStatus::Completed.display_name(),
            ledger.count_with_status(EntryStatus::Ongoing),
            EntryStatus::Ongoing.display_name(),
            ledger.count_with_status(EntryStatus::Failed),
            EntryStatus::Failed.display_name(),
            ledger.count_with_status(EntryStatus::NotStarted),
            EntryStatus::NotStarted.display_name(),
        );

        Ok(0)
    }
}

/// One line per entry: file, kind label, status label, last change
fn render_table(ledger: &Ledger, pending_only: bool) -> String {
    let mut out = format!(
        "  {:<40} {:<16} {:<20} {}\n",
        "File", "Type", "Status", "Modified"
    );
    for entry in ledger.entries() {
        if pending_only && entry.is_completed() {
            continue;
        }
        out.push_str(&format!(
            "  {:<40} {:<16} {:<20} {}\n",
            entry.relative_path(),
            entry.kind().display_name(),
            entry.status().display_name(),
            entry.modified_at().format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}
