//! Ledger reconciliation
//!
//! Scans a working folder and adds every exported file the ledger does not
//! know yet. Running it twice on an unchanged folder changes nothing.

use super::store::LedgerStore;
use crate::domain::ledger::has_valid_extension;
use crate::domain::{ImporterError, LedgerEntry, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Regular files found under the folder
    pub files_scanned: usize,
    /// Files with an accepted extension
    pub files_accepted: usize,
    /// Entries appended to the ledger
    pub entries_added: usize,
}

/// Brings the ledger in line with the files on disk
pub struct LedgerReconciler {
    store: Arc<LedgerStore>,
}

impl LedgerReconciler {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Select `folder`: load or create its ledger, then reconcile
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `folder` is not an existing directory,
    /// and propagates ledger load and write errors.
    pub async fn open(&self, folder: impl AsRef<Path>) -> Result<ReconcileReport> {
        let folder = folder.as_ref();
        let metadata = tokio::fs::metadata(folder).await.map_err(|e| {
            ImporterError::Configuration(format!(
                "Working folder {} is not accessible: {e}",
                folder.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Err(ImporterError::Configuration(format!(
                "Working folder {} is not a directory",
                folder.display()
            )));
        }

        self.store.initialize(folder).await?;
        self.reconcile().await
    }

    /// Add every accepted file under the loaded folder that has no entry yet
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let folder = self.store.folder().await?;

        let scan_root = folder.clone();
        let (files_scanned, accepted) = tokio::task::spawn_blocking(move || scan_folder(&scan_root))
            .await
            .map_err(|e| ImporterError::Other(format!("Folder scan task failed: {e}")))??;

        let files_accepted = accepted.len();
        let entries = accepted.into_iter().map(LedgerEntry::new).collect();
        let entries_added = self.store.add_entries(entries).await?;

        let report = ReconcileReport {
            files_scanned,
            files_accepted,
            entries_added,
        };

        tracing::info!(
            folder = %folder.display(),
            files_scanned = report.files_scanned,
            files_accepted = report.files_accepted,
            entries_added = report.entries_added,
            "Ledger reconciled"
        );

        Ok(report)
    }
}

/// Walk `root` and return the number of files seen plus the relative paths
/// (with `/` separators) of those with an accepted extension
fn scan_folder(root: &Path) -> Result<(usize, Vec<String>)> {
    let mut scanned = 0;
    let mut accepted = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        scanned += 1;

        let path = entry.path();
        if !has_valid_extension(path) {
            tracing::trace!(path = %path.display(), "Skipping file with unrecognised extension");
            continue;
        }

        accepted.push(relative_path(root, path)?);
    }

    Ok((scanned, accepted))
}

fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative: PathBuf = path
        .strip_prefix(root)
        .map_err(|e| ImporterError::Io(format!("{} is outside {}: {e}", path.display(), root.display())))?
        .to_path_buf();

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
