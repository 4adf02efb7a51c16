//! Ledger store
//!
//! Holds the ledger of exactly one working folder. Every mutation is written
//! to disk before the call returns, and all writes go through one mutex so
//! the ledger file never has two writers.

use crate::domain::ledger::{path_components, LEDGER_FILENAME};
use crate::domain::{EntryStatus, ImporterError, Ledger, LedgerEntry, Result, SessionId};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Suffix of the temporary file written before replacing the ledger
const TEMP_SUFFIX: &str = ".tmp";

struct LoadedLedger {
    folder: PathBuf,
    ledger: Ledger,
}

impl LoadedLedger {
    fn ledger_path(&self) -> PathBuf {
        self.folder.join(LEDGER_FILENAME)
    }
}

/// Store for the ledger of the selected working folder
///
/// # Example
///
/// ```no_run
/// use sfm_importer::core::ledger::LedgerStore;
/// use sfm_importer::domain::EntryStatus;
///
/// # async fn example() -> sfm_importer::domain::Result<()> {
/// let store = LedgerStore::new();
/// store.initialize("/data/export").await?;
/// store.set_status("Patients/0001.pat", EntryStatus::Failed).await?;
/// # Ok(())
/// # }
/// ```
pub struct LedgerStore {
    inner: Mutex<Option<LoadedLedger>>,
}

impl LedgerStore {
    /// Create a store with no folder selected
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Load the ledger of `folder`, or start a fresh one with a new session
    ///
    /// Replaces any ledger loaded before. A fresh ledger is not written to
    /// disk until the first persist.
    ///
    /// # Errors
    ///
    /// Returns `CorruptLedger` if a ledger file exists but cannot be parsed;
    /// the file is left untouched.
    pub async fn initialize(&self, folder: impl AsRef<Path>) -> Result<()> {
        let folder = folder.as_ref().to_path_buf();
        let ledger_path = folder.join(LEDGER_FILENAME);

        let ledger = if tokio::fs::try_exists(&ledger_path).await? {
            let contents = tokio::fs::read_to_string(&ledger_path).await?;
            let ledger: Ledger =
                serde_json::from_str(&contents).map_err(|e| ImporterError::CorruptLedger {
                    path: ledger_path.clone(),
                    message: e.to_string(),
                })?;
            tracing::info!(
                path = %ledger_path.display(),
                entries = ledger.len(),
                session_id = %ledger.session_id(),
                "Loaded existing ledger"
            );
            ledger
        } else {
            let ledger = Ledger::new();
            tracing::info!(
                folder = %folder.display(),
                session_id = %ledger.session_id(),
                "Starting new ledger"
            );
            ledger
        };

        *self.inner.lock().await = Some(LoadedLedger { folder, ledger });
        Ok(())
    }

    /// Write the full ledger to the ledger file
    ///
    /// # Errors
    ///
    /// Returns `LedgerNotLoaded` without a selected folder, or an I/O error.
    pub async fn persist(&self) -> Result<()> {
        let guard = self.inner.lock().await;
        let loaded = guard.as_ref().ok_or(ImporterError::LedgerNotLoaded)?;
        write_ledger(loaded).await
    }

    /// Forget the loaded ledger
    pub async fn clear(&self) {
        *self.inner.lock().await = None;
    }

    /// Whether a folder is currently selected
    pub async fn is_loaded(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Record the remote resume token of an entry and persist
    ///
    /// The entry moves to `Ongoing`.
    pub async fn set_resume_token(&self, relative_path: &str, token: &str) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let loaded = guard.as_mut().ok_or(ImporterError::LedgerNotLoaded)?;
        loaded
            .ledger
            .entry_mut(relative_path)?
            .set_resume_token(token);
        write_ledger(loaded).await
    }

    /// Change the status of an entry and persist
    ///
    /// # Errors
    ///
    /// Returns a validation error when completing an entry with no resume token.
    pub async fn set_status(&self, relative_path: &str, status: EntryStatus) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let loaded = guard.as_mut().ok_or(ImporterError::LedgerNotLoaded)?;
        loaded.ledger.entry_mut(relative_path)?.set_status(status)?;
        write_ledger(loaded).await
    }

    /// Append entries for paths not yet tracked, persisting once if any were added
    ///
    /// Returns the number of entries added.
    pub async fn add_entries(&self, entries: Vec<LedgerEntry>) -> Result<usize> {
        let mut guard = self.inner.lock().await;
        let loaded = guard.as_mut().ok_or(ImporterError::LedgerNotLoaded)?;

        let mut added = 0;
        for entry in entries {
            tracing::debug!(relative_path = %entry.relative_path(), kind = ?entry.kind(), "Tracking new file");
            if loaded.ledger.add_entry(entry) {
                added += 1;
            }
        }

        if added > 0 {
            write_ledger(loaded).await?;
        }
        Ok(added)
    }

    /// Copy of the current ledger
    pub async fn snapshot(&self) -> Result<Ledger> {
        let guard = self.inner.lock().await;
        guard
            .as_ref()
            .map(|loaded| loaded.ledger.clone())
            .ok_or(ImporterError::LedgerNotLoaded)
    }

    /// Copy of one entry
    pub async fn entry(&self, relative_path: &str) -> Result<LedgerEntry> {
        let guard = self.inner.lock().await;
        let loaded = guard.as_ref().ok_or(ImporterError::LedgerNotLoaded)?;
        loaded
            .ledger
            .entry(relative_path)
            .cloned()
            .ok_or_else(|| ImporterError::EntryNotFound(relative_path.to_string()))
    }

    pub async fn session_id(&self) -> Result<SessionId> {
        let guard = self.inner.lock().await;
        guard
            .as_ref()
            .map(|loaded| loaded.ledger.session_id())
            .ok_or(ImporterError::LedgerNotLoaded)
    }

    pub async fn folder(&self) -> Result<PathBuf> {
        let guard = self.inner.lock().await;
        guard
            .as_ref()
            .map(|loaded| loaded.folder.clone())
            .ok_or(ImporterError::LedgerNotLoaded)
    }

    /// Absolute path of the file behind an entry
    pub async fn file_to_import(&self, relative_path: &str) -> Result<PathBuf> {
        let folder = self.folder().await?;
        Ok(path_components(relative_path).fold(folder, |path, component| path.join(component)))
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write to `.ledger.tmp`, sync, then rename over `.ledger`
async fn write_ledger(loaded: &LoadedLedger) -> Result<()> {
    let ledger_path = loaded.ledger_path();
    let temp_path = loaded
        .folder
        .join(format!("{LEDGER_FILENAME}{TEMP_SUFFIX}"));

    let json = serde_json::to_vec_pretty(&loaded.ledger)?;

    let mut file = tokio::fs::File::create(&temp_path).await?;
    file.write_all(&json).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, &ledger_path).await?;

    tracing::trace!(path = %ledger_path.display(), entries = loaded.ledger.len(), "Ledger persisted");
    Ok(())
}
