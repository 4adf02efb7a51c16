//! Ledger model for tracking per-file upload state
//!
//! The ledger is the durable record of every exported file found in a working
//! folder and how far its upload has come. Field names on disk match the
//! ledger files written by earlier versions of the importer, so an existing
//! `.ledger` keeps working.

use super::errors::ImporterError;
use super::ids::SessionId;
use super::result::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the ledger file inside the working folder
pub const LEDGER_FILENAME: &str = ".ledger";

/// Name of the file containing organization data, at the folder root
pub const ORGANIZATION_FILENAME: &str = "ExportData.dat";

/// Subfolder where patient files are stored
pub const PATIENT_FOLDER: &str = "Patients";

/// Subfolder where report files are stored
pub const REPORT_FOLDER: &str = "Reports";

/// Extensions accepted by the importer, one per file kind
pub const VALID_EXTENSIONS: [&str; 3] = ["dat", "pat", "rpt"];

/// Kind of exported file
///
/// The kind decides upload ordering: the organization file must reach the
/// server before any patient or report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    #[serde(rename = "organizationFile")]
    Organization,
    #[serde(rename = "patientFile")]
    Patient,
    #[serde(rename = "reportFile")]
    Report,
    #[serde(rename = "unknown")]
    Unknown,
}

impl FileKind {
    /// Classify a file by its path relative to the working folder
    ///
    /// Patient and report files are recognised by a plain prefix match on
    /// the folder name, so `PatientsArchive/0001.pat` is a patient file.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfm_importer::domain::ledger::FileKind;
    ///
    /// assert_eq!(FileKind::classify("ExportData.dat"), FileKind::Organization);
    /// assert_eq!(FileKind::classify("Patients/0001.pat"), FileKind::Patient);
    /// assert_eq!(FileKind::classify("Reports/0001.rpt"), FileKind::Report);
    /// assert_eq!(FileKind::classify("PatientsArchive/0001.pat"), FileKind::Patient);
    /// assert_eq!(FileKind::classify("misc/other.dat"), FileKind::Unknown);
    /// ```
    pub fn classify(relative_path: &str) -> Self {
        if relative_path == ORGANIZATION_FILENAME {
            FileKind::Organization
        } else if relative_path.starts_with(PATIENT_FOLDER) {
            FileKind::Patient
        } else if relative_path.starts_with(REPORT_FOLDER) {
            FileKind::Report
        } else {
            FileKind::Unknown
        }
    }

    /// Value sent in the `FileType` upload metadata
    pub fn metadata_name(&self) -> &'static str {
        match self {
            FileKind::Organization => "OrganizationFile",
            FileKind::Patient => "PatientFile",
            FileKind::Report => "ReportFile",
            FileKind::Unknown => "Unknown",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            FileKind::Organization => "Virksomhetsfil",
            FileKind::Patient => "Pasientfil",
            FileKind::Report => "Rapportfil",
            FileKind::Unknown => "Ukjent fil",
        }
    }
}

/// Upload status of a single ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum EntryStatus {
    /// Nothing has been sent yet
    #[default]
    NotStarted,
    /// A remote upload exists and bytes may have been sent
    Ongoing,
    /// The server has every byte
    Completed,
    /// The last attempt failed; retried on the next run
    Failed,
}

impl EntryStatus {
    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            EntryStatus::NotStarted => "Ikke begynt",
            EntryStatus::Ongoing => "Opplasting pågår",
            EntryStatus::Completed => "Opplasting ferdig",
            EntryStatus::Failed => "Opplasting feilet",
        }
    }
}

/// One exported file and its upload state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Path of the file relative to the working folder; unique in a ledger
    #[serde(rename = "FileNameWithRelativePath")]
    relative_path: String,

    /// Kind decided at discovery time
    #[serde(rename = "FileType")]
    kind: FileKind,

    /// Current upload status
    #[serde(rename = "Status", default)]
    status: EntryStatus,

    /// URL of the remote upload, used to resume an interrupted transfer
    #[serde(rename = "RemoteUrl", default)]
    resume_token: Option<String>,

    /// When the file was added to the ledger
    #[serde(rename = "WhenAddedToLedger")]
    added_at: DateTime<Utc>,

    /// When the entry was last changed
    #[serde(rename = "WhenModified")]
    modified_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create an entry for a newly discovered file, classifying it by path
    pub fn new(relative_path: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let now = Utc::now();
        Self {
            kind: FileKind::classify(&relative_path),
            relative_path,
            status: EntryStatus::NotStarted,
            resume_token: None,
            added_at: now,
            modified_at: now,
        }
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Bare file name, the last component of the relative path
    ///
    /// Both separators are honoured since ledgers may have been written on
    /// Windows.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit(is_separator)
            .next()
            .unwrap_or(&self.relative_path)
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn resume_token(&self) -> Option<&str> {
        self.resume_token.as_deref()
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == EntryStatus::Completed
    }

    /// Change the status and stamp the modification time
    ///
    /// # Errors
    ///
    /// Returns a validation error when marking the entry completed while it
    /// has no resume token; a completed upload always has a remote resource.
    pub fn set_status(&mut self, status: EntryStatus) -> Result<()> {
        if status == EntryStatus::Completed && self.resume_token.is_none() {
            return Err(ImporterError::Validation(format!(
                "Cannot mark {} completed without a resume token",
                self.relative_path
            )));
        }
        self.status = status;
        self.touch();
        Ok(())
    }

    /// Record the remote upload URL; the entry moves to `Ongoing`
    pub fn set_resume_token(&mut self, token: impl Into<String>) {
        self.resume_token = Some(token.into());
        self.status = EntryStatus::Ongoing;
        self.touch();
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// The full ledger for one working folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Entries in discovery order
    #[serde(rename = "importFiles", default)]
    entries: Vec<LedgerEntry>,

    /// Session shared by every upload from this folder
    #[serde(rename = "ImportSession")]
    session_id: SessionId,
}

impl Ledger {
    /// Create an empty ledger with a fresh session
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            session_id: SessionId::generate(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.entry(relative_path).is_some()
    }

    /// Look up an entry by relative path, treating both separators alike
    pub fn entry(&self, relative_path: &str) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|e| same_relative_path(&e.relative_path, relative_path))
    }

    pub(crate) fn entry_mut(&mut self, relative_path: &str) -> Result<&mut LedgerEntry> {
        self.entries
            .iter_mut()
            .find(|e| same_relative_path(&e.relative_path, relative_path))
            .ok_or_else(|| ImporterError::EntryNotFound(relative_path.to_string()))
    }

    /// Append an entry unless its path is already tracked
    ///
    /// Returns `true` when the entry was added.
    pub fn add_entry(&mut self, entry: LedgerEntry) -> bool {
        if self.contains(&entry.relative_path) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// The organization entry, if the folder has one
    pub fn organization_entry(&self) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == FileKind::Organization)
    }

    /// Entries not yet completed, in ledger order
    pub fn pending_entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| !e.is_completed())
    }

    /// Number of entries with the given status
    pub fn count_with_status(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

fn same_relative_path(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| x == y || (is_separator(x) && is_separator(y)))
}

/// Split a stored relative path into its components
///
/// Ledgers written on Windows use backslash as separator.
pub fn path_components(relative_path: &str) -> impl Iterator<Item = &str> {
    relative_path.split(is_separator).filter(|c| !c.is_empty())
}

/// Whether a path carries one of the accepted extensions
pub fn has_valid_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VALID_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
