//! Domain models and types for the importer.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Ledger model** ([`Ledger`], [`LedgerEntry`], [`FileKind`], [`EntryStatus`])
//! - **Identifiers** ([`SessionId`], [`WorkerId`])
//! - **Error types** ([`ImporterError`], [`TransferError`])
//! - **Result type alias** ([`Result`])
//!
//! # Working folder layout
//!
//! An export folder looks like this:
//!
//! ```text
//! export/
//! ├── .ledger            (written by the importer)
//! ├── ExportData.dat     (organization file, uploaded first)
//! ├── Patients/*.pat
//! └── Reports/*.rpt
//! ```
//!
//! # Example
//!
//! ```rust
//! use sfm_importer::domain::{EntryStatus, FileKind, LedgerEntry};
//!
//! let entry = LedgerEntry::new("Patients/0001.pat");
//! assert_eq!(entry.kind(), FileKind::Patient);
//! assert_eq!(entry.status(), EntryStatus::NotStarted);
//! ```

pub mod errors;
pub mod ids;
pub mod ledger;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{ImporterError, TransferError};
pub use ids::{SessionId, WorkerId};
pub use ledger::{EntryStatus, FileKind, Ledger, LedgerEntry};
pub use result::Result;
