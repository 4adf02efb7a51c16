//! Domain error types
//!
//! This module defines the error hierarchy for the importer.
//! All errors are domain-specific and don't expose third-party types.

use std::path::PathBuf;
use thiserror::Error;

/// Main importer error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum ImporterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The ledger file exists but cannot be parsed
    #[error("Corrupt ledger at {}: {message}", path.display())]
    CorruptLedger { path: PathBuf, message: String },

    /// An operation needed a loaded ledger but none is loaded
    #[error("No ledger loaded, select a working folder first")]
    LedgerNotLoaded,

    /// The ledger has no entry with the given relative path
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    /// Resumable transfer errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Resumable transfer errors
///
/// Errors raised by the tus client. These errors don't expose
/// the HTTP client's types.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to reach the upload server
    #[error("Failed to connect to upload server: {0}")]
    ConnectionFailed(String),

    /// Server refused to create the remote upload
    #[error("Create failed: {status} - {message}")]
    CreateFailed { status: u16, message: String },

    /// Creation response carried no Location header
    #[error("Server response is missing the Location header")]
    MissingLocation,

    /// HEAD request for the current offset failed
    #[error("Offset query failed: {status} - {message}")]
    OffsetQueryFailed { status: u16, message: String },

    /// A PATCH request was rejected
    #[error("Upload failed: {status} - {message}")]
    UploadFailed { status: u16, message: String },

    /// Server acknowledged a different offset than the bytes sent
    #[error("Offset mismatch: expected {expected}, server reported {actual}")]
    OffsetMismatch { expected: u64, actual: u64 },

    /// A header was missing or malformed
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Local file could not be read
    #[error("Failed to read local file: {0}")]
    Io(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for ImporterError {
    fn from(err: std::io::Error) -> Self {
        ImporterError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ImporterError {
    fn from(err: serde_json::Error) -> Self {
        ImporterError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ImporterError {
    fn from(err: toml::de::Error) -> Self {
        ImporterError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from directory walk errors
impl From<walkdir::Error> for ImporterError {
    fn from(err: walkdir::Error) -> Self {
        ImporterError::Io(format!("Failed to scan folder: {err}"))
    }
}

impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> Self {
        TransferError::Io(err.to_string())
    }
}
