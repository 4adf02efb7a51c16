//! Logging and observability
//!
//! Structured logging with:
//! - Configurable log levels
//! - JSON-formatted local log files with rotation
//! - Helper macros for the upload lifecycle
//!
//! # Example
//!
//! ```no_run
//! use sfm_importer::logging::init_logging;
//! use sfm_importer::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a single file upload
///
/// # Example
///
/// ```no_run
/// use sfm_importer::log_upload_start;
/// use sfm_importer::domain::WorkerId;
///
/// let worker_id = WorkerId::generate();
/// log_upload_start!(worker_id, "Patients/0001.pat");
/// ```
#[macro_export]
macro_rules! log_upload_start {
    ($worker_id:expr, $relative_path:expr) => {
        tracing::info!(
            worker_id = %$worker_id,
            relative_path = %$relative_path,
            "Starting upload"
        );
    };
}

/// Log the completion of an upload run
///
/// # Example
///
/// ```no_run
/// use sfm_importer::log_upload_complete;
/// use std::time::Duration;
///
/// log_upload_complete!(12, 1, Duration::from_secs(30));
/// ```
#[macro_export]
macro_rules! log_upload_complete {
    ($completed:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            completed = $completed,
            failed = $failed,
            duration_ms = $duration.as_millis() as u64,
            "Upload run completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sfm_importer::log_error_with_context;
/// use sfm_importer::domain::ImporterError;
///
/// let error = ImporterError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
