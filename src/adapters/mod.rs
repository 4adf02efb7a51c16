//! External system integrations for the importer.
//!
//! - [`tus`] - resumable upload client for the import API
//!
//! Adapters isolate the HTTP client behind a trait so the upload scheduler
//! can be tested with mock implementations.
//!
//! ```rust,no_run
//! use sfm_importer::adapters::tus::TusClient;
//! use sfm_importer::config::UploadConfig;
//!
//! # fn example() -> sfm_importer::domain::Result<()> {
//! let config = UploadConfig::default();
//! let client = TusClient::new(&config)?;
//! # Ok(())
//! # }
//! ```

pub mod tus;
