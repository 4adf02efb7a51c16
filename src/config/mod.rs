//! Configuration management for the importer.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - `SFM_IMPORTER_<SECTION>_<KEY>` environment overrides
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sfm_importer::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sfm-importer.toml")?;
//!
//! println!("Upload API: {}", config.upload.upload_api);
//! println!("Workers: {}", config.upload.upload_threads);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`UploadConfig`] - Upload endpoint, token, worker count, chunk size
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [upload]
//! upload_api = "https://sfm.example.com/api/import/files/"
//! token = "${SFM_IMPORTER_TOKEN}"
//! upload_threads = 4
//! chunk_size_kb = 512
//!
//! [logging]
//! local_enabled = true
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{ApplicationConfig, ImporterConfig, LoggingConfig, UploadConfig};
pub use secret::{secret_string, SecretString, SecretValue};
