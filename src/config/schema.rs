//! Configuration schema types
//!
//! This module defines the configuration structure for the importer.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Main importer configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Upload endpoint and worker settings
    pub upload: UploadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ImporterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.upload.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Address of the resumable upload endpoint
    pub upload_api: String,

    /// Bearer token sent with every upload request
    ///
    /// May be left out of the file. `SFM_IMPORTER_TOKEN` overrides it, and
    /// `upload --token` overrides both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,

    /// Number of concurrent upload workers
    #[serde(default = "default_upload_threads")]
    pub upload_threads: usize,

    /// Size of each PATCH request body in KiB
    #[serde(default = "default_chunk_size_kb")]
    pub chunk_size_kb: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Working folder used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl UploadConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.upload_api.is_empty() {
            return Err("upload.upload_api cannot be empty".to_string());
        }

        let url = Url::parse(&self.upload_api)
            .map_err(|e| format!("upload.upload_api is not a valid URL: {e}"))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("upload.upload_api must start with http:// or https://".to_string());
        }

        if let Some(token) = &self.token {
            if token.expose_secret().is_blank() {
                return Err("upload.token cannot be empty when set".to_string());
            }
        }

        if !(1..=32).contains(&self.upload_threads) {
            return Err(format!(
                "upload.upload_threads must be between 1 and 32, got {}",
                self.upload_threads
            ));
        }

        if !(1..=102_400).contains(&self.chunk_size_kb) {
            return Err(format!(
                "upload.chunk_size_kb must be between 1 and 102400, got {}",
                self.chunk_size_kb
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("upload.timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }

    /// Chunk size in bytes
    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size_kb * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_api: "http://localhost:8080/files/".to_string(),
            token: None,
            upload_threads: default_upload_threads(),
            chunk_size_kb: default_chunk_size_kb(),
            timeout_seconds: default_timeout_seconds(),
            folder: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_upload_threads() -> usize {
    4
}

fn default_chunk_size_kb() -> usize {
    512
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
