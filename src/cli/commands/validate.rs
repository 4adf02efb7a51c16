//! Validate config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Upload API: {}", config.upload.upload_api);
        println!(
            "  Token: {}",
            if config.upload.token.is_some() {
                "set"
            } else {
                "not set (use --token or SFM_IMPORTER_TOKEN)"
            }
        );
        println!("  Upload Threads: {}", config.upload.upload_threads);
        println!("  Chunk Size: {} KiB", config.upload.chunk_size_kb);
        println!("  Timeout: {}s", config.upload.timeout_seconds);
        if let Some(folder) = &config.upload.folder {
            println!("  Working Folder: {folder}");
        }
        println!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                format!("{} ({})", config.logging.local_path, config.logging.local_rotation)
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(0)
    }
}
