//! Init command implementation
//!
//! Generates a sample configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sfm-importer.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing SFM Importer configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} and set upload.upload_api", self.output);
                println!("  2. Put SFM_IMPORTER_TOKEN=<token> in a .env file");
                println!("  3. Validate configuration: sfm-importer validate-config");
                println!("  4. Run upload: sfm-importer upload <FOLDER>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Sample configuration with comments
    fn generate_config() -> String {
        r#"# SFM Importer Configuration File

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

[upload]
# Resumable upload endpoint of the import API
upload_api = "https://sfm.example.com/api/import/files/"

# Bearer token. Prefer SFM_IMPORTER_TOKEN (environment or .env) or --token,
# both of which override a value written here.
# token = "..."

# Concurrent upload workers (1-32)
upload_threads = 4

# Size of each upload request in KiB
chunk_size_kb = 512

# Per-request timeout in seconds
timeout_seconds = 300

# Default working folder when none is given on the command line
# folder = "/data/export"

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"  # daily | hourly
"#
        .to_string()
    }
}
