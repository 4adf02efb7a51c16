//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ImporterConfig;
use super::secret::secret_string;
use crate::domain::errors::ImporterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ImporterConfig
/// 4. Applies environment variable overrides (SFM_IMPORTER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use sfm_importer::config::loader::load_config;
///
/// let config = load_config("sfm-importer.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ImporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ImporterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ImporterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ImporterConfig = toml::from_str(&contents)
        .map_err(|e| ImporterError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ImporterError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ImporterError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ImporterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Environment variable holding the upload token
///
/// The same name feeds `upload --token`, so a token set here wins over the
/// config file and is only beaten by an explicit `--token` argument.
pub const TOKEN_ENV_VAR: &str = "SFM_IMPORTER_TOKEN";

/// Applies environment variable overrides using the SFM_IMPORTER_* prefix
///
/// Environment variables follow the pattern: SFM_IMPORTER_<SECTION>_<KEY>
/// For example: SFM_IMPORTER_UPLOAD_UPLOAD_API, SFM_IMPORTER_UPLOAD_THREADS.
/// The token is the exception and uses [`TOKEN_ENV_VAR`].
fn apply_env_overrides(config: &mut ImporterConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("SFM_IMPORTER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Upload overrides
    if let Ok(val) = std::env::var("SFM_IMPORTER_UPLOAD_UPLOAD_API") {
        config.upload.upload_api = val;
    }
    if let Ok(val) = std::env::var(TOKEN_ENV_VAR) {
        config.upload.token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("SFM_IMPORTER_UPLOAD_THREADS") {
        if let Ok(threads) = val.parse() {
            config.upload.upload_threads = threads;
        }
    }
    if let Ok(val) = std::env::var("SFM_IMPORTER_UPLOAD_CHUNK_SIZE_KB") {
        if let Ok(size) = val.parse() {
            config.upload.chunk_size_kb = size;
        }
    }
    if let Ok(val) = std::env::var("SFM_IMPORTER_UPLOAD_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.upload.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("SFM_IMPORTER_UPLOAD_FOLDER") {
        config.upload.folder = Some(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SFM_IMPORTER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SFM_IMPORTER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("SFM_IMPORTER_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}
