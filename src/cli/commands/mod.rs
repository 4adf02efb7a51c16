//! CLI command implementations

pub mod init;
pub mod status;
pub mod upload;
pub mod validate;

use crate::domain::ImporterError;
use std::path::{Path, PathBuf};

/// Exit code for configuration errors
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Exit code for fatal errors
pub const EXIT_FATAL: i32 = 5;

/// Pick the working folder: the command line wins over the configuration
pub(crate) fn resolve_folder(cli_folder: Option<&Path>, config_folder: Option<&str>) -> Option<PathBuf> {
    cli_folder
        .map(Path::to_path_buf)
        .or_else(|| config_folder.map(PathBuf::from))
}

/// Exit code for an error raised while opening a working folder
pub(crate) fn exit_code_for(error: &ImporterError) -> i32 {
    match error {
        ImporterError::Configuration(_) => EXIT_CONFIG_ERROR,
        _ => EXIT_FATAL,
    }
}
