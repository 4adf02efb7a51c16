//! Subscriber setup for the importer
//!
//! Human-readable lines go to the console. When `logging.local_enabled` is
//! set, the same events are also written as JSON lines to
//! `<local_path>/sfm-importer.log.<date>`, rotated daily or hourly.
//!
//! # Example
//!
//! ```no_run
//! use sfm_importer::logging::init_logging;
//! use sfm_importer::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! ```

use crate::config::LoggingConfig;
use crate::domain::{ImporterError, Result};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name prefix used by the rolling appender
pub const LOG_FILE_NAME: &str = "sfm-importer.log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Keeps the background log writer alive; dropping it flushes the file
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides `log_level` when set.
///
/// # Errors
///
/// Returns a configuration error for an unknown level, a log directory that
/// cannot be created, or when a subscriber is already installed.
pub fn init_logging(log_level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(log_level)?;
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("sfm_importer={level}")))
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(filter())
        .boxed();

    let (file, file_writer) = if config.local_enabled {
        let (layer, guard) = json_file_layer(config)?;
        (Some(layer.with_filter(filter()).boxed()), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| ImporterError::Configuration(format!("Logging already initialized: {e}")))?;

    tracing::debug!(
        level = %level,
        file_logging = config.local_enabled,
        local_path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

/// JSON layer writing through a non-blocking rolling appender
fn json_file_layer<S>(config: &LoggingConfig) -> Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        ImporterError::Configuration(format!(
            "Cannot create log directory {}: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(
        rotation_for(&config.local_rotation),
        &config.local_path,
        LOG_FILE_NAME,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .boxed();

    Ok((layer, guard))
}

fn rotation_for(name: &str) -> Rotation {
    if name == "hourly" {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    }
}

fn parse_log_level(name: &str) -> Result<Level> {
    match name.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(ImporterError::Configuration(format!(
            "Unknown log level '{other}', expected trace, debug, info, warn or error"
        ))),
    }
}
