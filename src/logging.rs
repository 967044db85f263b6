//! Tracing subscriber setup for the command line driver

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILENAME: &str = "version-ledger.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("Failed to open log file: {0}")]
    File(#[from] InitError),
}

/// Install the global subscriber
///
/// Without a log file, human readable lines go to stderr. With one, JSON
/// lines are appended to it through a non-blocking writer; the returned
/// guard must be held until exit so buffered lines are flushed. An invalid
/// filter is rejected before anything is installed.
pub fn init_logging(
    level: &str,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_new(level)?;

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
        return Ok(None);
    };

    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let filename = log_file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILENAME);

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(filename)
        .build(directory)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();

    Ok(Some(guard))
}
