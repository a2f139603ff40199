//! Tracing subscriber setup.
//!
//! Logs go to a daily-rolling file under `${REHEARSE_HOME}/logs`; stderr
//! belongs to the user-facing front end.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogConfig;

/// Environment variable holding a filter directive that overrides the config.
pub const LOG_ENV: &str = "REHEARSE_LOG";

const LOG_FILE_PREFIX: &str = "rehearse.log";

/// Installs the global subscriber.
///
/// Returns `None` when file logging is disabled. The returned guard must be
/// held for the life of the process so buffered lines get flushed.
///
/// # Errors
/// Returns an error if the log directory cannot be created or the filter
/// directive does not parse.
pub fn init(config: &LogConfig, logs_dir: &Path) -> Result<Option<WorkerGuard>> {
    if !config.file {
        return Ok(None);
    }

    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let filter = build_filter(&config.filter)?;
    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(writer);

    // A second init (tests, embedding hosts) keeps the first subscriber.
    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    Ok(Some(guard))
}

fn build_filter(configured: &str) -> Result<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive.trim())
            .with_context(|| format!("Invalid {LOG_ENV} filter: {directive}")),
        _ => EnvFilter::try_new(configured)
            .with_context(|| format!("Invalid log filter in config: {configured}")),
    }
}
