//! Logging lifecycle.
//!
//! The subscriber is installed once at process start and owns two sinks: a
//! compact stderr layer for interactive runs and a non-blocking daily-rolling
//! file layer under the session's `logs/` directory. The returned
//! [`WorkerGuard`] is the explicit lifecycle handle: whoever calls
//! [`init`] must hold it until the process ends, and dropping it flushes
//! any buffered file output.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber and return its flush guard.
///
/// The filter honors `RUST_LOG` and defaults to `info`.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "threadscrape.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
