//! Logging setup
//!
//! Human-readable events go to stderr. When a cache directory exists, the
//! same events (always at debug level) are appended to `<cache>/tidemark.log`
//! through a non-blocking writer.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Log file name inside the cache directory
pub const LOG_FILE_NAME: &str = "tidemark.log";

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must outlive
/// every command.
pub fn init(debug: bool, cache_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let stderr_level = if debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_level);

    let (file_layer, guard) = match cache_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
