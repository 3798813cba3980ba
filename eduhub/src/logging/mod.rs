//! Logging initialization.
//!
//! Console output always; an additional non-blocking daily-rotated file layer
//! when a log directory is configured.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "eduhub=info,stream_bridge=info,sqlx=warn";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter directive. Returns
/// the appender guard when file logging is active; dropping it flushes and
/// stops the background writer, so the caller must hold it for the process
/// lifetime.
pub fn init(settings: &Settings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone()));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match settings.log_dir.as_deref() {
        Some(dir) => {
            let (writer, guard) = file_writer(dir);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn file_writer(dir: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir, "eduhub.log");
    tracing_appender::non_blocking(appender)
}
