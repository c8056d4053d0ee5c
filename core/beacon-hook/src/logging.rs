//! File-based logging for the hook binary.
//!
//! Hook invocations are short-lived and run outside a terminal, so logs go
//! to a rolling file under the storage root. The returned guard must live
//! for the duration of `main` so buffered lines are flushed on exit.

use beacon_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn init() -> Option<WorkerGuard> {
    let storage = StorageConfig::default();
    if storage.ensure_dirs().is_err() {
        // No writable storage root: run silent rather than fail the hook.
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(storage.log_dir(), "beacon-hook.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}
