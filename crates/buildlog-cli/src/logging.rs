use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Verbosity;

/// Initialize diagnostic logging.
///
/// The filter comes from `BUILDLOG_LOG`, then `RUST_LOG`, then a default
/// derived from `verbosity`. Logs go to stderr so they never interleave with
/// the build report on stdout. When `log_dir` is set, they go to
/// daily `buildlog.YYYY-MM-DD` files in that directory instead.
///
/// The returned [`WorkerGuard`] must be held for the lifetime of the program
/// so buffered file records are flushed on shutdown.
pub fn init(verbosity: Verbosity, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "debug",
    };
    let env_filter = EnvFilter::try_from_env("BUILDLOG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "buildlog");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .with(env_filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false),
                )
                .with(env_filter)
                .init();
            None
        }
    }
}
