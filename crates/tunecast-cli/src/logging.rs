use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tunecast_core::config::AppConfig;

const LOG_FILE_NAME: &str = "tunecast.log";
const KEEP_LOG_DAYS: u64 = 7;

/// Console plus daily-rolling file logging. Keep the guard alive for the
/// life of the process or buffered file output is lost.
pub fn init_logging(verbose: bool) -> WorkerGuard {
    let log_dir = log_directory();

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if verbose {
        "tunecast=debug,tunecast_core=debug,tunecast_detect=debug"
    } else {
        "tunecast=info,tunecast_core=info,tunecast_detect=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer().with_target(true);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(log_dir = %log_dir.display(), version = env!("CARGO_PKG_VERSION"), "Logging initialized");

    cleanup_old_logs(&log_dir, KEEP_LOG_DAYS);

    guard
}

fn log_directory() -> PathBuf {
    let log_dir = AppConfig::log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: failed to create log directory {}: {e}", log_dir.display());
    }
    log_dir
}

/// Remove rotated log files older than `keep_days`.
fn cleanup_old_logs(log_dir: &Path, keep_days: u64) {
    let cutoff = SystemTime::now() - Duration::from_secs(keep_days * 24 * 60 * 60);

    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read log directory for cleanup");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !is_rotated_log(&path) {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };

        if modified < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed old log file"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove old log file"),
            }
        }
    }
}

/// `tunecast.log.2026-01-01` style names; the bare base name never matches.
fn is_rotated_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_NAME) && name != LOG_FILE_NAME)
}
