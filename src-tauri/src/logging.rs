use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{DEFAULT_LOG_FILTER, LAUNCHER_LOG_FILE};

#[derive(Debug, Error)]
pub(crate) enum LoggingError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn ensure_log_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;
    Ok(log_dir.to_path_buf())
}

pub(crate) fn resolve_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LAUNCHER_LOG_FILE)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber: stderr plus a daily-rolling file in
/// `log_dir`. The returned guard flushes the file writer when dropped.
pub(crate) fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let mut guard = None;
    let file_layer = match ensure_log_dir(log_dir) {
        Ok(log_dir) => {
            let appender = tracing_appender::rolling::daily(log_dir, LAUNCHER_LOG_FILE);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(env_filter()),
            )
        }
        Err(error) => {
            eprintln!("Warning: {error}; logging to stderr only");
            None
        }
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());
    if let Err(error) = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
    {
        eprintln!("Warning: failed to install log subscriber: {error}");
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_log_dir_creates_nested_directories() {
        let root = tempfile::tempdir().expect("tempdir");
        let log_dir = root.path().join("logs").join("nested");

        let created = ensure_log_dir(&log_dir).expect("log dir created");
        assert_eq!(created, log_dir);
        assert!(log_dir.is_dir());
    }

    #[test]
    fn ensure_log_dir_reports_file_in_the_way() {
        let root = tempfile::tempdir().expect("tempdir");
        let blocker = root.path().join("logs");
        fs::write(&blocker, b"not a directory").expect("write blocker");

        let error = ensure_log_dir(&blocker.join("inner")).expect_err("parent is a file");
        assert!(error.to_string().contains("failed to create log directory"));
    }

    #[test]
    fn log_path_uses_launcher_file_name() {
        assert_eq!(
            resolve_log_path(Path::new("/var/tower/logs")),
            PathBuf::from("/var/tower/logs/launcher.log")
        );
    }
}
