//! Process-wide log setup.
//!
//! Library code logs through the `log` macros; [`init`] installs a `tracing`
//! subscriber that also captures those records and writes them to stdout and,
//! optionally, to a log file.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

static INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log file path: {0}")]
    InvalidPath(PathBuf),

    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),

    #[error("Failed to install subscriber: {0}")]
    Subscriber(String),
}

fn file_appender(path: &Path) -> Result<RollingFileAppender, LoggingError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?)
}

/// Install the global subscriber. Calls after the first are no-ops.
pub fn init(log_file: Option<&Path>) -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false);

    let installed = match log_file {
        Some(path) => {
            let appender = file_appender(path)?;
            builder
                .with_writer(std::io::stdout.and(appender))
                .try_init()
        }
        None => builder.try_init(),
    };

    match installed {
        Ok(()) => {
            let _ = INITIALIZED.set(());
            Ok(())
        }
        // Lost a race with a concurrent init.
        Err(e) if INITIALIZED.get().is_some() => {
            log::debug!("Logging already initialized: {}", e);
            Ok(())
        }
        Err(e) => Err(LoggingError::Subscriber(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appender_rejects_directory_path() {
        let err = file_appender(Path::new("/")).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidPath(_)));
    }

    #[test]
    fn test_init_writes_to_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicle_detection.log");

        init(Some(path.as_path())).unwrap();
        init(Some(path.as_path())).unwrap();
        init(None).unwrap();
        assert!(path.exists());
    }
}
