use crate::error::{ProcessingError, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at info, or debug with
/// `verbose`. With `log_file`, a plain-text copy of every event is appended
/// to that file. Keep the returned guard alive until exit so the file is
/// flushed.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_directive = if verbose { "i94_etl=debug" } else { "i94_etl=info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| ProcessingError::Config(format!("Invalid log filter: {}", e)))?;

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| ProcessingError::Config(format!("Logging already initialised: {}", e)))?;

    Ok(guard)
}

/// Non-blocking appender on a single, never rotated log file.
fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ProcessingError::Config(format!("Not a log file path: {}", path.display())))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| ProcessingError::Config(format!("Cannot open log file: {}", e)))?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_file_writer_appends_to_named_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("etl.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "earlier run\n").unwrap();

        let (mut writer, guard) = file_writer(&path).unwrap();
        writer.write_all(b"Temperature data loaded\n").unwrap();
        drop(writer);
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "earlier run\nTemperature data loaded\n");
    }

    #[test]
    fn test_bare_directory_is_rejected() {
        assert!(file_writer(Path::new("/")).is_err());
    }
}
