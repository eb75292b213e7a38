//! The structured log sink: one append-only file, one line per event.

use crate::error::{Error, Resource};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Timestamp layout at the start of every log line.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An open handle on the log file.
///
/// The sink is a plain value: callers turn it into a [`Dispatch`] and decide
/// whether to scope it (`tracing::dispatcher::with_default`) or install it
/// process-wide (`tracing::dispatcher::set_global_default`).
#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
    file: Arc<File>,
    created: bool,
}

impl LogSink {
    /// Open `path` for appending, creating it if needed. Existing records
    /// are never truncated.
    pub fn attach<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let existed = path.is_file();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::creation(Resource::LogFile, path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(file),
            created: !existed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`LogSink::attach`] had to create the file.
    pub fn created(&self) -> bool {
        self.created
    }

    /// A subscriber writing events at `level` and above to this sink.
    pub fn dispatch(&self, level: LevelFilter) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Arc::clone(&self.file))
            .with_ansi(false)
            .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
            .with_max_level(level)
            .finish();
        Dispatch::new(subscriber)
    }

    /// A subscriber writing the events `filter` selects to this sink.
    pub fn dispatch_with_filter(&self, filter: EnvFilter) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(Arc::clone(&self.file))
            .with_ansi(false)
            .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
            .with_env_filter(filter)
            .finish();
        Dispatch::new(subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_attach_appends_to_existing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs.log");
        std::fs::write(&path, "2026-01-01 00:00:00  INFO earlier run\n").unwrap();

        let sink = LogSink::attach(&path).unwrap();
        assert!(!sink.created());
        tracing::dispatcher::with_default(&sink.dispatch(LevelFilter::INFO), || {
            tracing::info!("second run");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "2026-01-01 00:00:00  INFO earlier run");
        assert!(lines[1].contains("INFO"));
        assert!(lines[1].ends_with("second run"));
    }

    #[test]
    fn test_lines_start_with_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs.log");

        let sink = LogSink::attach(&path).unwrap();
        assert!(sink.created());
        tracing::dispatcher::with_default(&sink.dispatch(LevelFilter::INFO), || {
            tracing::warn!(key = "Missing", "key not found");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().unwrap();
        assert!(
            chrono::NaiveDateTime::parse_from_str(&line[..19], LOG_TIME_FORMAT).is_ok(),
            "unexpected line: {line}"
        );
        assert!(line.contains("WARN"));
        assert!(line.contains("key not found"));
        assert!(!line.contains('\u{1b}'), "log lines must not carry ANSI codes");
    }

    #[test]
    fn test_level_filter_drops_debug_events() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs.log");

        let sink = LogSink::attach(&path).unwrap();
        tracing::dispatcher::with_default(&sink.dispatch(LevelFilter::INFO), || {
            tracing::debug!("hidden");
            tracing::info!("shown");
        });
        let filtered = sink.dispatch_with_filter(EnvFilter::new("error"));
        tracing::dispatcher::with_default(&filtered, || {
            tracing::info!("also hidden");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("shown"));
    }

    #[test]
    fn test_attach_fails_without_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("logs.log");

        assert!(matches!(
            LogSink::attach(&path),
            Err(Error::ResourceCreation {
                resource: Resource::LogFile,
                ..
            })
        ));
    }
}
