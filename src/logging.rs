//! Output and error-log sinks shared across the session.
//!
//! The agent loop and tool executor talk to the terminal through
//! [`DisplaySink`] rather than printing directly, so tests can capture the
//! narration. Failures that the user should not have to read in full are
//! appended to `error.log` through [`ErrorLog`].

use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Line-oriented user-facing output.
pub trait DisplaySink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Append-only diagnostic log for failures.
pub trait ErrorLog: Send + Sync {
    /// Records `summary` and, when present, the full error chain of `cause`.
    fn log_error(&self, summary: &str, cause: Option<&dyn Error>);
}

/// Writes straight to stdout, one line per call.
#[derive(Debug, Default)]
pub struct StdoutDisplay;

impl DisplaySink for StdoutDisplay {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Appends timestamped entries to a log file.
///
/// Logging must never take down the session, so write failures degrade to a
/// note on stderr instead of propagating.
#[derive(Debug)]
pub struct FileErrorLog {
    path: PathBuf,
}

impl FileErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, entry: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{entry}"));
        if let Err(error) = result {
            eprintln!("[LOG:WARN] Could not write to {}: {error}", self.path.display());
        }
    }
}

impl ErrorLog for FileErrorLog {
    fn log_error(&self, summary: &str, cause: Option<&dyn Error>) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown-time".to_string());

        let mut entry = format!("[{timestamp}] {summary}");
        let mut source = cause;
        while let Some(error) = source {
            entry.push_str(&format!("\n  caused by: {error}"));
            source = error.source();
        }
        self.append(&entry);
    }
}

/// In-memory recorder used by tests and the agent-loop assertions.
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    lines: Mutex<Vec<String>>,
}

impl MemoryDisplay {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl DisplaySink for MemoryDisplay {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Error log that drops everything; for tests that do not assert on logs.
#[derive(Debug, Default)]
pub struct NullErrorLog;

impl ErrorLog for NullErrorLog {
    fn log_error(&self, _summary: &str, _cause: Option<&dyn Error>) {}
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{DisplaySink, ErrorLog, FileErrorLog, MemoryDisplay};

    #[test]
    fn file_error_log_appends_timestamped_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("error.log");
        let log = FileErrorLog::new(&path);

        log.log_error("first failure", None);
        log.log_error("second failure", None);

        let contents = std::fs::read_to_string(&path).expect("log should exist");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("first failure"));
        assert!(lines[1].ends_with("second failure"));
    }

    #[test]
    fn file_error_log_records_the_cause_chain() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("error.log");
        let log = FileErrorLog::new(&path);

        let cause = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        log.log_error("model call failed", Some(&cause));

        let contents = std::fs::read_to_string(&path).expect("log should exist");
        assert!(contents.contains("model call failed"));
        assert!(contents.contains("caused by: connection refused"));
    }

    #[test]
    fn memory_display_records_lines_in_order() {
        let display = MemoryDisplay::default();
        display.write_line("one");
        display.write_line("two");
        assert_eq!(display.lines(), vec!["one".to_string(), "two".to_string()]);
    }
}
