#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Side log for pipeline diagnostics.
//!
//! Raw command output and API responses are dumped into a directory so a
//! failed or suspicious run can be inspected afterwards. Writing a dump never
//! fails the caller: errors are logged and swallowed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct DiagnosticsLog {
    dir: Option<PathBuf>,
}

impl DiagnosticsLog {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// A log that discards everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Dump raw text as `<dir>/<name>`.
    pub fn record_raw(&self, name: &str, content: &str) {
        let Some(dir) = &self.dir else {
            return;
        };

        if let Err(e) = write_raw(dir, name, content) {
            log::error!("    Error saving log file: {e}");
        }
    }

    /// Dump a value as pretty-printed JSON to `<dir>/<name>.json`.
    pub fn record_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        let Some(dir) = &self.dir else {
            return;
        };

        if let Err(e) = write_json(dir, name, value) {
            log::error!("    Error saving log file: {e}");
        }
    }
}

fn write_raw(dir: &Path, name: &str, content: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), content)
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let file = File::create(dir.join(format!("{name}.json")))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_raw_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let log = DiagnosticsLog::new(temp.path().join("logs"));

        log.record_raw("_commit_history", "commit abc\n");

        let content = fs::read_to_string(temp.path().join("logs/_commit_history")).unwrap();
        assert_eq!(content, "commit abc\n");
    }

    #[test]
    fn test_record_json_appends_extension() {
        let temp = tempfile::tempdir().unwrap();
        let log = DiagnosticsLog::new(temp.path());

        log.record_json("_rate_limit", &serde_json::json!({"remaining": 4999}));

        let content = fs::read_to_string(temp.path().join("_rate_limit.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["remaining"], 4999);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let log = DiagnosticsLog::new(&blocker);
        log.record_raw("dump", "ignored");
        log.record_json("dump", &serde_json::json!({}));

        assert!(blocker.is_file());
    }

    #[test]
    fn test_disabled_log_writes_nothing() {
        let log = DiagnosticsLog::disabled();

        log.record_raw("dump", "ignored");

        assert!(log.dir().is_none());
    }
}
