//! Snapshot files in the data directory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use changes_config::ConfigError;
use changes_db_models::Snapshot;
use serde::Serialize;

/// Errors that can occur when reading or writing stored files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to create a storage directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    /// Failed to read from storage.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write to storage.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse stored data.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    /// Failed to serialize data.
    #[error("Failed to serialize data: {0}")]
    Serialize(serde_json::Error),

    /// A version config could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Snapshot files, one per version, stored as
/// `<data_dir>/<owner>.<repo>.<version>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Load the snapshot stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self, name: &str) -> Result<Snapshot, StoreError> {
        let path = self.path(name);
        let display = path.display().to_string();
        log::debug!("Loading snapshot from {display}");

        let file = File::open(&path).map_err(|source| StoreError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreError::Parse {
            path: display,
            source,
        })
    }

    /// Store `snapshot` under `name`, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, name: &str, snapshot: &Snapshot) -> Result<PathBuf, StoreError> {
        let path = self.path(name);
        write_json_atomic(&path, snapshot)?;
        Ok(path)
    }
}

/// Write compact JSON next to `path` and rename it into place, so readers
/// never observe a partially written file.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{file_name}.tmp"));
    let write_error = |source| StoreError::Write {
        path: temp_path.display().to_string(),
        source,
    };

    let file = File::create(&temp_path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(StoreError::Serialize)?;
    writer.flush().map_err(write_error)?;
    drop(writer);

    fs::rename(&temp_path, path).map_err(|source| StoreError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use changes_db_models::Commit;

    #[test]
    fn test_save_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(temp.path().join("data"));

        let mut snapshot = Snapshot {
            generated_at: 1_700_000_000_000,
            log: vec!["abc".to_string()],
            ..Snapshot::default()
        };
        snapshot
            .commits
            .insert("abc".to_string(), Commit::new("abc".to_string()));

        let path = store
            .save("godotengine.godot.4.2.json", &snapshot)
            .unwrap();

        assert_eq!(path, temp.path().join("data/godotengine.godot.4.2.json"));
        assert!(!temp.path().join("data/.godotengine.godot.4.2.json.tmp").exists());
        assert_eq!(store.load("godotengine.godot.4.2.json").unwrap(), snapshot);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(temp.path());
        fs::write(temp.path().join("x.json"), "stale contents that are longer").unwrap();

        store.save("x.json", &Snapshot::default()).unwrap();

        assert_eq!(store.load("x.json").unwrap(), Snapshot::default());
    }

    #[test]
    fn test_load_missing_is_read_error() {
        let temp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(temp.path());

        assert!(matches!(
            store.load("missing.json"),
            Err(StoreError::Read { .. })
        ));
    }

    #[test]
    fn test_load_garbage_is_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("bad.json"), "{ not json").unwrap();
        let store = SnapshotStore::new(temp.path());

        assert!(matches!(
            store.load("bad.json"),
            Err(StoreError::Parse { .. })
        ));
    }
}
