//! Persisted version records, one flat file per tracking key.
//!
//! The layout is a durable contract other tooling reads directly:
//! `<state_dir>/<key with '/' replaced by '_'>.txt`, content is the version
//! string plus a trailing newline. Writes go through a `.tmp` file and a
//! rename so a crash never leaves a half-written record.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Flat-file store mapping tracking keys to their last-synced version.
#[derive(Debug, Clone)]
pub struct VersionStore {
    base_dir: PathBuf,
}

impl VersionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the record for `key`.
    ///
    /// Path separators in the key are substituted so distinct keys never
    /// collide: `minio/minio` maps to `minio_minio.txt`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.txt", key.replace('/', "_")))
    }

    /// Read the stored version for `key`.
    ///
    /// A missing record means "never synced" and returns `Ok(None)`.
    pub fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(Some(contents.trim().to_string()))
    }

    /// Write `version` as the new record for `key` atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn write(&self, key: &str, version: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let Some(dir) = path.parent() else {
            return Err(io_err(
                path,
                std::io::Error::other("invalid version store path"),
            ));
        };

        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let tmp = path.with_extension("txt.tmp");
        std::fs::write(&tmp, format!("{version}\n")).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
