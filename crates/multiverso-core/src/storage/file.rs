use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KeyValueStore, StorageError};

/// Stores each record as `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read(&path).map(Some).map_err(|source| StorageError::Read {
            key: key.to_string(),
            source,
        })
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        // Write beside the target and rename so a crash never leaves half a record
        let path = self.record_path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        let write_err = |source| StorageError::Write {
            key: key.to_string(),
            source,
        };

        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        debug!(key, bytes = value.len(), "Record written");
        Ok(())
    }

    fn delete_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            let path = self.record_path(key);
            if path.exists() {
                fs::remove_file(&path).map_err(|source| StorageError::Write {
                    key: key.to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}
