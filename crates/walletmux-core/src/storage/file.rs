/*
[INPUT]:  Key-value entries and a JSON file path
[OUTPUT]: Entries persisted across restarts with atomic replacement
[POS]:    Storage layer - file-backed local storage
[UPDATE]: When changing the on-disk format
*/

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, WalletError};
use crate::sync::lock;

use super::KeyValueStorage;

/// JSON object on disk, rewritten through a temp file on every change
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Open the file, treating a missing file as empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            serde_json::from_str(&contents).map_err(|e| {
                WalletError::Storage(format!("corrupted storage file {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent(&self) -> Result<&Path> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
            Some(_) => Ok(Path::new(".")),
            None => Err(WalletError::Storage(format!(
                "invalid storage path {}",
                self.path.display()
            ))),
        }
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent = self.parent()?;
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;

        let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| io_error(parent, e))?;
        let json = serde_json::to_string_pretty(entries)?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| io_error(&self.path, e))?;
        temp_file.flush().map_err(|e| io_error(&self.path, e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| io_error(&self.path, e.error))?;
        debug!(path = %self.path.display(), entries = entries.len(), "storage flushed");
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> WalletError {
    WalletError::Storage(format!("{}: {e}", path.display()))
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    // Changes land in memory only after the file write succeeds
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}
