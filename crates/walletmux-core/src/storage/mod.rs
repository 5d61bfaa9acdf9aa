/*
[INPUT]:  String keys and values from the hub's adapter cache
[OUTPUT]: Persisted or in-memory key-value entries
[POS]:    Storage layer - key-value collaborator for the cached adapter identity
[UPDATE]: When adding storage backends
*/

mod file;

use std::collections::HashMap;
use std::sync::Mutex;

pub use file::JsonFileStorage;

use crate::error::{Result, WalletError};
use crate::sync::lock;

/// Key-value store the hub caches the last adapter in
pub trait KeyValueStorage: Send + Sync {
    /// False when the environment offers no storage; callers then skip caching
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-lifetime storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Storage for environments that have none
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl KeyValueStorage for UnavailableStorage {
    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(WalletError::Storage(format!("no storage available for {key}")))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}
