/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed hub options and the storage backing the adapter cache
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walletmux_core::{HubOptions, JsonFileStorage, KeyValueStorage, MemoryStorage, StorageKind};

/// Top-level configuration for the walletmux binary
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Options handed to the hub as-is
    pub hub: HubOptions,
    /// Where `local` storage keeps the cached adapter
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content).context("parse config yaml")?;
        config.hub.validate().context("validate hub options")?;
        Ok(config)
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => default_storage_path(),
        }
    }

    /// Storage matching `hub.storage_key`
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        match self.hub.storage_key {
            StorageKind::Local => {
                let path = self.storage_path()?;
                let storage = JsonFileStorage::open(&path)
                    .with_context(|| format!("open storage {}", path.display()))?;
                Ok(Arc::new(storage))
            }
            StorageKind::Session => Ok(Arc::new(MemoryStorage::new())),
        }
    }
}

fn default_storage_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("no config directory on this platform")?;
    Ok(base.join("walletmux").join("cache.json"))
}
