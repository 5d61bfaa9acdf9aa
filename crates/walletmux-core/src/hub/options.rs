/*
[INPUT]:  Application-supplied hub configuration
[OUTPUT]: Validated options with defaults applied
[POS]:    Hub layer - construction options
[UPDATE]: When adding hub options
*/

use serde::{Deserialize, Serialize};

use crate::chain::ChainConfigInput;
use crate::error::{Result, WalletError};

/// Key the hub stores the cached adapter name under
pub const ADAPTER_CACHE_KEY: &str = "walletmux-cachedAdapter";

const DEFAULT_SESSION_TIME: u64 = 86_400;

/// Auth network the adapters log in against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthNetwork {
    Mainnet,
    Testnet,
    Devnet,
    Cyan,
    #[default]
    SapphireMainnet,
    SapphireDevnet,
}

/// Where the cached adapter name lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Survives restarts
    #[default]
    Local,
    /// Dropped with the process
    Session,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubOptions {
    pub client_id: String,
    pub chain_config: ChainConfigInput,
    /// Session lifetime in seconds
    #[serde(default = "default_session_time")]
    pub session_time: u64,
    #[serde(default)]
    pub network: AuthNetwork,
    #[serde(default)]
    pub storage_key: StorageKind,
    #[serde(default)]
    pub enable_logging: bool,
}

fn default_session_time() -> u64 {
    DEFAULT_SESSION_TIME
}

impl HubOptions {
    pub fn new(client_id: impl Into<String>, chain_config: ChainConfigInput) -> Self {
        Self {
            client_id: client_id.into(),
            chain_config,
            session_time: DEFAULT_SESSION_TIME,
            network: AuthNetwork::default(),
            storage_key: StorageKind::default(),
            enable_logging: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(WalletError::InvalidParams(
                "Please provide a valid clientId in constructor".to_string(),
            ));
        }
        if self.chain_config.chain_namespace.is_none() {
            return Err(WalletError::InvalidParams(
                "Please provide a valid chainNamespace in chainConfig".to_string(),
            ));
        }
        if self.session_time == 0 {
            return Err(WalletError::InvalidParams(
                "sessionTime must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
