/*
[INPUT]:  User-provided chain parameters and registry presets
[OUTPUT]: Immutable, validated chain configurations
[POS]:    Chain layer - chain identity and connection parameters
[UPDATE]: When adding chain namespaces or chain config fields
*/

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WalletError};

/// Account model family of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainNamespace {
    Eip155,
    Solana,
    Other,
}

impl ChainNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainNamespace::Eip155 => "eip155",
            ChainNamespace::Solana => "solana",
            ChainNamespace::Other => "other",
        }
    }
}

impl fmt::Display for ChainNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Connection parameters for one target network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_namespace: ChainNamespace,
    /// Canonical lower-case hex, e.g. `0x89`
    pub chain_id: String,
    pub display_name: String,
    pub rpc_target: String,
    pub native_currency: NativeCurrency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl ChainConfig {
    /// Parse the rpc target
    pub fn rpc_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.rpc_target)?)
    }

    /// Numeric form of the chain id
    pub fn numeric_chain_id(&self) -> Result<u64> {
        parse_chain_id(&self.chain_id)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.display_name.trim().is_empty() {
            return Err(WalletError::InvalidParams(format!(
                "displayName is required for chain {}",
                self.chain_id
            )));
        }
        self.rpc_url().map_err(|e| {
            WalletError::InvalidParams(format!(
                "invalid rpcTarget for chain {}: {e}",
                self.chain_id
            ))
        })?;
        Ok(())
    }
}

/// Partially specified chain config; missing fields come from the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfigInput {
    pub chain_namespace: Option<ChainNamespace>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub rpc_target: Option<String>,
    #[serde(default)]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default)]
    pub block_explorer_url: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl ChainConfigInput {
    pub fn new(namespace: ChainNamespace, chain_id: &str) -> Self {
        Self {
            chain_namespace: Some(namespace),
            chain_id: Some(chain_id.to_string()),
            ..Self::default()
        }
    }
}

impl From<ChainConfig> for ChainConfigInput {
    fn from(config: ChainConfig) -> Self {
        Self {
            chain_namespace: Some(config.chain_namespace),
            chain_id: Some(config.chain_id),
            display_name: Some(config.display_name),
            rpc_target: Some(config.rpc_target),
            native_currency: Some(config.native_currency),
            block_explorer_url: config.block_explorer_url,
            logo: config.logo,
        }
    }
}

/// Parse a hex (`0x`-prefixed) or decimal chain id
pub fn parse_chain_id(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    let parsed = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        raw.parse::<u64>()
    };
    parsed.map_err(|_| WalletError::InvalidParams(format!("invalid chain id: {raw:?}")))
}

/// Canonical lower-case hex form of a chain id
pub fn normalize_chain_id(raw: &str) -> Result<String> {
    parse_chain_id(raw).map(to_hex_chain_id)
}

pub fn to_hex_chain_id(id: u64) -> String {
    format!("0x{id:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_chain_id() {
        assert_eq!(normalize_chain_id("0x89").unwrap(), "0x89");
        assert_eq!(normalize_chain_id("0X0089").unwrap(), "0x89");
        assert_eq!(normalize_chain_id("137").unwrap(), "0x89");
        assert_eq!(normalize_chain_id("0xAA36A7").unwrap(), "0xaa36a7");
        assert!(normalize_chain_id("polygon").is_err());
        assert!(normalize_chain_id("0x").is_err());
    }

    #[test]
    fn test_namespace_serde() {
        let ns: ChainNamespace = serde_json::from_str("\"eip155\"").unwrap();
        assert_eq!(ns, ChainNamespace::Eip155);
        assert_eq!(ChainNamespace::Solana.to_string(), "solana");
    }

    #[test]
    fn test_validate_rejects_bad_rpc_target() {
        let config = ChainConfig {
            chain_namespace: ChainNamespace::Eip155,
            chain_id: "0x1".into(),
            display_name: "Ethereum".into(),
            rpc_target: "not a url".into(),
            native_currency: NativeCurrency {
                name: "Ether".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            block_explorer_url: None,
            logo: None,
        };
        assert!(matches!(config.validate(), Err(WalletError::InvalidParams(_))));
    }
}
