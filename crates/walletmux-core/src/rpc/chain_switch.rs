/*
[INPUT]:  Chain-switch and chain-add requests issued through a provider
[OUTPUT]: Calls into the provider's switch/add contract, no network traffic
[POS]:    RPC layer - chain-switch interceptor between wallet handlers and the network
[UPDATE]: When adding intercepted methods or changing add-chain defaults
*/

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::chain::{ChainConfig, ChainNamespace, NativeCurrency, normalize_chain_id};
use crate::error::{Result, WalletError};

use super::middleware::{Next, RpcMiddleware};
use super::types::RpcRequest;

pub const EIP155_SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
pub const EIP155_ADD_CHAIN: &str = "wallet_addEthereumChain";
pub const SOLANA_SWITCH_CHAIN: &str = "wallet_switchSolanaChain";
pub const SOLANA_ADD_CHAIN: &str = "wallet_addSolanaChain";

/// Add-chain request payload (EIP-3085 shape)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_urls: Option<Vec<String>>,
}

impl AddChainParameter {
    pub fn from_chain_config(config: &ChainConfig) -> Self {
        Self {
            chain_id: config.chain_id.clone(),
            chain_name: config.display_name.clone(),
            rpc_urls: vec![config.rpc_target.clone()],
            native_currency: Some(NativeCurrency {
                symbol: config.native_currency.symbol.to_uppercase(),
                ..config.native_currency.clone()
            }),
            block_explorer_urls: config.block_explorer_url.clone().map(|url| vec![url]),
            icon_urls: config.logo.clone().map(|url| vec![url]),
        }
    }

    pub fn into_chain_config(self, namespace: ChainNamespace) -> Result<ChainConfig> {
        let rpc_target = self.rpc_urls.into_iter().next().ok_or_else(|| {
            WalletError::InvalidParams("rpcUrls must contain at least one url".to_string())
        })?;
        let native_currency = self.native_currency.unwrap_or_else(|| default_currency(namespace));

        let config = ChainConfig {
            chain_namespace: namespace,
            chain_id: normalize_chain_id(&self.chain_id)?,
            display_name: self.chain_name,
            rpc_target,
            native_currency,
            block_explorer_url: self.block_explorer_urls.and_then(|urls| urls.into_iter().next()),
            logo: self.icon_urls.and_then(|urls| urls.into_iter().next()),
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_currency(namespace: ChainNamespace) -> NativeCurrency {
    match namespace {
        ChainNamespace::Solana => NativeCurrency {
            name: "Solana".to_string(),
            symbol: "SOL".to_string(),
            decimals: 9,
        },
        _ => NativeCurrency {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        },
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParameter {
    chain_id: String,
}

/// Provider-level chain contract invoked by the interceptor
#[async_trait]
pub trait ChainSwitchHandlers: Send + Sync {
    async fn add_chain(&self, config: ChainConfig) -> Result<()>;
    async fn switch_chain(&self, chain_id: &str) -> Result<()>;
}

/// Turns chain-switch/add requests into provider calls
pub struct ChainSwitchMiddleware {
    namespace: ChainNamespace,
    handlers: Arc<dyn ChainSwitchHandlers>,
}

impl ChainSwitchMiddleware {
    pub fn new(namespace: ChainNamespace, handlers: Arc<dyn ChainSwitchHandlers>) -> Self {
        Self {
            namespace,
            handlers,
        }
    }

    fn methods(&self) -> Option<(&'static str, &'static str)> {
        match self.namespace {
            ChainNamespace::Eip155 => Some((EIP155_SWITCH_CHAIN, EIP155_ADD_CHAIN)),
            ChainNamespace::Solana => Some((SOLANA_SWITCH_CHAIN, SOLANA_ADD_CHAIN)),
            ChainNamespace::Other => None,
        }
    }
}

#[async_trait]
impl RpcMiddleware for ChainSwitchMiddleware {
    async fn handle(&self, request: RpcRequest, next: Next<'_>) -> Result<Value> {
        let Some((switch_method, add_method)) = self.methods() else {
            return next.run(request).await;
        };

        if request.method == switch_method {
            let params: SwitchChainParameter = request.first_param()?;
            debug!(chain_id = %params.chain_id, "intercepted chain switch request");
            self.handlers.switch_chain(&params.chain_id).await?;
            return Ok(Value::Null);
        }
        if request.method == add_method {
            let params: AddChainParameter = request.first_param()?;
            debug!(chain_id = %params.chain_id, "intercepted add chain request");
            let config = params.into_chain_config(self.namespace)?;
            self.handlers.add_chain(config).await?;
            return Ok(Value::Null);
        }
        next.run(request).await
    }
}
