/*
[INPUT]:  The hub's chain config before any wallet is connected
[OUTPUT]: A read-only RPC provider with chain switching
[POS]:    Provider layer - pre-connection provider backing the hub's proxy
[UPDATE]: When changing the pre-connection pipeline
*/

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::info;

use crate::chain::{ChainConfig, ChainRegistry};
use crate::error::{Result, WalletError};
use crate::events::{EventEmitter, ProviderEvent};
use crate::rpc::{
    ChainIdMiddleware, ChainSwitchHandlers, ChainSwitchMiddleware, HttpConfig, NetworkMiddleware,
    RpcPipeline,
};

use super::base::ProviderCore;
use super::proxy::ProviderProxy;

/// Provider that talks straight to the chain's RPC target.
///
/// Its engine proxy is the long-lived handle the hub hands out; while no
/// adapter is connected the proxy delegates to this provider's pipeline.
#[derive(Clone)]
pub struct CommonRpcProvider {
    core: Arc<ProviderCore>,
}

impl CommonRpcProvider {
    pub async fn new(
        chain_config: ChainConfig,
        registry: Arc<dyn ChainRegistry>,
        http: &HttpConfig,
    ) -> Result<Self> {
        let provider = Self {
            core: Arc::new(ProviderCore::new(chain_config.clone(), registry, http)?),
        };
        let ticket = provider.core.issue_ticket();
        provider.core.commit(ticket, provider.build_pipeline(&chain_config)?, None);
        provider.core.lookup_network().await?;
        Ok(provider)
    }

    fn build_pipeline(&self, chain_config: &ChainConfig) -> Result<RpcPipeline> {
        let handlers = Arc::new(CommonChainHandlers {
            core: Arc::downgrade(&self.core),
        });
        Ok(RpcPipeline::builder(chain_config.clone())
            .push(ChainIdMiddleware::new(chain_config)?)
            .push(ChainSwitchMiddleware::new(self.core.namespace(), handlers))
            .push(NetworkMiddleware::new(self.core.client(), chain_config)?)
            .build())
    }

    /// The stable request handle
    pub fn proxy(&self) -> ProviderProxy {
        self.core.engine().clone()
    }

    pub fn chain_config(&self) -> ChainConfig {
        self.core.chain_config()
    }

    pub fn chain_id(&self) -> Option<String> {
        self.core.chain_id()
    }

    pub fn events(&self) -> &EventEmitter<ProviderEvent> {
        self.core.events()
    }

    pub async fn add_chain(&self, chain_config: ChainConfig) -> Result<()> {
        self.core.record_chain(chain_config)
    }

    pub async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        let ticket = self.core.issue_ticket();
        let chain_config = self.core.resolve_chain(chain_id)?;
        let pipeline = self.build_pipeline(&chain_config)?;
        if self.core.commit(ticket, pipeline, None) {
            info!(chain_id = %chain_config.chain_id, "switched pre-connection chain");
            self.core.lookup_network().await?;
        }
        Ok(())
    }

    /// Re-point the proxy at this provider's pipeline after a disconnect
    pub fn reattach(&self) {
        self.core.reattach();
    }
}

struct CommonChainHandlers {
    core: Weak<ProviderCore>,
}

impl CommonChainHandlers {
    fn provider(&self) -> Result<CommonRpcProvider> {
        self.core
            .upgrade()
            .map(|core| CommonRpcProvider { core })
            .ok_or_else(|| WalletError::NotReady("provider has been released".to_string()))
    }
}

#[async_trait]
impl ChainSwitchHandlers for CommonChainHandlers {
    async fn add_chain(&self, config: ChainConfig) -> Result<()> {
        self.provider()?.add_chain(config).await
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        self.provider()?.switch_chain(chain_id).await
    }
}
