/*
[INPUT]:  A connected wallet backend and the chain it was connected on
[OUTPUT]: Provider with wallet methods, chain switching and backend event bridging
[POS]:    Provider layer - provider produced by connector-backed adapters
[UPDATE]: When changing the switch sequence or bridged backend events
*/

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterDescriptor, Capability, Connector, ConnectorEvent};
use crate::chain::{ChainConfig, ChainRegistry, normalize_chain_id, to_hex_chain_id};
use crate::error::{Result, WalletError};
use crate::events::{EventEmitter, ProviderEvent, SubscriptionId};
use crate::rpc::{
    AddChainParameter, ChainIdMiddleware, ChainSwitchHandlers, ChainSwitchMiddleware, HttpConfig,
    NetworkMiddleware, RequestHandler, RpcPipeline, RpcRequest, WalletHandlers, WalletMiddleware,
};
use crate::sync::lock;

use super::base::ProviderCore;
use super::Provider;

/// Provider over a connected wallet backend.
///
/// Pipeline order: chain identity, wallet methods, chain switching, network.
pub struct ConnectorProvider {
    core: ProviderCore,
    connector: Arc<dyn Connector>,
    descriptor: AdapterDescriptor,
    subscription: Mutex<Option<SubscriptionId>>,
    this: Weak<ConnectorProvider>,
}

impl ConnectorProvider {
    /// Build the provider, subscribe to backend events and resolve the network
    pub async fn connect(
        connector: Arc<dyn Connector>,
        descriptor: AdapterDescriptor,
        chain_config: ChainConfig,
        registry: Arc<dyn ChainRegistry>,
        http: &HttpConfig,
    ) -> Result<Arc<Self>> {
        let core = ProviderCore::new(chain_config.clone(), registry, http)?;
        let provider = Arc::new_cyclic(|this| Self {
            core,
            connector,
            descriptor,
            subscription: Mutex::new(None),
            this: this.clone(),
        });

        provider.subscribe_backend();
        let ticket = provider.core.issue_ticket();
        provider.setup_engine(ticket, chain_config)?;
        provider.core.lookup_network().await?;
        Ok(provider)
    }

    fn subscribe_backend(&self) {
        let this = self.this.clone();
        let id = self.connector.events().on(move |event| {
            let this = this.clone();
            async move {
                if let Some(provider) = this.upgrade() {
                    provider.on_backend_event(event).await;
                }
            }
        });
        *lock(&self.subscription) = Some(id);
    }

    fn build_pipeline(&self, chain_config: &ChainConfig) -> Result<RpcPipeline> {
        let handlers = Arc::new(ConnectorHandlers {
            provider: self.this.clone(),
        });
        let namespace = self.core.namespace();
        Ok(RpcPipeline::builder(chain_config.clone())
            .push(ChainIdMiddleware::new(chain_config)?)
            .push(WalletMiddleware::new(namespace, handlers.clone()))
            .push(ChainSwitchMiddleware::new(namespace, handlers))
            .push(NetworkMiddleware::new(self.core.client(), chain_config)?)
            .build())
    }

    /// Rebuild the pipeline for `chain_config` and commit it under `ticket`
    fn setup_engine(&self, ticket: u64, chain_config: ChainConfig) -> Result<bool> {
        let accounts = self.session_accounts();
        let pipeline = self.build_pipeline(&chain_config)?;
        Ok(self.core.commit(ticket, pipeline, Some(accounts)))
    }

    fn session_accounts(&self) -> Vec<String> {
        self.connector
            .session()
            .map(|session| session.addresses(self.core.namespace()))
            .unwrap_or_default()
    }

    /// Chain operations reach the backend only if the adapter declared them
    fn require(&self, capability: Capability) -> Result<()> {
        if self.descriptor.supports(capability) {
            Ok(())
        } else {
            Err(WalletError::unsupported(&self.descriptor.name, capability))
        }
    }

    fn is_account_allowed(&self, address: &str) -> bool {
        self.connector
            .session()
            .is_some_and(|session| session.is_account_allowed(self.core.namespace(), address))
    }

    pub fn chain_config(&self) -> ChainConfig {
        self.core.chain_config()
    }

    pub fn chain_id(&self) -> Option<String> {
        self.core.chain_id()
    }

    pub fn accounts(&self) -> Vec<String> {
        self.core.accounts()
    }

    pub async fn add_chain(&self, chain_config: ChainConfig) -> Result<()> {
        self.require(Capability::ChainAdd)?;
        if chain_config.chain_namespace != self.core.namespace() {
            return Err(WalletError::IncompatibleNamespace(format!(
                "cannot add {} chain {} to a {} provider",
                chain_config.chain_namespace,
                chain_config.chain_id,
                self.core.namespace()
            )));
        }
        let current = self.core.chain_config().chain_id;
        self.connector
            .add_chain(&current, AddChainParameter::from_chain_config(&chain_config))
            .await?;
        self.core.record_chain(chain_config)
    }

    /// Switch the backend and this provider to `chain_id`.
    ///
    /// When a later switch commits first this one leaves the provider alone
    /// and still returns Ok.
    pub async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        self.require(Capability::ChainSwitch)?;
        let ticket = self.core.issue_ticket();
        let chain_config = self.core.resolve_chain(chain_id)?;
        let current = self.core.chain_config().chain_id;

        self.connector
            .switch_chain(&current, &chain_config.chain_id)
            .await?;

        let target = chain_config.chain_id.clone();
        if self.setup_engine(ticket, chain_config)? {
            info!(from = %current, to = %target, "switched wallet chain");
            self.core.lookup_network().await?;
        }
        Ok(())
    }

    /// Stop listening to the backend and announce the disconnect
    pub async fn teardown(&self) {
        let id = lock(&self.subscription).take();
        if let Some(id) = id {
            self.connector.events().off(id);
            self.core.events().emit(ProviderEvent::Disconnect).await;
        }
    }

    async fn on_backend_event(&self, event: ConnectorEvent) {
        let ConnectorEvent::SessionEvent { name, data } = event else {
            return;
        };
        match name.as_str() {
            "accountsChanged" => self.on_accounts_changed(data).await,
            "chainChanged" => self.on_chain_changed(data).await,
            other => debug!(event = other, "ignoring session event"),
        }
    }

    async fn on_accounts_changed(&self, data: Value) {
        let accounts: Vec<String> = match serde_json::from_value(data) {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "malformed accountsChanged payload");
                return;
            }
        };
        let Some(first) = accounts.first() else {
            return;
        };
        if self.core.accounts().first() == Some(first) {
            return;
        }
        if !self.is_account_allowed(first) {
            warn!(account = %first, "ignoring account not approved by the session");
            return;
        }

        self.core.set_accounts(accounts.clone());
        self.core
            .events()
            .emit(ProviderEvent::AccountsChanged { accounts })
            .await;
    }

    async fn on_chain_changed(&self, data: Value) {
        let chain_id = match &data {
            Value::Number(n) => n.as_u64().map(to_hex_chain_id),
            Value::String(s) => normalize_chain_id(s).ok(),
            _ => None,
        };
        let Some(chain_id) = chain_id else {
            warn!(payload = %data, "malformed chainChanged payload");
            return;
        };
        if self.core.chain_id().as_deref() == Some(chain_id.as_str()) {
            return;
        }

        let chain_config = match self.core.resolve_chain(&chain_id) {
            Ok(config) => config,
            Err(e) => {
                warn!(chain_id = %chain_id, error = %e, "wallet moved to an unconfigured chain");
                return;
            }
        };
        let ticket = self.core.issue_ticket();
        match self.setup_engine(ticket, chain_config) {
            Ok(true) => {
                if let Err(e) = self.core.lookup_network().await {
                    warn!(error = %e, "failed to resolve network after wallet chain change");
                }
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "failed to rebuild provider after wallet chain change"),
        }
    }
}

#[async_trait]
impl RequestHandler for ConnectorProvider {
    async fn request(&self, request: RpcRequest) -> Result<Value> {
        self.core.engine().request(request).await
    }
}

impl Provider for ConnectorProvider {
    fn events(&self) -> &EventEmitter<ProviderEvent> {
        self.core.events()
    }

    fn chain_id(&self) -> Option<String> {
        self.core.chain_id()
    }

    fn accounts(&self) -> Vec<String> {
        self.core.accounts()
    }

    fn handler(self: Arc<Self>) -> Arc<dyn RequestHandler> {
        self
    }
}

struct ConnectorHandlers {
    provider: Weak<ConnectorProvider>,
}

impl ConnectorHandlers {
    fn provider(&self) -> Result<Arc<ConnectorProvider>> {
        self.provider
            .upgrade()
            .ok_or_else(|| WalletError::NotConnected("provider has been released".to_string()))
    }
}

#[async_trait]
impl WalletHandlers for ConnectorHandlers {
    async fn get_accounts(&self) -> Result<Vec<String>> {
        Ok(self.provider()?.accounts())
    }

    async fn process_request(&self, request: RpcRequest) -> Result<Value> {
        let provider = self.provider()?;
        let chain_id = provider.chain_config().chain_id;
        provider.connector.request(&chain_id, request).await
    }
}

#[async_trait]
impl ChainSwitchHandlers for ConnectorHandlers {
    async fn add_chain(&self, config: ChainConfig) -> Result<()> {
        self.provider()?.add_chain(config).await
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        self.provider()?.switch_chain(chain_id).await
    }
}
