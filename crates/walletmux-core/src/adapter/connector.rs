/*
[INPUT]:  A wallet backend (Connector), hub settings and login params
[OUTPUT]: Adapter lifecycle, connector-backed providers, lifecycle events
[POS]:    Adapter layer - generic adapter over any Connector implementation
[UPDATE]: When changing connect/disconnect sequencing
*/

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::chain::{ChainConfig, ChainRegistry, StaticChainRegistry};
use crate::error::{Result, WalletError};
use crate::events::{AdapterEvent, EventEmitter, SubscriptionId};
use crate::hub::ConnectionState;
use crate::provider::{ConnectorProvider, Provider};
use crate::rpc::HttpConfig;
use crate::sync::lock;

use super::base::AdapterBase;
use super::traits::{Adapter, Connector, ConnectorEvent};
use super::types::{
    AdapterDescriptor, AdapterSettings, Capability, DisconnectOptions, InitOptions, LoginParams,
    UserAuthInfo, UserInfo,
};

/// Adapter that delegates wallet work to a [`Connector`]
pub struct ConnectorAdapter {
    base: AdapterBase,
    connector: Arc<dyn Connector>,
    registry: Arc<dyn ChainRegistry>,
    http: HttpConfig,
    provider: Mutex<Option<Arc<ConnectorProvider>>>,
    session_subscription: Mutex<Option<SubscriptionId>>,
    this: Weak<ConnectorAdapter>,
}

impl ConnectorAdapter {
    pub fn new(descriptor: AdapterDescriptor, connector: Arc<dyn Connector>) -> Arc<Self> {
        Self::with_registry(
            descriptor,
            connector,
            Arc::new(StaticChainRegistry::new()),
            HttpConfig::default(),
        )
    }

    pub fn with_registry(
        descriptor: AdapterDescriptor,
        connector: Arc<dyn Connector>,
        registry: Arc<dyn ChainRegistry>,
        http: HttpConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            base: AdapterBase::new(descriptor),
            connector,
            registry,
            http,
            provider: Mutex::new(None),
            session_subscription: Mutex::new(None),
            this: this.clone(),
        })
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    fn connected_provider(&self) -> Result<Arc<ConnectorProvider>> {
        self.base.require_connected()?;
        lock(&self.provider).clone().ok_or_else(|| {
            WalletError::NotConnected(format!("{} has no provider", self.base.name()))
        })
    }

    fn watch_session(&self) {
        let mut subscription = lock(&self.session_subscription);
        if subscription.is_some() {
            return;
        }
        let this = self.this.clone();
        *subscription = Some(self.connector.events().on(move |event| {
            let this = this.clone();
            async move {
                if let Some(adapter) = this.upgrade() {
                    adapter.on_session_event(event).await;
                }
            }
        }));
    }

    async fn on_session_event(&self, event: ConnectorEvent) {
        match event {
            ConnectorEvent::SessionUpdate { session } => match serde_json::to_value(&session) {
                Ok(data) => self.base.emit_data_updated(data).await,
                Err(e) => warn!(error = %e, "failed to encode session update"),
            },
            ConnectorEvent::SessionDelete => {
                if self.base.status() != ConnectionState::Connected {
                    return;
                }
                info!(adapter = %self.base.name(), "wallet ended the session");
                if let Err(e) = self.close(false).await {
                    warn!(adapter = %self.base.name(), error = %e, "failed to close deleted session");
                }
                self.base.emit_cache_clear().await;
            }
            ConnectorEvent::SessionEvent { .. } => {}
        }
    }

    async fn open(&self, params: LoginParams, reconnected: bool) -> Result<Arc<dyn Provider>> {
        let chain_config = self.base.chain_config().ok_or_else(|| {
            WalletError::InvalidParams(format!("{} has no chain config", self.base.name()))
        })?;
        self.base.require(Capability::Login)?;
        self.base.begin_connect()?;
        self.base.emit_connecting().await;

        match self.establish(&chain_config, &params).await {
            Ok(provider) => {
                *lock(&self.provider) = Some(provider.clone());
                self.base.set_status(ConnectionState::Connected);
                info!(adapter = %self.base.name(), chain_id = %chain_config.chain_id, reconnected, "adapter connected");
                self.base.emit_connected(reconnected).await;
                Ok(provider as Arc<dyn Provider>)
            }
            Err(e) => {
                self.base.set_status(ConnectionState::Errored);
                self.base.emit_errored(&e).await;
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        chain_config: &ChainConfig,
        params: &LoginParams,
    ) -> Result<Arc<ConnectorProvider>> {
        self.connector.connect(chain_config, params).await?;
        ConnectorProvider::connect(
            self.connector.clone(),
            self.base.descriptor().clone(),
            chain_config.clone(),
            self.registry.clone(),
            &self.http,
        )
        .await
    }

    /// Release the provider and the backend session, then announce the disconnect
    async fn close(&self, cleanup: bool) -> Result<()> {
        let provider = lock(&self.provider).take();
        if let Some(provider) = provider {
            provider.teardown().await;
        }
        let result = self.connector.disconnect().await;

        if cleanup {
            if let Some(id) = lock(&self.session_subscription).take() {
                self.connector.events().off(id);
            }
            self.base.set_status(ConnectionState::NotReady);
        } else {
            self.base.set_status(ConnectionState::Ready);
        }
        self.base.emit_disconnected().await;
        result
    }
}

#[async_trait]
impl Adapter for ConnectorAdapter {
    fn descriptor(&self) -> &AdapterDescriptor {
        self.base.descriptor()
    }

    fn status(&self) -> ConnectionState {
        self.base.status()
    }

    fn provider(&self) -> Option<Arc<dyn Provider>> {
        let provider = lock(&self.provider).clone()?;
        Some(provider as Arc<dyn Provider>)
    }

    fn events(&self) -> &EventEmitter<AdapterEvent> {
        self.base.events()
    }

    fn chain_config(&self) -> Option<ChainConfig> {
        self.base.chain_config()
    }

    fn set_adapter_settings(&self, settings: AdapterSettings) -> Result<()> {
        self.base.apply_settings(settings)
    }

    async fn init(&self, options: InitOptions) -> Result<()> {
        if self.base.status() == ConnectionState::NotReady {
            self.base.set_status(ConnectionState::Ready);
        }
        self.watch_session();

        if options.auto_connect && self.connector.session().is_some() {
            info!(adapter = %self.base.name(), "restoring cached session");
            self.open(LoginParams::default(), true).await?;
        }
        Ok(())
    }

    async fn connect(&self, params: LoginParams) -> Result<Arc<dyn Provider>> {
        self.open(params, false).await
    }

    async fn disconnect(&self, options: DisconnectOptions) -> Result<()> {
        self.base.require_connected()?;
        self.close(options.cleanup).await
    }

    async fn add_chain(&self, chain_config: ChainConfig) -> Result<()> {
        self.base.require(Capability::ChainAdd)?;
        self.connected_provider()?.add_chain(chain_config).await
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        self.base.require(Capability::ChainSwitch)?;
        self.connected_provider()?.switch_chain(chain_id).await
    }

    async fn get_user_info(&self) -> Result<UserInfo> {
        self.base.require(Capability::UserInfo)?;
        self.base.require_connected()?;
        self.connector.user_info().await
    }

    async fn authenticate_user(&self) -> Result<UserAuthInfo> {
        self.base.require(Capability::Authenticate)?;
        self.base.require_connected()?;
        self.connector.authenticate().await
    }
}
