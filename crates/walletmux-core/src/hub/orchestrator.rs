/*
[INPUT]:  Registered adapters and plugins, hub options, adapter lifecycle events
[OUTPUT]: One authoritative connection state, a stable provider proxy, unified hub events
[POS]:    Hub layer - adapter orchestrator
[UPDATE]: When changing lifecycle handling or the routed operations
*/

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::adapter::{
    Adapter, AdapterNamespace, AdapterSettings, Capability, DisconnectOptions, InitOptions,
    LoginParams, UserAuthInfo, UserInfo,
};
use crate::chain::{ChainConfig, ChainRegistry, resolve_chain_config};
use crate::error::{Result, WalletError};
use crate::events::{AdapterEvent, EventEmitter, HubEvent, ProviderEvent, SubscriptionId};
use crate::provider::{CommonRpcProvider, Provider, ProviderProxy};
use crate::rpc::HttpConfig;
use crate::storage::KeyValueStorage;
use crate::sync::lock;

use super::options::{ADAPTER_CACHE_KEY, HubOptions};
use super::plugins::{Plugin, PluginRegistry};
use super::state::{ConnectionState, StateMachine};

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct RegisteredAdapter {
    adapter: Arc<dyn Adapter>,
    subscription: Option<SubscriptionId>,
}

struct ProviderSubscription {
    provider: Arc<dyn Provider>,
    id: SubscriptionId,
}

struct HubInner {
    options: HubOptions,
    chain_config: ChainConfig,
    registry: Arc<dyn ChainRegistry>,
    storage: Arc<dyn KeyValueStorage>,
    http: HttpConfig,
    state: Mutex<StateMachine>,
    cached_adapter: Mutex<Option<String>>,
    adapters: Mutex<Vec<RegisteredAdapter>>,
    plugins: PluginRegistry,
    common: Mutex<Option<CommonRpcProvider>>,
    provider_subscription: Mutex<Option<ProviderSubscription>>,
    events: broadcast::Sender<HubEvent>,
}

/// Orchestrates adapters behind one provider handle.
///
/// The hub owns the connection state machine and is the only writer of it;
/// adapters influence it exclusively through the events they emit. Clones
/// share the same hub.
#[derive(Clone)]
pub struct Web3Hub {
    inner: Arc<HubInner>,
}

impl Web3Hub {
    pub fn new(
        options: HubOptions,
        storage: Arc<dyn KeyValueStorage>,
        registry: Arc<dyn ChainRegistry>,
    ) -> Result<Self> {
        Self::with_http_config(options, storage, registry, HttpConfig::default())
    }

    pub fn with_http_config(
        options: HubOptions,
        storage: Arc<dyn KeyValueStorage>,
        registry: Arc<dyn ChainRegistry>,
        http: HttpConfig,
    ) -> Result<Self> {
        options.validate()?;
        let chain_config = resolve_chain_config(&options.chain_config, registry.as_ref())?;

        let cached_adapter = if storage.is_available() {
            storage.get(ADAPTER_CACHE_KEY).unwrap_or_else(|e| {
                warn!(error = %e, "failed to read cached adapter");
                None
            })
        } else {
            None
        };

        info!(
            client_id = %options.client_id,
            namespace = %chain_config.chain_namespace,
            chain_id = %chain_config.chain_id,
            cached_adapter = ?cached_adapter,
            "hub created"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(HubInner {
                options,
                chain_config,
                registry,
                storage,
                http,
                state: Mutex::new(StateMachine::new()),
                cached_adapter: Mutex::new(cached_adapter),
                adapters: Mutex::new(Vec::new()),
                plugins: PluginRegistry::default(),
                common: Mutex::new(None),
                provider_subscription: Mutex::new(None),
                events,
            }),
        })
    }

    pub fn options(&self) -> &HubOptions {
        &self.inner.options
    }

    /// Chain the hub was configured with, registry defaults applied
    pub fn chain_config(&self) -> &ChainConfig {
        &self.inner.chain_config
    }

    pub fn status(&self) -> ConnectionState {
        lock(&self.inner.state).status()
    }

    pub fn connected_adapter_name(&self) -> Option<String> {
        lock(&self.inner.state).connected_adapter().map(str::to_string)
    }

    pub fn connected(&self) -> bool {
        lock(&self.inner.state).connected_adapter().is_some()
    }

    pub fn cached_adapter(&self) -> Option<String> {
        lock(&self.inner.cached_adapter).clone()
    }

    /// The long-lived provider handle; `None` until `init` has run
    pub fn provider(&self) -> Option<ProviderProxy> {
        lock(&self.inner.common).as_ref().map(CommonRpcProvider::proxy)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.inner.events.subscribe()
    }

    pub fn get_adapter(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        lock(&self.inner.adapters)
            .iter()
            .find(|entry| entry.adapter.name() == name)
            .map(|entry| entry.adapter.clone())
    }

    pub fn adapter_names(&self) -> Vec<String> {
        lock(&self.inner.adapters)
            .iter()
            .map(|entry| entry.adapter.name().to_string())
            .collect()
    }

    pub fn get_plugin(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.inner.plugins.get(name)
    }

    pub fn is_plugin_active(&self, name: &str) -> bool {
        self.inner.plugins.is_active(name)
    }

    /// Register an adapter; only allowed before `init`
    pub fn configure_adapter(&self, adapter: Arc<dyn Adapter>) -> Result<&Self> {
        match self.status() {
            ConnectionState::NotReady => {}
            ConnectionState::Connected => {
                return Err(WalletError::InvalidState("Already connected".to_string()));
            }
            ConnectionState::Connecting => {
                return Err(WalletError::InvalidState(
                    "Already pending connection".to_string(),
                ));
            }
            _ => {
                return Err(WalletError::InvalidState(
                    "Adapter is already initialized".to_string(),
                ));
            }
        }

        let descriptor = adapter.descriptor().clone();
        let hub_namespace = self.inner.chain_config.chain_namespace;
        if !descriptor.namespace.supports(hub_namespace) {
            return Err(WalletError::IncompatibleNamespace(format!(
                "adapter {} serves {} but the hub is configured for {hub_namespace}",
                descriptor.name, descriptor.namespace
            )));
        }

        let mut adapters = lock(&self.inner.adapters);
        if adapters.iter().any(|entry| entry.adapter.name() == descriptor.name) {
            return Err(WalletError::DuplicateRegistration(format!(
                "adapter {} is already registered",
                descriptor.name
            )));
        }

        let adapter_namespace = adapter.chain_config().map(|config| config.chain_namespace);
        if descriptor.namespace == AdapterNamespace::Multichain
            && adapter_namespace != Some(hub_namespace)
        {
            adapter.set_adapter_settings(AdapterSettings {
                chain_config: Some(self.inner.chain_config.clone()),
                ..AdapterSettings::default()
            })?;
        }

        info!(adapter = %descriptor.name, namespace = %descriptor.namespace, "adapter configured");
        adapters.push(RegisteredAdapter {
            adapter,
            subscription: None,
        });
        Ok(self)
    }

    pub fn add_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<&Self> {
        self.inner
            .plugins
            .register(plugin, self.inner.chain_config.chain_namespace)?;
        Ok(self)
    }

    /// Build the pre-connection provider and initialize every adapter.
    ///
    /// Per-adapter init failures are logged; the adapter that matches the
    /// cached identity is asked to restore its session.
    pub async fn init(&self) -> Result<()> {
        if self.status() != ConnectionState::NotReady {
            return Err(WalletError::InvalidState(
                "Hub is already initialized".to_string(),
            ));
        }

        let common = CommonRpcProvider::new(
            self.inner.chain_config.clone(),
            self.inner.registry.clone(),
            &self.inner.http,
        )
        .await?;
        {
            let mut slot = lock(&self.inner.common);
            if slot.is_some() {
                return Err(WalletError::InvalidState(
                    "Hub is already initialized".to_string(),
                ));
            }
            *slot = Some(common.clone());
        }
        self.forward_provider_events(common.events());

        let adapters = self.bind_adapters();
        self.transition(ConnectionState::Ready, None)?;

        let cached = self.cached_adapter();
        let results = join_all(adapters.iter().map(|adapter| {
            let auto_connect = cached.as_deref() == Some(adapter.name());
            async move {
                let result = adapter.init(InitOptions { auto_connect }).await;
                (adapter.name().to_string(), result)
            }
        }))
        .await;

        for (name, result) in results {
            if let Err(e) = result {
                error!(adapter = %name, error = %e, "adapter init failed");
            }
        }
        info!(adapters = adapters.len(), "hub initialized");
        Ok(())
    }

    /// Subscribe to every adapter and push the shared settings into it
    fn bind_adapters(&self) -> Vec<Arc<dyn Adapter>> {
        let mut entries = lock(&self.inner.adapters);
        for entry in entries.iter_mut() {
            if entry.subscription.is_none() {
                entry.subscription = Some(self.subscribe_adapter(&entry.adapter));
            }

            let settings = AdapterSettings {
                chain_config: entry
                    .adapter
                    .chain_config()
                    .is_none()
                    .then(|| self.inner.chain_config.clone()),
                client_id: Some(self.inner.options.client_id.clone()),
                session_time: Some(self.inner.options.session_time),
                network: Some(self.inner.options.network),
            };
            if let Err(e) = entry.adapter.set_adapter_settings(settings) {
                warn!(adapter = %entry.adapter.name(), error = %e, "failed to apply adapter settings");
            }
        }
        entries.iter().map(|entry| entry.adapter.clone()).collect()
    }

    fn subscribe_adapter(&self, adapter: &Arc<dyn Adapter>) -> SubscriptionId {
        let hub: Weak<HubInner> = Arc::downgrade(&self.inner);
        adapter.events().on(move |event| {
            let hub = hub.clone();
            async move {
                if let Some(inner) = hub.upgrade() {
                    Web3Hub { inner }.handle_adapter_event(event).await;
                }
            }
        })
    }

    /// Connect through `adapter_name`; a second attempt while one is pending fails
    pub async fn connect_to(
        &self,
        adapter_name: &str,
        params: LoginParams,
    ) -> Result<Option<ProviderProxy>> {
        let adapter = self.get_adapter(adapter_name).ok_or_else(|| {
            WalletError::NotFound(format!("adapter {adapter_name} is not registered"))
        })?;
        if self.provider().is_none() {
            return Err(WalletError::NotFound(
                "provider proxy is not initialized, call init first".to_string(),
            ));
        }

        self.transition(ConnectionState::Connecting, Some(adapter_name))
            .map_err(|_| match self.status() {
                ConnectionState::Connected => {
                    WalletError::InvalidState("Already connected".to_string())
                }
                ConnectionState::Connecting => {
                    WalletError::InvalidState("Already pending connection".to_string())
                }
                other => WalletError::InvalidState(format!("cannot connect while {other}")),
            })?;

        match adapter.connect(params).await {
            Ok(_) => {
                if self.is_connecting(adapter_name) {
                    warn!(adapter = adapter_name, "adapter connected without announcing it");
                    self.on_connected(adapter_name, false).await;
                }
                Ok(self.provider())
            }
            Err(e) => {
                if self.is_connecting(adapter_name) {
                    self.on_errored(adapter_name, e.to_string());
                }
                Err(e)
            }
        }
    }

    fn is_connecting(&self, adapter_name: &str) -> bool {
        let state = lock(&self.inner.state);
        state.status() == ConnectionState::Connecting
            && state.connecting_adapter().is_none_or(|name| name == adapter_name)
    }

    pub async fn logout(&self, options: DisconnectOptions) -> Result<()> {
        let adapter = self.connected_adapter()?;
        adapter.disconnect(options).await
    }

    pub async fn get_user_info(&self) -> Result<UserInfo> {
        let adapter = self.connected_adapter()?;
        require(&adapter, Capability::UserInfo)?;
        adapter.get_user_info().await
    }

    pub async fn authenticate_user(&self) -> Result<UserAuthInfo> {
        let adapter = self.connected_adapter()?;
        require(&adapter, Capability::Authenticate)?;
        adapter.authenticate_user().await
    }

    /// Add a chain on the connected adapter, or on the pre-connection provider
    pub async fn add_chain(&self, chain_config: ChainConfig) -> Result<()> {
        if self.connected() {
            let adapter = self.connected_adapter()?;
            require(&adapter, Capability::ChainAdd)?;
            return adapter.add_chain(chain_config).await;
        }
        self.common()?.add_chain(chain_config).await
    }

    /// Switch chain on the connected adapter, or on the pre-connection provider
    pub async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        if self.connected() {
            let adapter = self.connected_adapter()?;
            require(&adapter, Capability::ChainSwitch)?;
            return adapter.switch_chain(chain_id).await;
        }
        self.common()?.switch_chain(chain_id).await
    }

    pub async fn add_and_switch_chain(&self, chain_config: ChainConfig) -> Result<()> {
        let chain_id = chain_config.chain_id.clone();
        self.add_chain(chain_config).await?;
        self.switch_chain(&chain_id).await
    }

    /// Forget the cached adapter identity
    pub fn clear_cache(&self) {
        *lock(&self.inner.cached_adapter) = None;
        if !self.inner.storage.is_available() {
            return;
        }
        if let Err(e) = self.inner.storage.remove(ADAPTER_CACHE_KEY) {
            warn!(error = %e, "failed to clear cached adapter");
        }
    }

    fn cache_adapter(&self, name: &str) {
        *lock(&self.inner.cached_adapter) = Some(name.to_string());
        if !self.inner.storage.is_available() {
            return;
        }
        if let Err(e) = self.inner.storage.set(ADAPTER_CACHE_KEY, name) {
            warn!(adapter = name, error = %e, "failed to persist cached adapter");
        }
    }

    fn common(&self) -> Result<CommonRpcProvider> {
        lock(&self.inner.common)
            .clone()
            .ok_or_else(|| WalletError::NotReady("No wallet is ready".to_string()))
    }

    fn connected_adapter(&self) -> Result<Arc<dyn Adapter>> {
        let name = self
            .connected_adapter_name()
            .ok_or_else(|| WalletError::NotConnected("Not connected with wallet".to_string()))?;
        self.get_adapter(&name)
            .ok_or_else(|| WalletError::NotFound(format!("adapter {name} is not registered")))
    }

    fn transition(&self, to: ConnectionState, adapter: Option<&str>) -> Result<ConnectionState> {
        let from = lock(&self.inner.state).transition(to, adapter)?;
        self.announce(from, to, adapter);
        Ok(from)
    }

    fn announce(&self, from: ConnectionState, to: ConnectionState, adapter: Option<&str>) {
        info!(from = %from, to = %to, adapter = ?adapter, "hub status changed");
        self.publish(HubEvent::StatusChanged { from, to });
    }

    fn publish(&self, event: HubEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

    /// Rebroadcast a provider's notifications as hub events
    fn forward_provider_events(&self, events: &EventEmitter<ProviderEvent>) -> SubscriptionId {
        let sender = self.inner.events.clone();
        events.on(move |event| {
            let sender = sender.clone();
            async move {
                let _ = sender.send(HubEvent::Provider(event));
            }
        })
    }

    fn watch_provider(&self, provider: Arc<dyn Provider>) {
        self.unwatch_provider();
        let id = self.forward_provider_events(provider.events());
        *lock(&self.inner.provider_subscription) = Some(ProviderSubscription { provider, id });
    }

    fn unwatch_provider(&self) {
        let subscription = lock(&self.inner.provider_subscription).take();
        if let Some(subscription) = subscription {
            subscription.provider.events().off(subscription.id);
        }
    }

    /// Point the proxy back at the pre-connection provider
    fn restore_common_provider(&self) {
        if let Some(common) = lock(&self.inner.common).as_ref() {
            common.reattach();
        }
    }

    async fn handle_adapter_event(&self, event: AdapterEvent) {
        debug!(event = event.name(), adapter = event.adapter(), "adapter event");
        match event {
            AdapterEvent::Connecting { adapter } => self.on_connecting(adapter),
            AdapterEvent::Connected {
                adapter,
                reconnected,
            } => self.on_connected(&adapter, reconnected).await,
            AdapterEvent::Disconnected { adapter } => self.on_disconnected(&adapter).await,
            AdapterEvent::Errored { adapter, error } => self.on_errored(&adapter, error),
            AdapterEvent::AdapterDataUpdated { adapter, data } => {
                self.publish(HubEvent::AdapterDataUpdated { adapter, data });
            }
            AdapterEvent::CacheClear { adapter } => {
                debug!(adapter = %adapter, "adapter requested cache clear");
                self.clear_cache();
            }
        }
    }

    fn on_connecting(&self, adapter: String) {
        let claimed = {
            let state = lock(&self.inner.state);
            state.status() == ConnectionState::Connecting
                && state.connecting_adapter() == Some(adapter.as_str())
        };
        if !claimed {
            if let Err(e) = self.transition(ConnectionState::Connecting, Some(&adapter)) {
                warn!(adapter = %adapter, error = %e, "ignoring connecting event");
                return;
            }
        }
        self.publish(HubEvent::Connecting { adapter });
    }

    async fn on_connected(&self, name: &str, reconnected: bool) {
        let Some(adapter) = self.get_adapter(name) else {
            warn!(adapter = name, "connected event from unknown adapter");
            return;
        };
        let Some(provider) = adapter.provider() else {
            self.on_errored(name, "adapter connected without a provider".to_string());
            return;
        };
        let Some(proxy) = self.provider() else {
            warn!(adapter = name, "connected before init");
            return;
        };

        let from = {
            let mut state = lock(&self.inner.state);
            match state.transition(ConnectionState::Connected, Some(name)) {
                Ok(from) => {
                    proxy.update_delegate(provider.clone().handler());
                    from
                }
                Err(e) => {
                    warn!(adapter = name, error = %e, "ignoring connected event");
                    return;
                }
            }
        };
        self.announce(from, ConnectionState::Connected, Some(name));

        self.watch_provider(provider);
        self.cache_adapter(name);
        self.inner.plugins.activate(self, name).await;
        self.publish(HubEvent::Connected {
            adapter: name.to_string(),
            reconnected,
        });
    }

    async fn on_disconnected(&self, name: &str) {
        if self.connected_adapter_name().as_deref() != Some(name) {
            debug!(adapter = name, "ignoring disconnect from an adapter that is not connected");
            return;
        }

        self.unwatch_provider();
        self.restore_common_provider();
        if self.cached_adapter().as_deref() == Some(name) {
            self.clear_cache();
        }
        self.inner.plugins.deactivate_all().await;

        if let Err(e) = self.transition(ConnectionState::Ready, None) {
            warn!(adapter = name, error = %e, "hub left connected state early");
        }
        self.publish(HubEvent::Disconnected {
            adapter: name.to_string(),
        });
    }

    fn on_errored(&self, name: &str, error: String) {
        if let Some(connected) = self.connected_adapter_name() {
            if connected != name {
                warn!(adapter = name, connected = %connected, error = %error, "ignoring error from inactive adapter");
                return;
            }
            self.unwatch_provider();
            self.restore_common_provider();
        }

        if let Err(e) = self.transition(ConnectionState::Errored, None) {
            debug!(adapter = name, error = %e, "hub already errored");
        }
        self.clear_cache();
        self.publish(HubEvent::Errored {
            adapter: name.to_string(),
            error,
        });
    }
}

fn require(adapter: &Arc<dyn Adapter>, capability: Capability) -> Result<()> {
    if adapter.descriptor().supports(capability) {
        Ok(())
    } else {
        Err(WalletError::unsupported(adapter.name(), capability))
    }
}

impl fmt::Debug for Web3Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Web3Hub")
            .field("status", &self.status())
            .field("connected_adapter", &self.connected_adapter_name())
            .field("chain_id", &self.inner.chain_config.chain_id)
            .finish()
    }
}
