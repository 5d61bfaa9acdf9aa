/*
[INPUT]:  Test configuration and mock backend requirements
[OUTPUT]: Shared fixtures: hubs, scripted adapters, recording plugins, event helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for walletmux-core tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use walletmux_core::adapter::CapabilitySet;
use walletmux_core::{
    AdapterDescriptor, AdapterKind, AdapterNamespace, ChainConfigInput, ChainNamespace,
    ConnectionState, ConnectorAdapter, HubEvent, HubOptions, KeyValueStorage, MemoryStorage,
    MockConnector, Plugin, ProviderEvent, Result, StaticChainRegistry, WalletError, Web3Hub,
};
use wiremock::MockServer;

pub const ACCOUNT_A: &str = "0xAbC0000000000000000000000000000000000001";
pub const ACCOUNT_B: &str = "0x2222222222222222222222222222222222222222";
pub const OUTSIDER: &str = "0x9999999999999999999999999999999999999999";

/// Setup a mock JSON-RPC target for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn hub_options(chain_id: &str) -> HubOptions {
    HubOptions::new(
        "test-client-id",
        ChainConfigInput::new(ChainNamespace::Eip155, chain_id),
    )
}

pub fn new_hub(storage: Arc<dyn KeyValueStorage>) -> Web3Hub {
    Web3Hub::new(hub_options("0x1"), storage, Arc::new(StaticChainRegistry::new()))
        .expect("valid hub options")
}

pub fn memory_hub() -> Web3Hub {
    new_hub(Arc::new(MemoryStorage::new()))
}

pub fn eip155_connector() -> Arc<MockConnector> {
    Arc::new(MockConnector::new(ChainNamespace::Eip155, &[ACCOUNT_A, ACCOUNT_B]))
}

/// EIP-155 adapter declaring every capability
pub fn full_adapter(name: &str, connector: Arc<MockConnector>) -> Arc<ConnectorAdapter> {
    let mut descriptor =
        AdapterDescriptor::new(name, AdapterNamespace::Eip155, AdapterKind::RemoteSession);
    descriptor.capabilities = CapabilitySet::all();
    ConnectorAdapter::new(descriptor, connector)
}

/// EIP-155 adapter declaring only login
pub fn login_only_adapter(name: &str, connector: Arc<MockConnector>) -> Arc<ConnectorAdapter> {
    ConnectorAdapter::new(
        AdapterDescriptor::new(name, AdapterNamespace::Eip155, AdapterKind::Injected),
        connector,
    )
}

/// Everything published so far, without waiting
pub fn drain(rx: &mut broadcast::Receiver<HubEvent>) -> Vec<HubEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn status_changes(events: &[HubEvent]) -> Vec<(ConnectionState, ConnectionState)> {
    events
        .iter()
        .filter_map(|event| match event {
            HubEvent::StatusChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

pub fn provider_events(events: &[HubEvent]) -> Vec<ProviderEvent> {
    events
        .iter()
        .filter_map(|event| match event {
            HubEvent::Provider(event) => Some(event.clone()),
            _ => None,
        })
        .collect()
}

/// Let spawned tasks run until `hub` reaches `status`
pub async fn wait_for_status(hub: &Web3Hub, status: ConnectionState) {
    for _ in 0..100 {
        if hub.status() == status {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("hub never reached {status}, stuck at {}", hub.status());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginMode {
    Works,
    RejectsAdapter,
    Fails,
}

/// Plugin that records every hook call
pub struct RecordingPlugin {
    name: String,
    namespace: AdapterNamespace,
    supported: Vec<String>,
    mode: PluginMode,
    calls: Mutex<Vec<String>>,
}

impl RecordingPlugin {
    pub fn new(name: &str, namespace: AdapterNamespace, mode: PluginMode) -> Self {
        Self {
            name: name.to_string(),
            namespace,
            supported: Vec::new(),
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn supporting(mut self, adapters: &[&str]) -> Self {
        self.supported = adapters.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> AdapterNamespace {
        self.namespace
    }

    fn supported_adapters(&self) -> Vec<String> {
        self.supported.clone()
    }

    async fn init_with_hub(&self, hub: &Web3Hub) -> Result<()> {
        let connected = hub.connected_adapter_name().unwrap_or_default();
        self.record(format!("init:{connected}"));
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        self.record("connect".to_string());
        match self.mode {
            PluginMode::Works => Ok(()),
            PluginMode::RejectsAdapter => Err(WalletError::UnsupportedAdapter(self.name.clone())),
            PluginMode::Fails => Err(WalletError::Plugin("boom".to_string())),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.record("disconnect".to_string());
        match self.mode {
            PluginMode::Fails => Err(WalletError::Plugin("boom".to_string())),
            PluginMode::RejectsAdapter => Err(WalletError::UnsupportedAdapter(self.name.clone())),
            PluginMode::Works => Ok(()),
        }
    }
}
