/*
[INPUT]:  Lifecycle changes from adapters, providers and the hub
[OUTPUT]: Typed event payloads per event name
[POS]:    Events layer - event vocabulary
[UPDATE]: When adding lifecycle notifications
*/

use serde::{Deserialize, Serialize};

use crate::hub::ConnectionState;

/// Lifecycle notifications emitted by an adapter and consumed by the hub
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    Connecting { adapter: String },
    Connected { adapter: String, reconnected: bool },
    Disconnected { adapter: String },
    Errored { adapter: String, error: String },
    AdapterDataUpdated { adapter: String, data: serde_json::Value },
    CacheClear { adapter: String },
}

impl AdapterEvent {
    pub fn adapter(&self) -> &str {
        match self {
            AdapterEvent::Connecting { adapter }
            | AdapterEvent::Connected { adapter, .. }
            | AdapterEvent::Disconnected { adapter }
            | AdapterEvent::Errored { adapter, .. }
            | AdapterEvent::AdapterDataUpdated { adapter, .. }
            | AdapterEvent::CacheClear { adapter } => adapter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdapterEvent::Connecting { .. } => "connecting",
            AdapterEvent::Connected { .. } => "connected",
            AdapterEvent::Disconnected { .. } => "disconnected",
            AdapterEvent::Errored { .. } => "errored",
            AdapterEvent::AdapterDataUpdated { .. } => "adapter_data_updated",
            AdapterEvent::CacheClear { .. } => "cache_clear",
        }
    }
}

/// Notifications emitted by a provider handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ProviderEvent {
    ChainChanged { chain_id: String },
    AccountsChanged { accounts: Vec<String> },
    Connect { chain_id: String },
    Disconnect,
}

/// Unified application events published by the hub
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    StatusChanged {
        from: ConnectionState,
        to: ConnectionState,
    },
    Connecting { adapter: String },
    Connected { adapter: String, reconnected: bool },
    Disconnected { adapter: String },
    Errored { adapter: String, error: String },
    AdapterDataUpdated { adapter: String, data: serde_json::Value },
    Provider(ProviderEvent),
}
