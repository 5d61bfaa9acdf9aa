/*
[INPUT]:  Adapter descriptors, settings pushed by the hub, lifecycle transitions
[OUTPUT]: Status tracking, capability checks and lifecycle events
[POS]:    Adapter layer - shared bookkeeping for adapter implementations
[UPDATE]: When changing adapter status rules
*/

use std::sync::Mutex;

use tracing::{debug, error};

use crate::chain::ChainConfig;
use crate::error::{Result, WalletError};
use crate::events::{AdapterEvent, EventEmitter};
use crate::hub::ConnectionState;
use crate::sync::lock;

use super::types::{AdapterDescriptor, AdapterSettings, Capability};

/// State every adapter keeps, independent of its backend
pub struct AdapterBase {
    descriptor: AdapterDescriptor,
    status: Mutex<ConnectionState>,
    settings: Mutex<AdapterSettings>,
    events: EventEmitter<AdapterEvent>,
}

impl AdapterBase {
    pub fn new(descriptor: AdapterDescriptor) -> Self {
        Self {
            descriptor,
            status: Mutex::new(ConnectionState::NotReady),
            settings: Mutex::new(AdapterSettings::default()),
            events: EventEmitter::new(),
        }
    }

    pub fn descriptor(&self) -> &AdapterDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn events(&self) -> &EventEmitter<AdapterEvent> {
        &self.events
    }

    pub fn status(&self) -> ConnectionState {
        *lock(&self.status)
    }

    pub fn set_status(&self, status: ConnectionState) {
        let previous = std::mem::replace(&mut *lock(&self.status), status);
        if previous != status {
            debug!(adapter = %self.descriptor.name, from = %previous, to = %status, "adapter status");
        }
    }

    pub fn settings(&self) -> AdapterSettings {
        lock(&self.settings).clone()
    }

    pub fn chain_config(&self) -> Option<ChainConfig> {
        lock(&self.settings).chain_config.clone()
    }

    /// Merge settings; fields left unset keep their previous value
    pub fn apply_settings(&self, settings: AdapterSettings) -> Result<()> {
        if matches!(
            self.status(),
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Err(WalletError::InvalidState(format!(
                "cannot change settings of {} while connected",
                self.descriptor.name
            )));
        }
        let mut current = lock(&self.settings);
        if settings.chain_config.is_some() {
            current.chain_config = settings.chain_config;
        }
        if settings.client_id.is_some() {
            current.client_id = settings.client_id;
        }
        if settings.session_time.is_some() {
            current.session_time = settings.session_time;
        }
        if settings.network.is_some() {
            current.network = settings.network;
        }
        Ok(())
    }

    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.descriptor.supports(capability) {
            Ok(())
        } else {
            Err(WalletError::unsupported(&self.descriptor.name, capability))
        }
    }

    pub fn require_connected(&self) -> Result<()> {
        if self.status() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(WalletError::NotConnected(format!(
                "{} is not connected",
                self.descriptor.name
            )))
        }
    }

    /// Check that a connection may start and claim CONNECTING
    pub fn begin_connect(&self) -> Result<()> {
        let mut status = lock(&self.status);
        match *status {
            ConnectionState::NotReady => Err(WalletError::NotReady(format!(
                "{} is not initialized",
                self.descriptor.name
            ))),
            ConnectionState::Connecting => Err(WalletError::InvalidState(format!(
                "{} is already connecting",
                self.descriptor.name
            ))),
            ConnectionState::Connected => Err(WalletError::InvalidState(format!(
                "{} is already connected",
                self.descriptor.name
            ))),
            _ => {
                *status = ConnectionState::Connecting;
                Ok(())
            }
        }
    }

    pub async fn emit_connecting(&self) {
        self.emit(AdapterEvent::Connecting {
            adapter: self.descriptor.name.clone(),
        })
        .await;
    }

    pub async fn emit_connected(&self, reconnected: bool) {
        self.emit(AdapterEvent::Connected {
            adapter: self.descriptor.name.clone(),
            reconnected,
        })
        .await;
    }

    pub async fn emit_disconnected(&self) {
        self.emit(AdapterEvent::Disconnected {
            adapter: self.descriptor.name.clone(),
        })
        .await;
    }

    pub async fn emit_errored(&self, err: &WalletError) {
        error!(adapter = %self.descriptor.name, error = %err, "adapter failed");
        self.emit(AdapterEvent::Errored {
            adapter: self.descriptor.name.clone(),
            error: err.to_string(),
        })
        .await;
    }

    pub async fn emit_data_updated(&self, data: serde_json::Value) {
        self.emit(AdapterEvent::AdapterDataUpdated {
            adapter: self.descriptor.name.clone(),
            data,
        })
        .await;
    }

    pub async fn emit_cache_clear(&self) {
        self.emit(AdapterEvent::CacheClear {
            adapter: self.descriptor.name.clone(),
        })
        .await;
    }

    async fn emit(&self, event: AdapterEvent) {
        self.events.emit(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterKind, AdapterNamespace};

    fn base() -> AdapterBase {
        AdapterBase::new(
            AdapterDescriptor::new("wallet", AdapterNamespace::Eip155, AdapterKind::Injected)
                .with_capability(Capability::ChainSwitch),
        )
    }

    #[test]
    fn test_require_capability() {
        let base = base();
        assert!(base.require(Capability::ChainSwitch).is_ok());
        let err = base.require(Capability::UserInfo).unwrap_err();
        assert!(matches!(err, WalletError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_begin_connect_rules() {
        let base = base();
        assert!(matches!(base.begin_connect(), Err(WalletError::NotReady(_))));
        base.set_status(ConnectionState::Ready);
        assert!(base.begin_connect().is_ok());
        assert!(matches!(base.begin_connect(), Err(WalletError::InvalidState(_))));
    }

    #[test]
    fn test_settings_merge_and_lock_while_connected() {
        let base = base();
        base.apply_settings(AdapterSettings {
            client_id: Some("client".into()),
            session_time: Some(60),
            ..AdapterSettings::default()
        })
        .unwrap();
        base.apply_settings(AdapterSettings {
            session_time: Some(120),
            ..AdapterSettings::default()
        })
        .unwrap();
        let settings = base.settings();
        assert_eq!(settings.client_id.as_deref(), Some("client"));
        assert_eq!(settings.session_time, Some(120));

        base.set_status(ConnectionState::Connected);
        assert!(base.apply_settings(AdapterSettings::default()).is_err());
    }
}
