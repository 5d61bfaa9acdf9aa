/*
[INPUT]:  Scripted accounts, delays, failures and injected backend events
[OUTPUT]: A deterministic in-process wallet backend
[POS]:    Adapter layer - scriptable Connector for integration tests
[UPDATE]: When connectors gain new operations
*/

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;
use tracing::debug;

use crate::chain::{ChainConfig, ChainNamespace, parse_chain_id};
use crate::error::{Result, WalletError};
use crate::events::EventEmitter;
use crate::rpc::{AddChainParameter, RpcRequest};
use crate::sync::lock;

use super::session::{SessionData, SessionNamespace};
use super::traits::{Connector, ConnectorEvent};
use super::types::{LoginParams, UserAuthInfo, UserInfo};

#[derive(Default)]
struct MockState {
    session: Option<SessionData>,
    connect_error: Option<String>,
    switch_delays: HashMap<String, Duration>,
    switched: Vec<String>,
    added: Vec<String>,
    requests: Vec<RpcRequest>,
    user_info: Option<UserInfo>,
}

/// In-process wallet backend whose behavior is scripted up front
pub struct MockConnector {
    namespace: ChainNamespace,
    accounts: Vec<String>,
    connect_gate: Option<Arc<Notify>>,
    events: EventEmitter<ConnectorEvent>,
    state: Mutex<MockState>,
}

impl MockConnector {
    pub fn new(namespace: ChainNamespace, accounts: &[&str]) -> Self {
        Self {
            namespace,
            accounts: accounts.iter().map(|a| a.to_string()).collect(),
            connect_gate: None,
            events: EventEmitter::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Hold every `connect` until the gate is notified
    pub fn with_connect_gate(mut self, gate: Arc<Notify>) -> Self {
        self.connect_gate = Some(gate);
        self
    }

    pub fn with_switch_delay(self, chain_id: &str, delay: Duration) -> Self {
        lock(&self.state)
            .switch_delays
            .insert(chain_id.to_string(), delay);
        self
    }

    pub fn with_user_info(self, user_info: UserInfo) -> Self {
        lock(&self.state).user_info = Some(user_info);
        self
    }

    /// Start with a session, as if restored from a previous run
    pub fn with_existing_session(self, chain_id: &str) -> Self {
        let session = self.build_session(chain_id);
        lock(&self.state).session = Some(session);
        self
    }

    pub fn fail_connect(&self, message: &str) {
        lock(&self.state).connect_error = Some(message.to_string());
    }

    pub fn switched_chains(&self) -> Vec<String> {
        lock(&self.state).switched.clone()
    }

    pub fn added_chains(&self) -> Vec<String> {
        lock(&self.state).added.clone()
    }

    pub fn requests(&self) -> Vec<String> {
        lock(&self.state)
            .requests
            .iter()
            .map(|r| r.method.clone())
            .collect()
    }

    pub async fn emit_session_event(&self, name: &str, data: Value) {
        self.events
            .emit(ConnectorEvent::SessionEvent {
                name: name.to_string(),
                data,
            })
            .await;
    }

    /// Push the current session back out, as a wallet does after it edits one
    pub async fn emit_session_update(&self) {
        let session = lock(&self.state).session.clone();
        if let Some(session) = session {
            self.events
                .emit(ConnectorEvent::SessionUpdate { session })
                .await;
        }
    }

    /// Drop the session as the wallet would
    pub async fn delete_session(&self) {
        lock(&self.state).session = None;
        self.events.emit(ConnectorEvent::SessionDelete).await;
    }

    fn build_session(&self, chain_id: &str) -> SessionData {
        let reference = parse_chain_id(chain_id)
            .map(|id| id.to_string())
            .unwrap_or_else(|_| chain_id.to_string());
        let key = self.namespace.as_str().to_string();
        let accounts = self
            .accounts
            .iter()
            .map(|address| format!("{key}:{reference}:{address}"))
            .collect();
        let mut namespaces = BTreeMap::new();
        namespaces.insert(
            key.clone(),
            SessionNamespace {
                accounts,
                chains: vec![format!("{key}:{reference}")],
                ..SessionNamespace::default()
            },
        );
        SessionData {
            topic: format!("mock-{reference}"),
            namespaces,
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn events(&self) -> &EventEmitter<ConnectorEvent> {
        &self.events
    }

    fn session(&self) -> Option<SessionData> {
        lock(&self.state).session.clone()
    }

    async fn connect(&self, chain_config: &ChainConfig, _params: &LoginParams) -> Result<SessionData> {
        if let Some(gate) = &self.connect_gate {
            gate.notified().await;
        }
        let mut state = lock(&self.state);
        if let Some(message) = state.connect_error.take() {
            return Err(WalletError::Connector(message));
        }
        let session = self.build_session(&chain_config.chain_id);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn disconnect(&self) -> Result<()> {
        lock(&self.state).session = None;
        Ok(())
    }

    async fn request(&self, chain_id: &str, request: RpcRequest) -> Result<Value> {
        debug!(method = %request.method, chain_id, "mock wallet request");
        let method = request.method.clone();
        lock(&self.state).requests.push(request);
        Ok(json!(format!("0xsigned:{method}:{chain_id}")))
    }

    async fn switch_chain(&self, _from_chain_id: &str, to_chain_id: &str) -> Result<()> {
        let delay = lock(&self.state).switch_delays.get(to_chain_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.state).switched.push(to_chain_id.to_string());
        Ok(())
    }

    async fn add_chain(&self, _current_chain_id: &str, params: AddChainParameter) -> Result<()> {
        lock(&self.state).added.push(params.chain_id);
        Ok(())
    }

    async fn user_info(&self) -> Result<UserInfo> {
        lock(&self.state)
            .user_info
            .clone()
            .ok_or_else(|| WalletError::Connector("no user profile available".to_string()))
    }

    async fn authenticate(&self) -> Result<UserAuthInfo> {
        let address = self
            .accounts
            .first()
            .ok_or_else(|| WalletError::Connector("no account to authenticate".to_string()))?;
        Ok(UserAuthInfo {
            id_token: format!("mock-id-token.{address}"),
        })
    }
}
