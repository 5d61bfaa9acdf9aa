/*
[INPUT]:  Hub orchestration calls; backend session activity
[OUTPUT]: Adapter and connector contracts
[POS]:    Adapter layer - trait seams between the hub, adapters and wallet backends
[UPDATE]: When adding adapter operations or backend hooks
*/

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::chain::ChainConfig;
use crate::error::Result;
use crate::events::{AdapterEvent, EventEmitter};
use crate::hub::ConnectionState;
use crate::provider::Provider;
use crate::rpc::{AddChainParameter, RpcRequest};

use super::session::SessionData;
use super::types::{
    AdapterDescriptor, AdapterSettings, DisconnectOptions, InitOptions, LoginParams, UserAuthInfo,
    UserInfo,
};

/// One wallet connection method managed by the hub.
///
/// Adapters report lifecycle changes through [`Adapter::events`]; the hub
/// subscribes during init and drives its own state from those events.
/// Operations outside the declared capability set fail with
/// `UnsupportedOperation`.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn descriptor(&self) -> &AdapterDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn status(&self) -> ConnectionState;

    /// Provider of the active connection
    fn provider(&self) -> Option<Arc<dyn Provider>>;

    fn events(&self) -> &EventEmitter<AdapterEvent>;

    fn chain_config(&self) -> Option<ChainConfig>;

    fn set_adapter_settings(&self, settings: AdapterSettings) -> Result<()>;

    async fn init(&self, options: InitOptions) -> Result<()>;

    async fn connect(&self, params: LoginParams) -> Result<Arc<dyn Provider>>;

    async fn disconnect(&self, options: DisconnectOptions) -> Result<()>;

    async fn add_chain(&self, chain_config: ChainConfig) -> Result<()>;

    async fn switch_chain(&self, chain_id: &str) -> Result<()>;

    async fn get_user_info(&self) -> Result<UserInfo>;

    async fn authenticate_user(&self) -> Result<UserAuthInfo>;
}

/// Activity reported by a wallet backend
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorEvent {
    /// Named session event, e.g. `accountsChanged` or `chainChanged`
    SessionEvent { name: String, data: Value },
    SessionUpdate { session: SessionData },
    /// The wallet ended the session
    SessionDelete,
}

/// Wallet backend behind a [`ConnectorAdapter`](super::ConnectorAdapter)
#[async_trait]
pub trait Connector: Send + Sync {
    fn events(&self) -> &EventEmitter<ConnectorEvent>;

    /// Current session, if one is established
    fn session(&self) -> Option<SessionData>;

    async fn connect(&self, chain_config: &ChainConfig, params: &LoginParams) -> Result<SessionData>;

    async fn disconnect(&self) -> Result<()>;

    /// Perform a wallet-side method (signing, transactions)
    async fn request(&self, chain_id: &str, request: RpcRequest) -> Result<Value>;

    async fn switch_chain(&self, from_chain_id: &str, to_chain_id: &str) -> Result<()>;

    async fn add_chain(&self, current_chain_id: &str, params: AddChainParameter) -> Result<()>;

    async fn user_info(&self) -> Result<UserInfo>;

    async fn authenticate(&self) -> Result<UserAuthInfo>;
}
