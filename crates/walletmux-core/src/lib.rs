/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public walletmux crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod adapter;
pub mod chain;
pub mod error;
pub mod events;
pub mod hub;
pub mod provider;
pub mod rpc;
pub mod storage;

mod sync;

// Re-export commonly used types from adapter
pub use adapter::{
    Adapter,
    AdapterDescriptor,
    AdapterKind,
    AdapterNamespace,
    Capability,
    Connector,
    ConnectorAdapter,
    ConnectorEvent,
    DisconnectOptions,
    LoginParams,
    MockConnector,
    UserAuthInfo,
    UserInfo,
};

// Re-export commonly used types from chain
pub use chain::{
    ChainConfig,
    ChainConfigInput,
    ChainNamespace,
    ChainRegistry,
    StaticChainRegistry,
};

pub use error::{Result, WalletError};

pub use events::{AdapterEvent, HubEvent, ProviderEvent};

// Re-export commonly used types from hub
pub use hub::{
    AuthNetwork,
    ConnectionState,
    HubOptions,
    Plugin,
    StorageKind,
    Web3Hub,
};

pub use provider::{Provider, ProviderProxy};

pub use rpc::{HttpConfig, RequestHandler, RpcRequest};

pub use storage::{JsonFileStorage, KeyValueStorage, MemoryStorage, UnavailableStorage};
