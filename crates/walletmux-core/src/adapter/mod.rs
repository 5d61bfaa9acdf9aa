/*
[INPUT]:  Wallet backends and hub settings
[OUTPUT]: Adapters the hub can register, connect and disconnect
[POS]:    Adapter layer - wallet connection methods
[UPDATE]: When adding adapter kinds or backend contracts
*/

pub mod base;
pub mod connector;
pub mod mock;
pub mod session;
pub mod traits;
pub mod types;

pub use base::AdapterBase;
pub use connector::ConnectorAdapter;
pub use mock::MockConnector;
pub use session::{AccountId, SessionData, SessionNamespace};
pub use traits::{Adapter, Connector, ConnectorEvent};
pub use types::{
    AdapterDescriptor, AdapterKind, AdapterNamespace, AdapterSettings, Capability, CapabilitySet,
    DisconnectOptions, InitOptions, LoginParams, UserAuthInfo, UserInfo,
};
