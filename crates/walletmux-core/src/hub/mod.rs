/*
[INPUT]:  Adapters, plugins, options and adapter lifecycle events
[OUTPUT]: The Web3Hub orchestrator and its state vocabulary
[POS]:    Hub layer - orchestration of adapters, plugins and the provider proxy
[UPDATE]: When adding orchestrator operations
*/

pub mod options;
pub mod orchestrator;
pub mod plugins;
pub mod state;

pub use options::{ADAPTER_CACHE_KEY, AuthNetwork, HubOptions, StorageKind};
pub use orchestrator::Web3Hub;
pub use plugins::Plugin;
pub use state::ConnectionState;
