/*
[INPUT]:  Chain namespaces, chain ids and partial chain parameters
[OUTPUT]: Resolved chain configurations
[POS]:    Chain layer - chain configuration registry
[UPDATE]: When adding presets or chain config fields
*/

pub mod config;
pub mod registry;

pub use config::{
    ChainConfig, ChainConfigInput, ChainNamespace, NativeCurrency, normalize_chain_id,
    parse_chain_id, to_hex_chain_id,
};
pub use registry::{ChainRegistry, StaticChainRegistry, resolve_chain_config};
