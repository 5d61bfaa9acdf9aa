/*
[INPUT]:  Provider requests and the chain a pipeline is bound to
[OUTPUT]: Results from local handlers, interceptors or the network
[POS]:    RPC layer - middleware pipeline
[UPDATE]: When adding pipeline stages or request types
*/

pub mod chain_switch;
pub mod handlers;
pub mod middleware;
pub mod network;
pub mod types;

pub use chain_switch::{AddChainParameter, ChainSwitchHandlers, ChainSwitchMiddleware};
pub use handlers::{ChainIdMiddleware, WalletHandlers, WalletMiddleware};
pub use middleware::{Next, PipelineBuilder, RequestHandler, RpcMiddleware, RpcPipeline};
pub use network::{HttpConfig, NetworkMiddleware};
pub use types::{RpcErrorObject, RpcRequest, RpcResponse};
