/*
[INPUT]:  Chain configs, wallet backends, delegate swaps
[OUTPUT]: Request-handling providers and the stable proxy handle
[POS]:    Provider layer - everything an application sends requests through
[UPDATE]: When adding provider kinds
*/

mod base;
pub mod common;
pub mod connector;
pub mod proxy;

use std::sync::Arc;

pub use common::CommonRpcProvider;
pub use connector::ConnectorProvider;
pub use proxy::{ProviderProxy, same_handler};

use crate::events::{EventEmitter, ProviderEvent};
use crate::rpc::RequestHandler;

/// Request handler produced by a connected adapter
pub trait Provider: RequestHandler {
    fn events(&self) -> &EventEmitter<ProviderEvent>;

    /// Chain id last resolved by the provider
    fn chain_id(&self) -> Option<String>;

    fn accounts(&self) -> Vec<String>;

    /// The same provider as a plain request handler
    fn handler(self: Arc<Self>) -> Arc<dyn RequestHandler>;
}
