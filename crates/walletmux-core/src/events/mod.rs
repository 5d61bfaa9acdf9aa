/*
[INPUT]:  Lifecycle changes from adapters, providers, connectors and the hub
[OUTPUT]: Typed publish/subscribe channels
[POS]:    Events layer - event fan-out between components
[UPDATE]: When adding events or changing delivery semantics
*/

pub mod emitter;
pub mod types;

pub use emitter::{EventEmitter, SubscriptionId};
pub use types::{AdapterEvent, HubEvent, ProviderEvent};
