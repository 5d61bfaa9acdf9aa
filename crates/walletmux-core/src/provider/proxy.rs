/*
[INPUT]:  Provider requests from long-lived consumers; delegate swaps from owners
[OUTPUT]: Requests forwarded to whichever delegate is current when they are issued
[POS]:    Provider layer - stable indirection over a replaceable request handler
[UPDATE]: When changing delegate swap semantics
*/

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{Result, WalletError};
use crate::rpc::{RequestHandler, RpcRequest};

/// Stable request handle whose delegate can be replaced at any time.
///
/// Clones share the same delegate slot. A request takes its own reference to
/// the delegate before awaiting, so a swap never affects requests already in
/// flight and every request issued after the swap sees the new delegate.
/// Swapping is silent; lifecycle notifications come from the hub.
#[derive(Clone)]
pub struct ProviderProxy {
    delegate: Arc<watch::Sender<Option<Arc<dyn RequestHandler>>>>,
}

impl ProviderProxy {
    pub fn new() -> Self {
        let (delegate, _) = watch::channel(None);
        Self {
            delegate: Arc::new(delegate),
        }
    }

    pub fn with_delegate(handler: Arc<dyn RequestHandler>) -> Self {
        let proxy = Self::new();
        proxy.update_delegate(handler);
        proxy
    }

    pub fn update_delegate(&self, handler: Arc<dyn RequestHandler>) {
        self.delegate.send_replace(Some(handler));
    }

    pub fn clear_delegate(&self) {
        self.delegate.send_replace(None);
    }

    pub fn delegate(&self) -> Option<Arc<dyn RequestHandler>> {
        self.delegate.borrow().clone()
    }

    /// Whether `handler` is the current delegate (pointer identity)
    pub fn is_delegate(&self, handler: &Arc<dyn RequestHandler>) -> bool {
        self.delegate
            .borrow()
            .as_ref()
            .is_some_and(|current| same_handler(current, handler))
    }

    /// Issue a request and deserialize the result
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.request(RpcRequest::new(method, params)).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl RequestHandler for ProviderProxy {
    async fn request(&self, request: RpcRequest) -> Result<Value> {
        let delegate = self.delegate().ok_or_else(|| {
            WalletError::NotReady(format!(
                "no provider attached, cannot handle {}",
                request.method
            ))
        })?;
        delegate.request(request).await
    }
}

impl Default for ProviderProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderProxy")
            .field("attached", &self.delegate.borrow().is_some())
            .finish()
    }
}

/// Pointer identity of two handlers, ignoring vtables
pub fn same_handler(a: &Arc<dyn RequestHandler>, b: &Arc<dyn RequestHandler>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::Notify;

    struct Fixed(Value);

    #[async_trait]
    impl RequestHandler for Fixed {
        async fn request(&self, _request: RpcRequest) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    struct Gated {
        gate: Arc<Notify>,
        value: Value,
    }

    #[async_trait]
    impl RequestHandler for Gated {
        async fn request(&self, _request: RpcRequest) -> Result<Value> {
            self.gate.notified().await;
            Ok(self.value.clone())
        }
    }

    #[tokio::test]
    async fn test_request_without_delegate_is_not_ready() {
        let proxy = ProviderProxy::new();
        let err = proxy.request(RpcRequest::method("eth_chainId")).await.unwrap_err();
        assert!(matches!(err, WalletError::NotReady(_)));
    }

    #[tokio::test]
    async fn test_swap_affects_only_later_requests() {
        let gate = Arc::new(Notify::new());
        let old: Arc<dyn RequestHandler> = Arc::new(Gated {
            gate: gate.clone(),
            value: json!("old"),
        });
        let new: Arc<dyn RequestHandler> = Arc::new(Fixed(json!("new")));

        let proxy = ProviderProxy::with_delegate(old.clone());
        let in_flight = {
            let proxy = proxy.clone();
            tokio::spawn(async move { proxy.request(RpcRequest::method("x")).await })
        };
        tokio::task::yield_now().await;

        proxy.update_delegate(new.clone());
        assert!(proxy.is_delegate(&new));
        assert!(!proxy.is_delegate(&old));
        assert_eq!(proxy.request(RpcRequest::method("x")).await.unwrap(), json!("new"));

        gate.notify_one();
        assert_eq!(in_flight.await.unwrap().unwrap(), json!("old"));
    }

    #[tokio::test]
    async fn test_clones_share_delegate() {
        let proxy = ProviderProxy::new();
        let held_by_consumer = proxy.clone();
        proxy.update_delegate(Arc::new(Fixed(json!("0x1"))));
        let chain: String = held_by_consumer.call("eth_chainId", Value::Null).await.unwrap();
        assert_eq!(chain, "0x1");

        proxy.clear_delegate();
        assert!(held_by_consumer.delegate().is_none());
    }
}
