/*
[INPUT]:  Typed events and async listener closures
[OUTPUT]: In-order delivery to every subscribed listener
[POS]:    Events layer - publish/subscribe primitive shared by adapters, providers, connectors
[UPDATE]: When changing delivery semantics or subscription handles
*/

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;

use crate::sync::lock;

type Listener<E> = Arc<dyn Fn(E) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle returned by [`EventEmitter::on`]; pass it to [`EventEmitter::off`] on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Publish/subscribe hub for one event type.
///
/// `emit` awaits every listener in subscription order before returning, so a
/// component that emits an event can rely on its subscribers having reacted.
pub struct EventEmitter<E> {
    listeners: Mutex<Vec<(SubscriptionId, Listener<E>)>>,
    next_id: AtomicU64,
}

impl<E> EventEmitter<E>
where
    E: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe an async listener
    pub fn on<F, Fut>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener<E> = Arc::new(move |event| Box::pin(listener(event)));
        lock(&self.listeners).push((id, listener));
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Deliver an event to a snapshot of the current listeners
    pub async fn emit(&self, event: E) {
        let listeners: Vec<Listener<E>> = {
            let guard = lock(&self.listeners);
            guard.iter().map(|(_, listener)| listener.clone()).collect()
        };

        for listener in listeners {
            listener(event.clone()).await;
        }
    }
}

impl<E> Default for EventEmitter<E>
where
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &lock(&self.listeners).len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_listeners_in_order() {
        let emitter = EventEmitter::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = seen.clone();
            emitter.on(move |value: u32| {
                let seen = seen.clone();
                async move {
                    lock(&seen).push(format!("{tag}{value}"));
                }
            });
        }

        emitter.emit(7).await;
        assert_eq!(*lock(&seen), vec!["a7".to_string(), "b7".to_string()]);
    }

    #[tokio::test]
    async fn test_off_removes_listener() {
        let emitter = EventEmitter::<u32>::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = hits.clone();
        let id = emitter.on(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        emitter.emit(1).await;
        assert!(emitter.off(id));
        assert!(!emitter.off(id));
        emitter.emit(2).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count(), 0);
    }
}
