//! Observer registry used for cache-change and query-failure notifications.
//!
//! Handlers are plain callbacks; `subscribe` hands back a `Subscription` id
//! that `unsubscribe` accepts. Handlers are invoked synchronously on the thread
//! that fires the event, after the registry lock has been released.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct EventEmitter<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(Subscription, Handler<T>)>>,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.lock().push((id, Arc::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription);
        handlers.len() != before
    }

    pub fn fire(&self, event: &T) {
        // Snapshot so handlers may subscribe/unsubscribe re-entrantly
        let handlers: Vec<Handler<T>> = self
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn fire_reaches_every_subscriber() {
        let emitter = EventEmitter::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let total = total.clone();
            emitter.subscribe(move |n| {
                total.fetch_add(*n as usize, Ordering::SeqCst);
            });
        }
        emitter.fire(&2);
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let emitter = EventEmitter::<()>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let sub = emitter.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        emitter.fire(&());
        assert!(emitter.unsubscribe(sub));
        assert!(!emitter.unsubscribe(sub));
        emitter.fire(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(emitter.is_empty());
    }
}
