//! User-facing event registry, grounded on `events.py::EventHandler`.
//!
//! Every received packet first runs through the built-in handlers in
//! `dispatcher.rs`, then through whatever callbacks a caller registered
//! here for that packet id.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use bancho_protocol::ServerPacketId;
use parking_lot::RwLock;
use tracing::warn;

use crate::worker::WorkerPool;

/// A user callback. The `Box<dyn Any + Send + Sync>` payload is whatever
/// the built-in handler for this packet decoded (see `dispatcher.rs` for
/// the concrete type per packet id) — callers downcast with
/// `payload.downcast_ref::<T>()`.
pub type EventCallback = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;

#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<ServerPacketId, Vec<(EventCallback, bool)>>>,
}

impl EventRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a callback for `packet`. `threaded` mirrors
    /// `TaskManager.register(threaded=...)`'s meaning for events: run on
    /// the bounded worker pool instead of inline during dispatch.
    pub fn register(&self, packet: ServerPacketId, threaded: bool, callback: EventCallback) {
        self.handlers
            .write()
            .entry(packet)
            .or_default()
            .push((callback, threaded));
    }

    /// Invoke every callback registered for `packet` with `payload`.
    /// Inline callbacks run synchronously and have panics caught so one
    /// misbehaving callback can't take down the dispatch loop; threaded
    /// callbacks are hopped onto `pool` (they MUST be `'static` to cross
    /// that boundary, so `payload` is required to already be owned).
    pub fn call(&self, packet: ServerPacketId, payload: Arc<dyn Any + Send + Sync>, pool: &WorkerPool) {
        let handlers = {
            let guard = self.handlers.read();
            guard.get(&packet).cloned().unwrap_or_default()
        };

        for (callback, threaded) in handlers {
            if threaded {
                let payload = payload.clone();
                let callback = callback.clone();
                pool.spawn(async move {
                    callback(payload.as_ref());
                    Ok(())
                });
            } else {
                let payload = payload.clone();
                let callback = callback.clone();
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    callback(payload.as_ref());
                }));
                if result.is_err() {
                    warn!(?packet, "event callback panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn inline_callback_runs_synchronously() {
        let registry = EventRegistry::new();
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = counter.clone();
        registry.register(
            ServerPacketId::Pong,
            false,
            Arc::new(move |_payload| {
                counter2.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.call(ServerPacketId::Pong, Arc::new(()), &pool);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_callback_does_not_propagate() {
        let registry = EventRegistry::new();
        let pool = WorkerPool::new(4);
        registry.register(
            ServerPacketId::Pong,
            false,
            Arc::new(|_payload| panic!("boom")),
        );

        // Should not panic the test itself.
        registry.call(ServerPacketId::Pong, Arc::new(()), &pool);
    }
}
