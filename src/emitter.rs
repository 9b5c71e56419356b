//! Typed publish/subscribe keyed by event kind
//!
//! Events are enums whose variants carry their payloads. Listeners are
//! registered against the variant's kind and receive a reference to the
//! whole event. Delivery is synchronous and works on a snapshot of the
//! registry taken when `emit` starts, so listeners that subscribe or
//! unsubscribe during delivery never cause skips or double deliveries.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// An event that can be dispatched through an [`EventEmitter`]
pub trait EmitterEvent: Send + Sync {
    /// Registry key; one per variant
    type Kind: Copy + Eq + Hash + Debug + Send + Sync;

    fn kind(&self) -> Self::Kind;
}

/// Listener callback
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by `on`/`once`, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration<E> {
    id: ListenerId,
    once: bool,
    callback: Listener<E>,
}

impl<E> Clone for Registration<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            once: self.once,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Synchronous event emitter with per-listener panic isolation
pub struct EventEmitter<E: EmitterEvent> {
    listeners: Mutex<HashMap<E::Kind, Vec<Registration<E>>>>,
    next_id: AtomicU64,
}

impl<E: EmitterEvent> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EmitterEvent> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener for every future `kind` event
    pub fn on(&self, kind: E::Kind, callback: impl Fn(&E) + Send + Sync + 'static) -> ListenerId {
        self.register(kind, false, Arc::new(callback))
    }

    /// Register a listener that is removed after its first delivery
    pub fn once(&self, kind: E::Kind, callback: impl Fn(&E) + Send + Sync + 'static) -> ListenerId {
        self.register(kind, true, Arc::new(callback))
    }

    /// Remove a registration. Returns false if it was not registered.
    pub fn off(&self, kind: E::Kind, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let Some(regs) = listeners.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = regs.iter().position(|r| r.id == id) else {
            return false;
        };
        regs.remove(pos);
        if regs.is_empty() {
            listeners.remove(&kind);
        }
        true
    }

    /// Deliver `event` to every listener registered for its kind at the
    /// time of the call, in registration order.
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &E) -> usize {
        let kind = event.kind();
        let snapshot: Vec<Registration<E>> = {
            let mut listeners = self.lock();
            let Some(regs) = listeners.get_mut(&kind) else {
                return 0;
            };
            let snapshot = regs.clone();
            regs.retain(|r| !r.once);
            if regs.is_empty() {
                listeners.remove(&kind);
            }
            snapshot
        };

        for reg in &snapshot {
            let callback = &reg.callback;
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!(
                    event = ?kind,
                    listener = reg.id.0,
                    "Event listener panicked"
                );
            }
        }

        snapshot.len()
    }

    /// Clear listeners for one kind, or for all kinds when `None`
    pub fn remove_all_listeners(&self, kind: Option<E::Kind>) {
        let mut listeners = self.lock();
        match kind {
            Some(kind) => {
                listeners.remove(&kind);
            }
            None => listeners.clear(),
        }
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.lock().get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Kinds that currently have at least one listener (unordered)
    pub fn event_names(&self) -> Vec<E::Kind> {
        self.lock().keys().copied().collect()
    }

    fn register(&self, kind: E::Kind, once: bool, callback: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .entry(kind)
            .or_default()
            .push(Registration { id, once, callback });
        id
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<E::Kind, Vec<Registration<E>>>> {
        // Listeners never run under this lock, so poisoning cannot leave
        // the registry half-updated.
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}
