//! Registry of remote "open window count" observers
//!
//! Observers live in other processes and can disappear without unregistering.
//! A failed delivery is how a dead observer is detected: it is dropped from the
//! registry once the notification pass that hit the failure has finished.

use crate::error::ListenerError;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ListenerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Observer of the open window count
pub trait OpenCountListener: Send + Sync {
    /// Stable identity used for registration and removal
    fn id(&self) -> ListenerId;

    /// Deliver a new count. An error marks the observer as dead.
    fn on_update(&self, count: u32) -> Result<(), ListenerError>;
}

/// Set of live observers keyed by identity
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<ListenerId, Arc<dyn OpenCountListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `listener` and immediately deliver `count` to it.
    ///
    /// A listener that already fails on this first delivery is not kept.
    /// Returns whether the listener is registered afterwards.
    pub fn register(&mut self, listener: Arc<dyn OpenCountListener>, count: u32) -> bool {
        let id = listener.id();
        match listener.on_update(count) {
            Ok(()) => {
                self.listeners.insert(id, listener);
                debug!("👂 Open-count listener {:?} registered", id);
                true
            }
            Err(e) => {
                warn!("⚠️ Listener {:?} failed on registration: {}", id, e);
                self.listeners.remove(&id);
                false
            }
        }
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Deliver `count` to every listener, reporting each outcome.
    pub fn deliver(&self, count: u32) -> Vec<(ListenerId, Result<(), ListenerError>)> {
        self.listeners
            .iter()
            .map(|(&id, listener)| (id, listener.on_update(count)))
            .collect()
    }

    /// Deliver `count` to every listener, then drop those that failed.
    ///
    /// Returns the ids that were pruned.
    pub fn notify_all(&mut self, count: u32) -> Vec<ListenerId> {
        let dead: Vec<ListenerId> = self
            .deliver(count)
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    debug!("💀 Dropping listener {:?}: {}", id, e);
                    Some(id)
                }
            })
            .collect();

        for id in &dead {
            self.listeners.remove(id);
        }
        dead
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
