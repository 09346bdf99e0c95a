//! Observer registries and callbacks.
//!
//! This is the synchronization core of the crate: an ordered registry of
//! callbacks, always owned by exactly one mutex together with the value it
//! observes. Callbacks are reference-counted immutable closures, so the
//! registry can be snapshotted cheaply under the lock and notified outside
//! of it.

use std::sync::{Arc, Mutex, Weak};

/// An error that can occur with a weakly referenced callback target.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CallbackError {
    Disappeared,
    Poisoned,
}

/// Shorthand for common callback results.
pub type CallbackResult<T = ()> = Result<T, CallbackError>;

/// A shared callback.
pub type Callback<A> = Arc<dyn Fn(A) -> CallbackResult + Send + Sync + 'static>;

/// Perform some callback on a weak reference to a mutex-guarded target and
/// handle the case of a dropped target gracefully.
pub fn with_weak<T, F>(weak: &Weak<Mutex<T>>, f: F) -> CallbackResult
    where F: FnOnce(&Arc<Mutex<T>>) -> CallbackResult
{
    match weak.upgrade() {
        Some(strong) => f(&strong),
        None => Err(CallbackError::Disappeared),
    }
}


/// An ordered registry of observers.
///
/// Entries are kept in registration order; every entry carries a unique
/// ordinal that doubles as its unsubscription token. To unregister itself
/// from further notifications, a callback returns an error.
pub struct Source<A> {
    entries: Vec<(u64, Callback<A>)>,
    next_id: u64,
}

impl<A> Source<A> {
    /// Create a new, empty registry.
    pub fn new() -> Source<A> {
        Source { entries: vec![], next_id: 0 }
    }

    /// Claim the next ordinal without registering anything under it.
    pub fn reserve(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register a callback and return its ordinal.
    pub fn register(&mut self, callback: Callback<A>) -> u64 {
        let id = self.reserve();
        self.entries.push((id, callback));
        id
    }

    /// Remove the entry with the given ordinal. No-op if it is already gone.
    pub fn cancel(&mut self, id: u64) {
        self.entries.retain(|&(entry, _)| entry != id);
    }

    /// Clone the current entries, preserving registration order.
    ///
    /// Notification iterates over a snapshot so that callbacks may mutate
    /// the canonical registry reentrantly.
    pub fn snapshot(&self) -> Vec<(u64, Callback<A>)> {
        self.entries
            .iter()
            .map(|&(id, ref callback)| (id, callback.clone()))
            .collect()
    }

    /// Drop all entries whose callbacks reported an error during a
    /// notification pass.
    pub fn retire(&mut self, dead: &[u64]) {
        self.entries.retain(|&(id, _)| !dead.contains(&id));
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of registered observers. Exposed for tests.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
