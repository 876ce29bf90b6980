//! Latest-value exchange between the solver thread and the foreground loop
//!
//! The solver publishes each computed snapshot here; the foreground reads
//! the most recent one without ever blocking on the solver. Snapshots are
//! immutable once published, so readers hold plain `Arc` clones and the
//! superseded snapshot is freed when its last reader drops it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::types::FieldState;

/// Single-slot exchange for the latest published snapshot
///
/// Publish is called only by the solver thread; `latest` only by the
/// foreground consumer. Both critical sections are a pointer swap / clone.
#[derive(Debug, Default)]
pub struct ValueBuffer {
    latest: Mutex<Option<Arc<FieldState>>>,
    published: AtomicU64,
}

impl ValueBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new snapshot, replacing the previous one
    ///
    /// Returns the sequence number of the stored snapshot (1 for the first
    /// publish). Publication order equals solver iteration order.
    pub fn publish(&self, state: FieldState) -> u64 {
        let snapshot = Arc::new(state);
        let mut slot = lock(&self.latest);
        *slot = Some(snapshot);
        // Incremented inside the critical section so sequence() never runs
        // ahead of what latest() can observe.
        self.published.fetch_add(1, Ordering::Release) + 1
    }

    /// The most recently published snapshot, or None before the first publish
    ///
    /// Never blocks waiting for a fresher value; the returned snapshot may
    /// be superseded at any moment.
    pub fn latest(&self) -> Option<Arc<FieldState>> {
        lock(&self.latest).clone()
    }

    /// Number of snapshots published so far
    pub fn sequence(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

// A poisoned slot only means a publisher panicked mid-swap of an Option;
// the contained value is still coherent, so recover it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
