//! Per-session mutual exclusion.
//!
//! `SessionLocks` hands out one async mutex per session id so that turns
//! (and deactivation) on the same session run one at a time while turns on
//! different sessions proceed in parallel. Entries are removed from the map
//! once nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Map of session id to its turn mutex.
///
/// Cloning produces a shared view of the same locks (backed by `Arc`).
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the session is free and take it.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn acquire(&self, session_id: Uuid) -> SessionGuard {
        // Clone the Arc out so no DashMap guard is held across the await.
        let mutex = self
            .inner
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let guard = mutex.lock_owned().await;

        SessionGuard {
            session_id,
            locks: Arc::clone(&self.inner),
            guard: Some(guard),
        }
    }

    /// Number of sessions currently locked or awaited.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive hold on one session. Releases (and prunes) on drop.
#[derive(Debug)]
pub struct SessionGuard {
    session_id: Uuid,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionGuard {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: no holder, no waiter.
        self.locks
            .remove_if(&self.session_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
