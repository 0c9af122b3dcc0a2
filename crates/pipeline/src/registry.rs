//! Single-flight registry of running generation tasks.
//!
//! At most one task may drive a given generation id at a time. A task
//! claims the id with [`PollRegistry::try_acquire`] and holds the returned
//! [`PollGuard`] for as long as it runs; dropping the guard releases the
//! id. Every task gets a cancellation token that is a child of the
//! registry's root token, so [`PollRegistry::shutdown`] stops all of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use signage_core::DbId;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Inner {
    active: Mutex<HashMap<DbId, CancellationToken>>,
    /// Root token; cancelled on shutdown.
    root: CancellationToken,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<DbId, CancellationToken>> {
        // The map holds no invariants a panicking holder could break.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared handle; clones refer to the same registry.
#[derive(Debug, Clone, Default)]
pub struct PollRegistry {
    inner: Arc<Inner>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`. Returns `None` if another task already holds it or the
    /// registry has been shut down.
    pub fn try_acquire(&self, id: DbId) -> Option<PollGuard> {
        if self.inner.root.is_cancelled() {
            return None;
        }
        let mut active = self.inner.lock();
        if active.contains_key(&id) {
            return None;
        }
        let token = self.inner.root.child_token();
        active.insert(id, token.clone());
        Some(PollGuard {
            id,
            token,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Cancel the task holding `id`. Returns `false` if none is running.
    ///
    /// The id stays claimed until the task drops its guard.
    pub fn cancel(&self, id: DbId) -> bool {
        match self.inner.lock().get(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, id: DbId) -> bool {
        self.inner.lock().contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Cancel every running task and refuse new claims.
    pub fn shutdown(&self) {
        tracing::info!(active = self.active_count(), "Stopping generation tasks");
        self.inner.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.root.is_cancelled()
    }
}

/// Proof that the holder owns a generation id in the registry.
#[derive(Debug)]
pub struct PollGuard {
    id: DbId,
    token: CancellationToken,
    inner: Arc<Inner>,
}

impl PollGuard {
    pub fn id(&self) -> DbId {
        self.id
    }

    /// Token cancelled by [`PollRegistry::cancel`] or [`PollRegistry::shutdown`].
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.inner.lock().remove(&self.id);
    }
}
