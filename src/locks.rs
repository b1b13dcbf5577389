//! Per-organization mutation serialization.
//!
//! Membership mutations and invitation acceptance for one organization must
//! not interleave, or the single-owner and unique-membership invariants can
//! be violated by concurrent read-check-write sequences. `OrgLocks` hands
//! out one async mutex per organization id; every mutating action holds the
//! guard for its whole sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

/// Registry of per-organization async locks.
///
/// Cloning is cheap and clones share the same registry, so one `OrgLocks`
/// can be handed to every action that mutates.
#[derive(Clone, Default)]
pub struct OrgLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>>,
}

impl OrgLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one organization, waiting if another mutation
    /// holds it. The guard releases on drop.
    pub async fn acquire(&self, organization_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                locks
                    .entry(organization_id)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };

        lock.lock_owned().await
    }

    /// Drop lock entries for an organization that no longer exists.
    ///
    /// Safe to call while the lock is held elsewhere; the `Arc` keeps the
    /// mutex alive until the last guard drops.
    pub fn release(&self, organization_id: i64) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(&organization_id);
    }

    /// Number of organizations with a registered lock.
    pub fn len(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
