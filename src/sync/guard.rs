//! Per-entity in-flight tracking.
//!
//! A second sync for a key that is already in flight is rejected rather than
//! queued. The guard is released on drop, which covers success, failure and
//! a caller future being dropped mid-sync.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::RemoteId;

/// What is being synced for a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncKind {
    Meeting,
    Participants,
    Recordings,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Participants => "participants",
            Self::Recordings => "recordings",
        }
    }
}

type Key = (SyncKind, RemoteId);

/// Set of syncs currently in flight. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    inner: Arc<Mutex<HashSet<Key>>>,
}

impl InFlightRegistry {
    fn lock(&self) -> MutexGuard<'_, HashSet<Key>> {
        // The set stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `(kind, id)`. Returns `None` if it is already claimed.
    pub fn try_acquire(&self, kind: SyncKind, id: &RemoteId) -> Option<InFlightGuard> {
        let key = (kind, id.clone());
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: self.clone(),
            key,
        })
    }

    pub fn is_in_flight(&self, kind: SyncKind, id: &RemoteId) -> bool {
        self.lock().contains(&(kind, id.clone()))
    }

    /// Remote ids with a meeting sync in flight, for UI "Syncing..." state.
    pub fn in_flight_meetings(&self) -> Vec<RemoteId> {
        let mut ids: Vec<_> = self
            .lock()
            .iter()
            .filter(|(kind, _)| *kind == SyncKind::Meeting)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    key: Key,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
    }
}
