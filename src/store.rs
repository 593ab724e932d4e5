//! In-memory cache of the latest published snapshot.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::snapshot::Snapshot;

/// A snapshot and the raw document it was built from, swapped as one unit.
#[derive(Debug, Clone)]
pub struct Published {
    pub snapshot: Arc<Snapshot>,
    pub raw: Option<Arc<Value>>,
}

/// Holds the current [`Published`] pair.
///
/// One writer (the poller) replaces the pair wholesale; any number of readers
/// clone the `Arc` out. The lock is only held for that pointer swap or clone,
/// never across I/O.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Published>>,
    publish_count: AtomicU64,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    /// Creates a store holding the primed snapshot and no raw payload.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Published {
                snapshot: Arc::new(Snapshot::primed()),
                raw: None,
            })),
            publish_count: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, snapshot: Snapshot, raw: Value) {
        let next = Arc::new(Published {
            snapshot: Arc::new(snapshot),
            raw: Some(Arc::new(raw)),
        });

        // Only whole Arcs are stored, so a poisoned lock still holds a valid pair.
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = next;
        drop(current);

        self.publish_count.fetch_add(1, Ordering::Release);
    }

    /// Both halves of the current pair, from the same publication.
    pub fn read_both(&self) -> Arc<Published> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn read_current(&self) -> Arc<Snapshot> {
        self.read_both().snapshot.clone()
    }

    /// Raw upstream document behind the current snapshot, for diagnostics.
    pub fn read_raw(&self) -> Option<Arc<Value>> {
        self.read_both().raw.clone()
    }

    /// Number of successful publications since start-up.
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Acquire)
    }
}
