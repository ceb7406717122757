//! Single-writer guard over the in-memory record set and its snapshot.

use shooting_map_incident_models::RecordSet;
use tokio::sync::{Mutex, MutexGuard};

use crate::snapshot::Snapshot;

/// Record set shared by a long-running process.
///
/// Every mutation happens while holding the lock returned by
/// [`RecordStore::lock`], so at most one writer touches the snapshot at a
/// time.
#[derive(Debug)]
pub struct RecordStore {
    snapshot: Snapshot,
    records: Mutex<RecordSet>,
}

impl RecordStore {
    /// Wraps an already loaded record set.
    #[must_use]
    pub fn new(snapshot: Snapshot, records: RecordSet) -> Self {
        Self {
            snapshot,
            records: Mutex::new(records),
        }
    }

    /// The snapshot backing this store.
    #[must_use]
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Copy of the current records.
    pub async fn records(&self) -> RecordSet {
        self.records.lock().await.clone()
    }

    /// Takes the writer lock.
    pub async fn lock(&self) -> MutexGuard<'_, RecordSet> {
        self.records.lock().await
    }
}
