//! CSV snapshot of a [`RecordSet`].
//!
//! Columns follow the [`NormalizedRecord`] field names:
//! `occurred_on,location,state,dead,injured,total,latitude,longitude`.
//! Missing state and coordinates are written as empty fields.
//!
//! [`Snapshot::save`] is atomic on its own; a read-modify-write must hold
//! [`Snapshot::lock`] so that concurrent processes do not lose each
//! other's records.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use shooting_map_incident_models::{NormalizedRecord, RecordSet};

use crate::DbError;
use crate::lock::SnapshotLock;

/// Distinguishes concurrent saves from the same process.
static SAVE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Handle on a snapshot file. Does not hold it open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    /// Snapshot at an explicit path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot at [`crate::paths::snapshot_path`].
    #[must_use]
    pub fn default_location() -> Self {
        Self::at(crate::paths::snapshot_path())
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the snapshot file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Path of the sibling lock file (`<snapshot>.lock`).
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.sibling("lock")
    }

    /// Blocks until this process is the only writer of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the lock file cannot be opened or locked.
    pub fn lock(&self) -> Result<SnapshotLock, DbError> {
        SnapshotLock::acquire(&self.lock_path())
    }

    /// Async variant of [`Snapshot::lock`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the lock file cannot be opened or locked.
    pub async fn lock_async(&self) -> Result<SnapshotLock, DbError> {
        SnapshotLock::acquire_async(self.lock_path()).await
    }

    /// Reads every record from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file is missing or malformed.
    pub fn load(&self) -> Result<RecordSet, DbError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<NormalizedRecord>()
            .collect::<Result<RecordSet, _>>()?;
        log::debug!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    /// Replaces the snapshot with `records`.
    ///
    /// The set is written to a temporary sibling file unique to this save
    /// and renamed into place, so an interrupted or concurrent write never
    /// leaves a partial or mixed snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the file cannot be written.
    pub fn save(&self, records: &RecordSet) -> Result<(), DbError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            crate::paths::ensure_dir(parent)?;
        }

        let tmp = self.tmp_path();
        if let Err(e) = write_csv(&tmp, records) {
            std::fs::remove_file(&tmp).ok();
            return Err(e);
        }
        std::fs::rename(&tmp, &self.path)?;

        log::info!(
            "Saved {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Deletes the snapshot. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<bool, DbError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("Removed cache {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let seq = SAVE_SEQ.fetch_add(1, Ordering::Relaxed);
        self.sibling(&format!("{}.{seq}.tmp", std::process::id()))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

fn write_csv(path: &Path, records: &RecordSet) -> Result<(), DbError> {
    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        // serde only emits headers alongside the first row.
        writer.write_record(HEADERS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

const HEADERS: [&str; 8] = [
    "occurred_on",
    "location",
    "state",
    "dead",
    "injured",
    "total",
    "latitude",
    "longitude",
];

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shooting_map_incident_models::Coordinates;

    use super::*;

    fn temp_snapshot(name: &str) -> Snapshot {
        let dir = std::env::temp_dir().join(format!(
            "shooting_map_snapshot_{}_{name}",
            std::process::id()
        ));
        std::fs::remove_dir_all(&dir).ok();
        Snapshot::at(dir.join("shootings.csv"))
    }

    fn record(location: &str, state: Option<&str>, coords: Option<Coordinates>) -> NormalizedRecord {
        NormalizedRecord {
            occurred_on: NaiveDate::from_ymd_opt(2021, 3, 3).unwrap(),
            location: location.to_string(),
            state: state.map(String::from),
            dead: 9,
            injured: 17,
            total: 26,
            latitude: None,
            longitude: None,
        }
        .with_coordinates(coords)
    }

    #[test]
    fn round_trips_records() {
        let snapshot = temp_snapshot("round_trip");
        let records: RecordSet = vec![
            record(
                "Dayton, Ohio",
                Some("Ohio"),
                Some(Coordinates {
                    latitude: 39.758_948,
                    longitude: -84.191_607,
                }),
            ),
            record("Somewhere, \"Quoted\", Texas", None, None),
        ]
        .into_iter()
        .collect();

        assert!(!snapshot.exists());
        snapshot.save(&records).unwrap();
        assert!(snapshot.exists());
        assert_eq!(snapshot.load().unwrap(), records);
    }

    #[test]
    fn saves_empty_set_with_header() {
        let snapshot = temp_snapshot("empty");
        snapshot.save(&RecordSet::default()).unwrap();
        let text = std::fs::read_to_string(snapshot.path()).unwrap();
        assert!(text.starts_with("occurred_on,location,state"));
        assert!(snapshot.load().unwrap().is_empty());
    }

    #[test]
    fn save_replaces_previous_contents() {
        let snapshot = temp_snapshot("replace");
        let first: RecordSet = vec![record("A, Ohio", Some("Ohio"), None); 3]
            .into_iter()
            .collect();
        let second: RecordSet = vec![record("B, Texas", Some("Texas"), None)]
            .into_iter()
            .collect();
        snapshot.save(&first).unwrap();
        snapshot.save(&second).unwrap();
        assert_eq!(snapshot.load().unwrap(), second);
        assert_eq!(leftover_tmp_files(&snapshot), 0);
    }

    fn leftover_tmp_files(snapshot: &Snapshot) -> usize {
        std::fs::read_dir(snapshot.path().parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn concurrent_saves_leave_one_complete_snapshot() {
        let snapshot = temp_snapshot("concurrent");
        let austin: RecordSet = vec![record("Austin, Texas", Some("Texas"), None); 5_000]
            .into_iter()
            .collect();
        let waco: RecordSet = vec![record("Waco, Texas", Some("Texas"), None); 5_000]
            .into_iter()
            .collect();

        for _ in 0..5 {
            let writers: Vec<_> = [austin.clone(), waco.clone()]
                .into_iter()
                .map(|records| {
                    let handle = Snapshot::at(snapshot.path());
                    std::thread::spawn(move || handle.save(&records))
                })
                .collect();
            for writer in writers {
                writer.join().unwrap().unwrap();
            }

            let saved = snapshot.load().unwrap();
            assert!(saved == austin || saved == waco, "snapshot mixes writers");
        }
        assert_eq!(leftover_tmp_files(&snapshot), 0);
    }

    #[test]
    fn lock_file_sits_next_to_snapshot() {
        let snapshot = temp_snapshot("lock_path");
        assert_eq!(
            snapshot.lock_path(),
            snapshot.path().with_file_name("shootings.csv.lock")
        );
        let _lock = snapshot.lock().unwrap();
        assert!(snapshot.lock_path().is_file());
        assert!(!snapshot.exists());
    }

    #[test]
    fn remove_reports_whether_file_existed() {
        let snapshot = temp_snapshot("remove");
        assert!(!snapshot.remove().unwrap());
        snapshot.save(&RecordSet::default()).unwrap();
        assert!(snapshot.remove().unwrap());
        assert!(!snapshot.exists());
    }

    #[test]
    fn loading_missing_snapshot_fails() {
        assert!(temp_snapshot("missing").load().is_err());
    }
}
