//! Session snapshot persistence with file locking.
//!
//! The snapshot is a single-slot recovery record for the one in-flight
//! session: overwritten on every mutation, deleted on finish. The store
//! must tolerate corrupt content by reporting it as absent. A damaged
//! snapshot means a lost session, never a crashed program.

use crate::{Result, SessionSnapshot};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Single-slot snapshot persistence.
///
/// `load` maps absent, unreadable, and malformed content all to `None`;
/// only `save` and `clear` can fail.
pub trait SnapshotStore {
    fn load(&self) -> Option<SessionSnapshot>;
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// File-backed snapshot slot with shared/exclusive locking and atomic
/// writes.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    /// Load the snapshot with a shared lock.
    ///
    /// Any failure along the way (missing file, lock contention, read
    /// error, unparsable JSON) is logged and reported as absent so the
    /// caller falls back to a fresh session.
    fn load(&self) -> Option<SessionSnapshot> {
        if !self.path.exists() {
            tracing::debug!("No session snapshot at {:?}", self.path);
            return None;
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}. Ignoring.", self.path, e);
                return None;
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}. Ignoring.", self.path, e);
            return None;
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        let _ = file.unlock();
        if let Err(e) = read_result {
            tracing::warn!("Failed to read snapshot {:?}: {}. Ignoring.", self.path, e);
            return None;
        }

        match serde_json::from_str::<SessionSnapshot>(&contents) {
            Ok(snapshot) => {
                tracing::debug!("Loaded session snapshot from {:?}", self.path);
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    "Corrupt snapshot {:?}: {}. Falling back to a fresh session.",
                    self.path,
                    e
                );
                None
            }
        }
    }

    /// Save the snapshot atomically:
    /// 1. Write to a locked temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the slot
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(snapshot)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path)
            .map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Saved session snapshot to {:?}", self.path);
        Ok(())
    }

    /// Delete the slot so a finished session cannot be resurrected.
    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Cleared session snapshot at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory snapshot slot. Clones share the slot, which makes it a handy
/// test double for crash/resume scenarios.
#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<SessionSnapshot>>>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Option<SessionSnapshot> {
        self.slot.lock().ok()?.clone()
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| crate::Error::Session("snapshot slot poisoned".into()))?;
        *slot = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| crate::Error::Session("snapshot slot poisoned".into()))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SessionState, WorkoutSet};

    fn sample_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            sets: vec![
                WorkoutSet {
                    id: "s1".into(),
                    reps: 10,
                    weight: 135.0,
                    completed: true,
                },
                WorkoutSet {
                    id: "s2".into(),
                    reps: 8,
                    weight: 145.0,
                    completed: false,
                },
            ],
            state: SessionState::Resting,
            active_set_index: 1,
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileSnapshotStore::new(temp_dir.path().join("active_session.json"));

        let snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();

        let loaded = store.load().expect("snapshot should load");
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_nonexistent_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(temp_dir.path().join("missing.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active_session.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = FileSnapshotStore::new(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_overwrites_the_slot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileSnapshotStore::new(temp_dir.path().join("active_session.json"));

        let mut snapshot = sample_snapshot();
        store.save(&snapshot).unwrap();

        snapshot.active_set_index = 2;
        snapshot.state = SessionState::Working;
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.active_set_index, 2);
        assert_eq!(loaded.state, SessionState::Working);
    }

    #[test]
    fn test_clear_removes_the_slot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("active_session.json");
        let mut store = FileSnapshotStore::new(&path);

        store.save(&sample_snapshot()).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.load().is_none());

        // Clearing an already-empty slot is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_atomic_save_leaves_no_stray_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileSnapshotStore::new(temp_dir.path().join("active_session.json"));
        store.save(&sample_snapshot()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "active_session.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only active_session.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_memory_store_clones_share_the_slot() {
        let mut store = MemorySnapshotStore::default();
        let observer = store.clone();

        store.save(&sample_snapshot()).unwrap();
        assert!(observer.load().is_some());

        store.clear().unwrap();
        assert!(observer.load().is_none());
    }
}
