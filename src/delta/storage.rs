//! Delta persistence.
//!
//! The whole [`DeltaStore`] lives in one JSON file. Loading always goes
//! through normalization, so a file written by an older build (or edited by
//! hand) degrades to empty subtrees instead of failing. A file that is not
//! JSON at all loads as an empty store.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ZoneResult;

use super::DeltaStore;

/// File-backed storage for zone deltas.
pub struct DeltaStorage {
    path: PathBuf,
}

impl DeltaStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the store, creating parent directories as needed.
    pub fn save(&self, store: &DeltaStore) -> ZoneResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, store)?;
        info!(path = %self.path.display(), zones = store.len(), "deltas saved");
        Ok(())
    }

    /// Read the store. A missing or unparsable file is an empty store;
    /// anything that parses is normalized. Only I/O failures are errors.
    pub fn load(&self) -> ZoneResult<DeltaStore> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no delta file; starting empty");
            return Ok(DeltaStore::new());
        }
        let bytes = fs::read(&self.path)?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(raw) => Ok(DeltaStore::normalize(&raw)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt delta file; starting empty");
                Ok(DeltaStore::new())
            }
        }
    }

    /// Remove the file if present.
    pub fn delete(&self) -> ZoneResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::QualityTier;
    use crate::error::ZoneError;
    use crate::tilemap::Coord;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = DeltaStorage::new(dir.path().join("saves").join("deltas.json"));

        let mut store = DeltaStore::new();
        store.record_harvested("cave_1", "resourceNodes_oak_tree_3_4");
        store.record_explored("cave_1", Coord::new(2, 5));
        store.record_quality("cave_1", "resourceNodes_oak_tree_3_4", QualityTier::Superior);
        store.record_unlocked("cave_1", 1);

        storage.save(&store).unwrap();
        assert!(storage.exists());
        assert_eq!(storage.load().unwrap(), store);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let storage = DeltaStorage::new(dir.path().join("nothing.json"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_stale_shape_is_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");
        fs::write(&path, r#"{"z": {"harvested": ["a"], "qualities": "broken"}}"#).unwrap();

        let store = DeltaStorage::new(&path).load().unwrap();
        let z = store.zone("z").unwrap();
        assert!(z.harvested.contains("a"));
        assert!(z.qualities.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(DeltaStorage::new(&path).load().unwrap().is_empty());

        fs::write(&path, r#"{"cave_1": {"harvested": {"a": tr"#).unwrap();
        assert!(DeltaStorage::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_path_is_an_error() {
        let dir = tempdir().unwrap();
        // A directory exists but cannot be read as a file
        assert!(matches!(DeltaStorage::new(dir.path()).load(), Err(ZoneError::Io(_))));
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let storage = DeltaStorage::new(dir.path().join("d.json"));
        storage.save(&DeltaStore::new()).unwrap();
        storage.delete().unwrap();
        assert!(!storage.exists());
        storage.delete().unwrap();
    }
}
