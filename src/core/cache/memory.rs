//! In-memory fingerprint store for testing.

use super::{sidecar_path, FingerprintStore, SidecarCodec};
use crate::core::fingerprint::{Fingerprint, GridSize};
use crate::error::CacheError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// In-memory store
///
/// Keeps encoded records keyed by sidecar path, so loads go through the same
/// codec as the file-backed store without touching the disk.
pub struct InMemoryStore {
    codec: SidecarCodec,
    records: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new(grid: GridSize) -> Self {
        Self {
            codec: SidecarCodec::new(grid),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert raw bytes under an identifier, bypassing the codec
    pub fn insert_raw(&self, id: PathBuf, bytes: Vec<u8>) {
        if let Ok(mut records) = self.records.write() {
            records.insert(id, bytes);
        }
    }

    fn poisoned(path: &Path) -> CacheError {
        CacheError::Malformed {
            path: path.to_path_buf(),
            reason: "store lock poisoned".to_string(),
        }
    }
}

impl FingerprintStore for InMemoryStore {
    fn locate(&self, image: &Path) -> PathBuf {
        sidecar_path(image)
    }

    fn load(&self, id: &Path) -> Result<Fingerprint, CacheError> {
        let records = self.records.read().map_err(|_| Self::poisoned(id))?;
        let bytes = records.get(id).ok_or_else(|| CacheError::Missing {
            path: id.to_path_buf(),
        })?;
        self.codec.decode(bytes, id)
    }

    fn save(&self, image: &Path, fingerprint: &Fingerprint) -> Result<PathBuf, CacheError> {
        let id = self.locate(image);
        let bytes = self.codec.encode(fingerprint).map_err(|e| CacheError::Write {
            path: id.clone(),
            source: e,
        })?;

        let mut records = self.records.write().map_err(|_| Self::poisoned(&id))?;
        records.insert(id.clone(), bytes);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_fingerprint(name: &str) -> Fingerprint {
        Fingerprint::new(name, 10, vec![5; 12], GridSize::new(2, 2)).unwrap()
    }

    #[test]
    fn save_and_load() {
        let store = InMemoryStore::new(GridSize::new(2, 2));
        let image = Path::new("/photos/a.jpg");

        let id = store.save(image, &create_fingerprint("/photos/a.jpg")).unwrap();
        let loaded = store.load(&id).unwrap();

        assert_eq!(loaded.cells(), &[5; 12]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn load_missing_is_an_error() {
        let store = InMemoryStore::new(GridSize::new(2, 2));
        let result = store.load(Path::new("/photos/missing.jpg.cd.gz"));

        assert!(matches!(result, Err(CacheError::Missing { .. })));
    }

    #[test]
    fn corrupt_record_is_not_existing() {
        let store = InMemoryStore::new(GridSize::new(2, 2));
        let image = Path::new("/photos/a.jpg");
        store.insert_raw(store.locate(image), b"garbage".to_vec());

        assert_eq!(store.existing(image), None);
    }
}
