//! Sidecar file store.

use super::{sidecar_path, FingerprintStore, SidecarCodec};
use crate::core::fingerprint::{Fingerprint, GridSize};
use crate::error::CacheError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores each fingerprint in a `.cd.gz` file beside its image
#[derive(Debug, Clone, Copy)]
pub struct SidecarStore {
    codec: SidecarCodec,
}

impl SidecarStore {
    pub fn new(grid: GridSize) -> Self {
        Self {
            codec: SidecarCodec::new(grid),
        }
    }
}

impl FingerprintStore for SidecarStore {
    fn locate(&self, image: &Path) -> PathBuf {
        sidecar_path(image)
    }

    fn load(&self, id: &Path) -> Result<Fingerprint, CacheError> {
        let bytes = fs::read(id).map_err(|e| CacheError::Read {
            path: id.to_path_buf(),
            source: e,
        })?;
        self.codec.decode(&bytes, id)
    }

    fn save(&self, image: &Path, fingerprint: &Fingerprint) -> Result<PathBuf, CacheError> {
        let target = self.locate(image);
        let write_error = |source: std::io::Error| CacheError::Write {
            path: target.clone(),
            source,
        };

        let bytes = self.codec.encode(fingerprint).map_err(write_error)?;

        // Uniquely named file beside the target, renamed into place, so readers
        // never see a partial record. Dropped (and removed) on any failure.
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
        temp.write_all(&bytes).map_err(write_error)?;
        temp.persist(&target).map_err(|e| write_error(e.error))?;

        tracing::debug!(sidecar = %target.display(), "wrote fingerprint");
        Ok(target)
    }
}
