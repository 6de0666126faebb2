//! Fingerprint store trait definition.

use crate::core::fingerprint::Fingerprint;
use crate::error::CacheError;
use std::path::{Path, PathBuf};

/// Where fingerprints are persisted
///
/// Records are addressed by an identifier derived from the image path
/// (the sidecar path for file-backed stores).
pub trait FingerprintStore: Send + Sync {
    /// Identifier of the record belonging to `image`
    fn locate(&self, image: &Path) -> PathBuf;

    /// Load a record by identifier
    fn load(&self, id: &Path) -> Result<Fingerprint, CacheError>;

    /// Persist the fingerprint of `image`, replacing any previous record
    fn save(&self, image: &Path, fingerprint: &Fingerprint) -> Result<PathBuf, CacheError>;

    /// Identifier of a record for `image` that exists and decodes cleanly
    fn existing(&self, image: &Path) -> Option<PathBuf> {
        let id = self.locate(image);
        self.load(&id).ok().map(|_| id)
    }
}
