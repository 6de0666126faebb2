//! Sidecar record encoding: JSON inside gzip.

use super::resolve_display_path;
use crate::core::fingerprint::{Fingerprint, GridSize};
use crate::error::CacheError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::path::Path;

/// On-disk record. `Path` is recomputed on load and never written.
#[derive(Debug, Serialize, Deserialize)]
struct SidecarRecord {
    #[serde(rename = "Size", default)]
    size: i64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Cdata")]
    cdata: Vec<u8>,
}

/// Encodes and decodes fingerprints for a fixed grid
#[derive(Debug, Clone, Copy)]
pub struct SidecarCodec {
    grid: GridSize,
}

impl SidecarCodec {
    pub fn new(grid: GridSize) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Serialize and compress a fingerprint
    pub fn encode(&self, fingerprint: &Fingerprint) -> io::Result<Vec<u8>> {
        let record = SidecarRecord {
            size: fingerprint.size(),
            name: fingerprint.name().to_string(),
            cdata: fingerprint.cells().to_vec(),
        };
        let json = serde_json::to_vec(&record).map_err(io::Error::other)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()
    }

    /// Decompress and deserialize the record read from `sidecar`.
    ///
    /// The fingerprint's display path is resolved against the filesystem.
    pub fn decode(&self, bytes: &[u8], sidecar: &Path) -> Result<Fingerprint, CacheError> {
        let malformed = |reason: String| CacheError::Malformed {
            path: sidecar.to_path_buf(),
            reason,
        };

        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|e| malformed(format!("decompression failed: {}", e)))?;

        let record: SidecarRecord = serde_json::from_slice(&json)
            .map_err(|e| malformed(format!("invalid record: {}", e)))?;

        let display = resolve_display_path(sidecar, &record.name);
        let fingerprint = Fingerprint::new(record.name, record.size, record.cdata, self.grid)
            .map_err(|e| malformed(e.to_string()))?;

        Ok(fingerprint.with_path(display))
    }
}
