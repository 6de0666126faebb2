//! From image file to fingerprint.

use super::{GridExtractor, GridSize};
use crate::core::decoder::{FastDecoder, ImageDecoder};
use crate::core::fingerprint::Fingerprint;
use crate::error::{CacheError, PdupeError};
use std::fs;
use std::path::Path;

/// Anything that can produce a fingerprint for an image path
///
/// The scheduler is written against this trait so tests can count calls.
pub trait FingerprintSource: Send + Sync {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, PdupeError>;

    /// Grid the produced fingerprints cover
    fn grid(&self) -> GridSize;
}

/// Decodes an image file and extracts its grid fingerprint
pub struct ImageFingerprinter<D = FastDecoder> {
    decoder: D,
    extractor: GridExtractor,
}

impl ImageFingerprinter<FastDecoder> {
    /// Fingerprinter using the default decoder
    pub fn new(extractor: GridExtractor) -> Self {
        Self::with_decoder(FastDecoder::new(), extractor)
    }
}

impl<D: ImageDecoder> ImageFingerprinter<D> {
    pub fn with_decoder(decoder: D, extractor: GridExtractor) -> Self {
        Self { decoder, extractor }
    }
}

impl<D: ImageDecoder> FingerprintSource for ImageFingerprinter<D> {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, PdupeError> {
        let metadata = fs::metadata(path).map_err(|e| CacheError::Stat {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raster = self.decoder.decode(path)?;
        let name = path.to_string_lossy();
        let size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);

        Ok(self.extractor.extract(&raster, &name, size)?)
    }

    fn grid(&self) -> GridSize {
        self.extractor.grid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn fingerprints_image_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        RgbImage::from_pixel(64, 64, Rgb([120, 60, 30])).save(&path).unwrap();

        let fingerprinter = ImageFingerprinter::new(GridExtractor::new(GridSize::default()));
        let fp = fingerprinter.fingerprint(&path).unwrap();

        assert_eq!(fp.name(), path.to_string_lossy());
        assert_eq!(fp.size() as u64, fs::metadata(&path).unwrap().len());
        assert_eq!(&fp.cells()[0..3], &[120, 60, 30]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let fingerprinter = ImageFingerprinter::new(GridExtractor::new(GridSize::default()));
        let result = fingerprinter.fingerprint(Path::new("/nonexistent/photo.png"));

        assert!(matches!(result, Err(PdupeError::Cache(CacheError::Stat { .. }))));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.png");
        fs::write(&path, b"not a png").unwrap();

        let fingerprinter = ImageFingerprinter::new(GridExtractor::new(GridSize::default()));
        let result = fingerprinter.fingerprint(&path);

        assert!(matches!(result, Err(PdupeError::Decode(_))));
    }
}
