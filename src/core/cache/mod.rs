//! # Cache Module
//!
//! Persists fingerprints next to their images so later runs skip extraction.
//!
//! ## Sidecar Files
//! A fingerprint for `photo.jpg` lives in `photo.jpg.cd.gz`: a gzip
//! compressed JSON record holding the source size, the source name and the
//! cell bytes. The source path is never trusted from the record; on load it is
//! recomputed by stripping the suffix from the sidecar path.
//!
//! ## Backends
//! - `SidecarStore` - sidecar files on disk
//! - `InMemoryStore` - for testing

mod codec;
mod memory;
mod sidecar;
mod traits;

pub use codec::SidecarCodec;
pub use memory::InMemoryStore;
pub use sidecar::SidecarStore;
pub use traits::FingerprintStore;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended to an image path to name its sidecar
pub const SIDECAR_SUFFIX: &str = ".cd.gz";

/// Sidecar path for an image: the image path with [`SIDECAR_SUFFIX`] appended
pub fn sidecar_path(image: &Path) -> PathBuf {
    let mut name = OsString::from(image.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Whether a path names a sidecar file
pub fn is_sidecar(path: &Path) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .ends_with(SIDECAR_SUFFIX.as_bytes())
}

/// Image path a sidecar was written for, if the sidecar is suffixed correctly.
///
/// Works on the raw path so names that are not valid UTF-8 survive.
pub fn source_path(sidecar: &Path) -> Option<PathBuf> {
    let name = sidecar.file_name()?.as_encoded_bytes();
    let stem = name.strip_suffix(SIDECAR_SUFFIX.as_bytes())?;
    if stem.is_empty() {
        return None;
    }
    // `.gz` then `.cd`
    Some(sidecar.with_extension("").with_extension(""))
}

/// Display path for a loaded fingerprint.
///
/// The live image path when it still exists, otherwise the stored name in
/// double quotes to flag that the original may be gone.
pub fn resolve_display_path(sidecar: &Path, stored_name: &str) -> String {
    match source_path(sidecar) {
        Some(source) if source.exists() => source.to_string_lossy().into_owned(),
        _ => format!("\"{}\"", stored_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/photos/a.jpg")),
            PathBuf::from("/photos/a.jpg.cd.gz")
        );
    }

    #[test]
    fn source_path_strips_suffix() {
        assert_eq!(
            source_path(Path::new("/photos/a.jpg.cd.gz")),
            Some(PathBuf::from("/photos/a.jpg"))
        );
        assert_eq!(source_path(Path::new("/photos/a.jpg")), None);
        assert_eq!(source_path(Path::new(".cd.gz")), None);
    }

    #[test]
    fn is_sidecar_checks_suffix() {
        assert!(is_sidecar(Path::new("a.jpg.cd.gz")));
        assert!(!is_sidecar(Path::new("a.jpg")));
        assert!(!is_sidecar(Path::new("a.gz")));
    }

    #[test]
    fn source_path_keeps_inner_dots() {
        assert_eq!(
            source_path(Path::new("/photos/v1.2/a.b.jpg.cd.gz")),
            Some(PathBuf::from("/photos/v1.2/a.b.jpg"))
        );
        assert_eq!(source_path(Path::new("/photos/.cd.gz")), None);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_resolve_to_the_live_image() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let image = dir.path().join(OsStr::from_bytes(b"caf\xe9.jpg"));
        if std::fs::write(&image, b"x").is_err() {
            // Filesystems that insist on UTF-8 names cannot hold this file
            return;
        }
        let sidecar = sidecar_path(&image);

        assert!(is_sidecar(&sidecar));
        assert_eq!(source_path(&sidecar), Some(image.clone()));
        assert_eq!(
            resolve_display_path(&sidecar, "/old/caf.jpg"),
            image.to_string_lossy()
        );
    }

    #[test]
    fn display_path_is_live_when_image_exists() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("a.jpg");
        std::fs::write(&image, b"x").unwrap();

        let display = resolve_display_path(&sidecar_path(&image), "/old/place/a.jpg");

        assert_eq!(display, image.to_string_lossy());
    }

    #[test]
    fn display_path_is_quoted_when_image_missing() {
        let display = resolve_display_path(Path::new("/gone/a.jpg.cd.gz"), "/gone/a.jpg");
        assert_eq!(display, "\"/gone/a.jpg\"");
    }
}
