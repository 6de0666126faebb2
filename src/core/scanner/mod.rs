//! # Scanner Module
//!
//! Expands command-line inputs into the files a run works on.
//!
//! Arguments may name images, sidecar files (`*.cd.gz`) or directories.
//! Directories are walked recursively; named files are taken as given.
//! Every file appears at most once in the result, in first-seen order, no
//! matter how many spellings of its path were given.
//!
//! ## Example
//! ```rust,ignore
//! use pdupe::core::scanner::{InputScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let inputs = scanner.collect(&["/Users/photos".into()]);
//! ```

mod filter;
mod walker;

pub use filter::{InputFilter, InputKind};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Absolute path with `.`, `..` and symlinked directories resolved.
///
/// The file name itself is kept as given, so a symlinked image keeps its
/// own name (and extension) and its sidecar lands beside the link. Falls
/// back to the path as given when its directory cannot be resolved.
pub fn canonical_path(path: &Path) -> PathBuf {
    let resolved = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            fs::canonicalize(parent).map(|dir| dir.join(name))
        }
        _ => fs::canonicalize(path),
    };
    resolved.unwrap_or_else(|_| path.to_path_buf())
}

/// Files collected from the inputs
#[derive(Debug, Default)]
pub struct InputSet {
    /// Images to fingerprint
    pub images: Vec<PathBuf>,
    /// Existing sidecars to compare
    pub sidecars: Vec<PathBuf>,
    /// Inputs that could not be used (non-fatal)
    pub errors: Vec<ScanError>,
    seen: HashSet<PathBuf>,
}

impl InputSet {
    /// Add a file unless it was already collected under any spelling
    pub fn push(&mut self, path: PathBuf, kind: InputKind) {
        let path = canonical_path(&path);
        if !self.seen.insert(path.clone()) {
            return;
        }
        match kind {
            InputKind::Image => self.images.push(path),
            InputKind::Sidecar => self.sidecars.push(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.sidecars.is_empty()
    }
}

/// Trait for input collectors
///
/// Implement this trait to create custom collectors (e.g., for testing).
pub trait InputScanner: Send + Sync {
    /// Expand paths into images and sidecars
    fn collect(&self, paths: &[PathBuf]) -> InputSet;

    /// Expand paths, reporting unusable inputs via events
    fn collect_with_events(&self, paths: &[PathBuf], events: &EventSender) -> InputSet;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn input_set_deduplicates() {
        let mut set = InputSet::default();
        set.push(PathBuf::from("/nonexistent/a.jpg"), InputKind::Image);
        set.push(PathBuf::from("/nonexistent/a.jpg"), InputKind::Image);
        set.push(PathBuf::from("/nonexistent/b.jpg"), InputKind::Image);
        set.push(PathBuf::from("/nonexistent/a.jpg.cd.gz"), InputKind::Sidecar);

        assert_eq!(
            set.images,
            vec![PathBuf::from("/nonexistent/a.jpg"), PathBuf::from("/nonexistent/b.jpg")]
        );
        assert_eq!(set.sidecars.len(), 1);
    }

    #[test]
    fn input_set_deduplicates_spellings_of_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("a.png"), b"png").unwrap();

        let mut set = InputSet::default();
        set.push(root.join("a.png"), InputKind::Image);
        set.push(root.join("sub/../a.png"), InputKind::Image);
        set.push(root.join("./sub/../a.png"), InputKind::Image);

        assert_eq!(set.images, vec![root.join("a.png")]);
    }

    #[test]
    fn canonical_path_resolves_directories_but_keeps_the_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        fs::create_dir(root.join("sub")).unwrap();

        assert_eq!(canonical_path(&root.join("sub/../x.jpg")), root.join("x.jpg"));
        assert_eq!(canonical_path(&root.join("sub/.")), root.join("sub"));
        assert_eq!(
            canonical_path(Path::new("/nonexistent/dir/x.jpg")),
            PathBuf::from("/nonexistent/dir/x.jpg")
        );
    }

    #[cfg(unix)]
    #[test]
    fn canonical_path_keeps_symlinked_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        fs::write(root.join("blob"), b"png").unwrap();
        std::os::unix::fs::symlink(root.join("blob"), root.join("photo.png")).unwrap();

        assert_eq!(canonical_path(&root.join("photo.png")), root.join("photo.png"));
    }

    #[test]
    fn empty_set_is_empty() {
        assert!(InputSet::default().is_empty());
    }
}
