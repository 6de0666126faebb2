//! Classifies candidate files by name.

use crate::core::cache::is_sidecar;
use std::collections::HashSet;
use std::path::Path;

/// What a collected file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// An image to fingerprint
    Image,
    /// A previously written sidecar to compare
    Sidecar,
}

/// Decides which files take part in a run
pub struct InputFilter {
    /// Image extensions to include, lowercase
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl InputFilter {
    /// Create a new filter accepting the formats the decoder handles
    pub fn new() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
    }

    /// Kind of a file, or `None` if it should be ignored
    pub fn classify(&self, path: &Path) -> Option<InputKind> {
        if !self.include_hidden && Self::is_hidden(path) {
            return None;
        }
        self.kind_of(path)
    }

    /// Kind of a file by name alone, ignoring the hidden-file rule
    pub fn kind_of(&self, path: &Path) -> Option<InputKind> {
        if is_sidecar(path) {
            return Some(InputKind::Sidecar);
        }
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.extensions.contains(&ext).then_some(InputKind::Image)
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::new()
    }
}
