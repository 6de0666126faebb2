//! Input expansion using walkdir.

use super::{InputFilter, InputScanner, InputSet};
use crate::error::ScanError;
use crate::events::{null_sender, CollectEvent, Event, EventSender};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for input collection
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
}

/// Collector implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: InputFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = InputFilter::new().with_hidden(config.include_hidden);
        Self { config, filter }
    }

    /// A file named explicitly on the command line
    fn collect_file(&self, path: &Path, set: &mut InputSet) -> Result<(), ScanError> {
        match self.filter.kind_of(path) {
            Some(kind) => {
                set.push(path.to_path_buf(), kind);
                Ok(())
            }
            None => Err(ScanError::Unrecognized {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Walk a directory, collecting every recognized file below it
    fn collect_directory(&self, root: &Path, set: &mut InputSet) -> Vec<ScanError> {
        let mut errors = Vec::new();
        let include_hidden = self.config.include_hidden;

        let walker = WalkDir::new(root).sort_by_file_name();

        let visible = |entry: &DirEntry| {
            include_hidden || entry.depth() == 0 || !InputFilter::is_hidden(entry.path())
        };

        for entry_result in walker.into_iter().filter_entry(visible) {
            match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() && !entry.path().is_file() {
                        continue;
                    }
                    if let Some(kind) = self.filter.classify(entry.path()) {
                        set.push(entry.into_path(), kind);
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            reason: e.to_string(),
                        }
                    };
                    errors.push(error);
                }
            }
        }

        errors
    }
}

impl InputScanner for WalkDirScanner {
    fn collect(&self, paths: &[PathBuf]) -> InputSet {
        self.collect_with_events(paths, &null_sender())
    }

    fn collect_with_events(&self, paths: &[PathBuf], events: &EventSender) -> InputSet {
        let mut set = InputSet::default();
        let mut errors = Vec::new();

        for path in paths {
            if path.is_dir() {
                errors.extend(self.collect_directory(path, &mut set));
            } else if path.exists() {
                if let Err(e) = self.collect_file(path, &mut set) {
                    errors.push(e);
                }
            } else {
                errors.push(ScanError::NotFound { path: path.clone() });
            }
        }

        for error in &errors {
            let path = match error {
                ScanError::NotFound { path }
                | ScanError::Unrecognized { path }
                | ScanError::PermissionDenied { path }
                | ScanError::ReadDirectory { path, .. } => path.clone(),
            };
            events.send(Event::Collect(CollectEvent::Error {
                path,
                message: error.to_string(),
            }));
        }

        events.send(Event::Collect(CollectEvent::Completed {
            images: set.images.len(),
            sidecars: set.sidecars.len(),
        }));

        set.errors = errors;
        set
    }
}
