//! # Core Module
//!
//! The UI-agnostic fingerprinting and comparison engine.
//!
//! ## Modules
//! - `decoder` - Turns image files into rasters
//! - `fingerprint` - Reduces a raster to a grid of cell colors
//! - `cache` - Persists fingerprints in sidecar files
//! - `scheduler` - Fingerprints many images on a bounded worker pool
//! - `comparator` - Distance metrics and pair matching
//! - `scanner` - Expands command-line inputs into files
//! - `pipeline` - Orchestrates the full workflow

pub mod cache;
pub mod comparator;
pub mod decoder;
pub mod fingerprint;
pub mod pipeline;
pub mod scanner;
pub mod scheduler;

// Re-export commonly used types
pub use comparator::{ChannelBreakdown, DistanceMetric, MatchResult};
pub use fingerprint::{Fingerprint, GridSize};
pub use scheduler::{UnitOutcome, UnitStatus};
