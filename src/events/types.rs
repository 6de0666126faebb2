//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while fingerprinting and matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Input collection events
    Collect(CollectEvent),
    /// Fingerprinting phase events
    Fingerprint(FingerprintEvent),
    /// Comparison phase events
    Compare(CompareEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while expanding command-line inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CollectEvent {
    /// An input could not be used but collection continues
    Error { path: PathBuf, message: String },
    /// Collection completed
    Completed { images: usize, sidecars: usize },
}

/// Events during the fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total: usize },
    /// Progress update, sent once per finished unit
    Progress(FingerprintProgress),
    /// An existing sidecar was reused
    Skipped { path: PathBuf, sidecar: PathBuf },
    /// A unit failed but its siblings continue
    Error { path: PathBuf, message: String },
    /// Every unit has finished
    Completed {
        fingerprinted: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Progress information during fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProgress {
    /// Number of units finished so far
    pub completed: usize,
    /// Total number of units submitted
    pub total: usize,
    /// Image whose unit just finished
    pub current_path: PathBuf,
}

/// Events during the comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_comparisons: usize },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// A pair could not be compared
    Error {
        photo_a: String,
        photo_b: String,
        message: String,
    },
    /// Comparison completed
    Completed { comparisons: usize, matches: usize },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of comparisons completed
    pub comparisons_completed: usize,
    /// Total number of comparisons needed
    pub total_comparisons: usize,
    /// Number of matching pairs found so far
    pub matches_found: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Collecting,
    Fingerprinting,
    Loading,
    Comparing,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Images submitted for fingerprinting
    pub total_images: usize,
    /// Fingerprints loaded for comparison
    pub fingerprints_loaded: usize,
    /// Pairs compared
    pub comparisons: usize,
    /// Pairs within the threshold
    pub matches: usize,
    /// Recoverable errors encountered
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Collecting => write!(f, "Collecting"),
            PipelinePhase::Fingerprinting => write!(f, "Fingerprinting"),
            PipelinePhase::Loading => write!(f, "Loading"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
        }
    }
}
