//! # Error Module
//!
//! Error types for fingerprinting and comparison.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file errors are recoverable** - only configuration errors are fatal

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PdupeError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Scan(#[from] ScanError),
}

/// Errors expanding command-line inputs into files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No such file: {path}")]
    NotFound { path: PathBuf },

    #[error("Cannot process unrecognized file type: {path}")]
    Unrecognized { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {reason}")]
    ReadDirectory { path: PathBuf, reason: String },
}

/// Errors turning image bytes into a raster
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unsupported image format for {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An extracted or decoded fingerprint broke its structural invariant
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Expected {expected} fingerprint bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Fingerprint contains no color data")]
    Blank,

    #[error("Image {width}x{height} is smaller than the {cols}x{rows} grid")]
    RasterTooSmall {
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },

    #[error("Grid must have at least one row and one column")]
    EmptyGrid,
}

/// Errors reading or writing sidecar fingerprint files
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed fingerprint record in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("No fingerprint stored for {path}")]
    Missing { path: PathBuf },
}

/// Errors comparing two fingerprints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("Cannot compare {a} ({a_len} bytes) with {b} ({b_len} bytes)")]
    LengthMismatch {
        a: String,
        a_len: usize,
        b: String,
        b_len: usize,
    },
}

/// Invalid run configuration. Always fatal.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Must select files to process")]
    NoInputs,

    #[error("Unknown metric '{name}' (expected simple, prism or stddev)")]
    UnknownMetric { name: String },

    #[error("Invalid threshold {value}: must be a non-negative number")]
    InvalidThreshold { value: f64 },

    #[error("Parallelism must be at least 1")]
    ZeroParallelism,

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Reference {path} could not be fingerprinted: {reason}")]
    Reference { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PdupeError>;
