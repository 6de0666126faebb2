//! # pdupe
//!
//! Finds similar and duplicate photos by reducing each image to a coarse grid
//! of average colors and comparing those grids.
//!
//! ## Core Philosophy
//! - **Compute once** - Fingerprints live next to their images in `.cd.gz` sidecars
//! - **Never abort on one bad file** - Per-file problems are reported and skipped
//! - **Report, don't act** - Nothing is moved or deleted
//!
//! ## Architecture
//! - `core` - The fingerprinting and comparison engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{PdupeError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. Filtering follows
/// `RUST_LOG`; output goes to stderr so it never mixes with results.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
