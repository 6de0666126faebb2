//! # Pipeline Module
//!
//! Orchestrates a full run.
//!
//! ## Pipeline Stages
//! 1. **Collect** - Expand inputs into images and existing sidecars
//! 2. **Fingerprint** - Extract and store fingerprints (skipping fresh sidecars)
//! 3. **Load** - Read every sidecar taking part in the comparison
//! 4. **Compare** - All pairs, or everything against a reference
//!
//! ## Parallelism
//! Fingerprinting runs on a rayon pool sized by the configured parallelism.
//! Loading and comparing are cheap and run on the calling thread.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
