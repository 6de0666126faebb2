//! # Comparator Module
//!
//! Measures how far apart two fingerprints are.
//!
//! ## Metrics
//! | Metric       | CLI name | Measures                                         |
//! |--------------|----------|--------------------------------------------------|
//! | `Simple`     | simple   | mean absolute byte difference                    |
//! | `PerChannel` | prism    | per-channel mean absolute difference, averaged   |
//! | `StdDev`     | stddev   | spread of the signed per-channel differences     |
//!
//! `PerChannel` always equals `Simple` for equal-length fingerprints. It is
//! kept so output from older runs stays comparable, and is the natural place to
//! add per-channel weights later.
//!
//! `StdDev` ignores a uniform shift: a copy of a photo that is only brighter
//! scores near zero, where `Simple` scores the size of the shift.

mod matcher;
mod traits;

pub use matcher::{DuplicateMatcher, MatchReport, PairError};
pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::core::fingerprint::Fingerprint;
use crate::error::{CompareError, ConfigError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default match threshold for every metric
pub const DEFAULT_THRESHOLD: f64 = 40.0;

/// Distance metric selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Simple,
    PerChannel,
    StdDev,
}

impl DistanceMetric {
    /// Distance between two fingerprints under this metric
    pub fn distance(&self, a: &Fingerprint, b: &Fingerprint) -> Result<f64, CompareError> {
        check_lengths(a, b)?;
        let (a, b) = (a.cells(), b.cells());
        Ok(match self {
            DistanceMetric::Simple => simple(a, b),
            DistanceMetric::PerChannel => per_channel(a, b),
            DistanceMetric::StdDev => std_dev(a, b),
        })
    }

    /// Name used on the command line and in output
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Simple => "simple",
            DistanceMetric::PerChannel => "prism",
            DistanceMetric::StdDev => "stddev",
        }
    }

}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(DistanceMetric::Simple),
            "prism" | "perchannel" | "per-channel" => Ok(DistanceMetric::PerChannel),
            "stddev" => Ok(DistanceMetric::StdDev),
            _ => Err(ConfigError::UnknownMetric {
                name: s.to_string(),
            }),
        }
    }
}

/// Result of comparing two fingerprints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identity (display path) of the first fingerprint
    pub photo_a: String,
    /// Identity (display path) of the second fingerprint
    pub photo_b: String,
    /// Source byte size of the first photo
    pub size_a: i64,
    /// Source byte size of the second photo
    pub size_b: i64,
    /// Distance under the configured metric
    pub distance: f64,
    /// Whether `distance <= threshold`
    pub matched: bool,
}

impl MatchResult {
    /// The same pair with the larger source file listed first.
    ///
    /// The bigger file is more likely the original. Equal sizes keep the
    /// compared order.
    pub fn larger_first(&self) -> MatchResult {
        if self.size_b > self.size_a {
            MatchResult {
                photo_a: self.photo_b.clone(),
                photo_b: self.photo_a.clone(),
                size_a: self.size_b,
                size_b: self.size_a,
                distance: self.distance,
                matched: self.matched,
            }
        } else {
            self.clone()
        }
    }
}

/// Per-channel figures behind a distance, for verbose output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelBreakdown {
    /// Mean absolute difference of R, G, B
    pub mean_abs: [f64; 3],
    /// Mean of signed differences of R, G, B
    pub mean_signed: [f64; 3],
    /// Sample standard deviation of signed differences of R, G, B
    pub std_dev: [f64; 3],
}

impl ChannelBreakdown {
    pub fn compute(a: &Fingerprint, b: &Fingerprint) -> Result<Self, CompareError> {
        check_lengths(a, b)?;
        let (a, b) = (a.cells(), b.cells());

        let mut mean_abs = [0.0; 3];
        let mut mean_signed = [0.0; 3];
        let mut std_dev = [0.0; 3];
        for channel in 0..3 {
            let diffs = signed_diffs(a, b, channel);
            let abs_sum: f64 = diffs.iter().map(|d| d.abs()).sum();
            mean_abs[channel] = abs_sum / diffs.len().max(1) as f64;
            mean_signed[channel] = mean(&diffs);
            std_dev[channel] = sample_std_dev(&diffs, mean_signed[channel]);
        }

        Ok(Self {
            mean_abs,
            mean_signed,
            std_dev,
        })
    }
}

fn check_lengths(a: &Fingerprint, b: &Fingerprint) -> Result<(), CompareError> {
    if a.len() != b.len() {
        return Err(CompareError::LengthMismatch {
            a: a.path().to_string(),
            a_len: a.len(),
            b: b.path().to_string(),
            b_len: b.len(),
        });
    }
    Ok(())
}

/// Mean absolute difference over all bytes.
fn simple(a: &[u8], b: &[u8]) -> f64 {
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    total as f64 / a.len() as f64
}

/// Average of the three per-channel mean absolute differences.
fn per_channel(a: &[u8], b: &[u8]) -> f64 {
    let mut sums = [0u64; 3];
    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        sums[i % 3] += x.abs_diff(y) as u64;
    }
    let samples = a.len() as f64 / 3.0;
    sums.iter().map(|&s| s as f64 / samples).sum::<f64>() / 3.0
}

/// Mean of the absolute per-channel standard deviations of signed differences.
fn std_dev(a: &[u8], b: &[u8]) -> f64 {
    let total: f64 = (0..3)
        .map(|channel| {
            let diffs = signed_diffs(a, b, channel);
            sample_std_dev(&diffs, mean(&diffs)).abs()
        })
        .sum();
    total / 3.0
}

fn signed_diffs(a: &[u8], b: &[u8], channel: usize) -> Vec<f64> {
    a.iter()
        .zip(b)
        .skip(channel)
        .step_by(3)
        .map(|(&x, &y)| x as f64 - y as f64)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (Bessel's correction). Zero below two samples.
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (squares / (values.len() - 1) as f64).sqrt()
}
