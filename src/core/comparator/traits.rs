//! Trait definitions for match decisions.

use super::DEFAULT_THRESHOLD;
use crate::error::ConfigError;

/// Strategy trait for deciding whether a distance counts as a match
pub trait ComparisonStrategy: Send + Sync {
    /// Determine if two photos should be considered a match based on distance
    fn is_match(&self, distance: f64) -> bool;

    /// Get the threshold used
    fn threshold(&self) -> f64;
}

/// Inclusive threshold comparison strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdStrategy {
    /// Maximum distance to consider a match
    threshold: f64,
}

impl ThresholdStrategy {
    /// Create a new threshold strategy without validation.
    ///
    /// Use [`ThresholdStrategy::checked`] for user-supplied values.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Create a strategy, rejecting negative or non-finite thresholds
    pub fn checked(threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }
        Ok(Self::new(threshold))
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_match(&self, distance: f64) -> bool {
        distance <= self.threshold
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_strategy_at_boundary() {
        let strategy = ThresholdStrategy::new(5.0);

        assert!(strategy.is_match(4.9));
        assert!(strategy.is_match(5.0));
        assert!(!strategy.is_match(5.000001));
    }

    #[test]
    fn checked_rejects_bad_values() {
        assert!(ThresholdStrategy::checked(-1.0).is_err());
        assert!(ThresholdStrategy::checked(f64::NAN).is_err());
        assert!(ThresholdStrategy::checked(f64::INFINITY).is_err());
        assert!(ThresholdStrategy::checked(0.0).is_ok());
    }

    #[test]
    fn default_threshold_is_40() {
        assert_eq!(ThresholdStrategy::default().threshold(), 40.0);
    }
}
