//! Pair enumeration and match reporting.

use super::{ComparisonStrategy, DistanceMetric, MatchResult, ThresholdStrategy};
use crate::core::fingerprint::Fingerprint;
use crate::error::CompareError;
use crate::events::{null_sender, CompareEvent, CompareProgress, Event, EventSender};

/// A pair that could not be compared
#[derive(Debug, Clone, PartialEq)]
pub struct PairError {
    pub photo_a: String,
    pub photo_b: String,
    pub error: CompareError,
}

/// Everything a matching run produced
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    /// Kept results in comparison order: every pair when the matcher keeps
    /// unmatched pairs, otherwise only the matches
    pub results: Vec<MatchResult>,
    /// Pairs compared successfully, kept or not
    pub comparisons: usize,
    /// Pairs skipped because they could not be compared
    pub errors: Vec<PairError>,
}

impl MatchReport {
    /// Number of matched pairs
    pub fn match_count(&self) -> usize {
        self.results.iter().filter(|r| r.matched).count()
    }

    /// Results to show the user.
    ///
    /// Verbose: every kept pair as compared. Otherwise only matches, each
    /// with the larger source file first.
    pub fn surfaced(&self, verbose: bool) -> Vec<MatchResult> {
        if verbose {
            return self.results.clone();
        }
        self.results
            .iter()
            .filter(|r| r.matched)
            .map(MatchResult::larger_first)
            .collect()
    }
}

/// Compares fingerprints pairwise under one metric and threshold.
///
/// Non-matching pairs are counted but dropped unless `keep_unmatched` is
/// set, so an all-pairs run over a large library only holds its matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateMatcher {
    metric: DistanceMetric,
    strategy: ThresholdStrategy,
    keep_unmatched: bool,
}

impl DuplicateMatcher {
    pub fn new(metric: DistanceMetric, strategy: ThresholdStrategy) -> Self {
        Self {
            metric,
            strategy,
            keep_unmatched: false,
        }
    }

    /// Keep every compared pair in the report, not only matches
    pub fn keep_unmatched(mut self, keep: bool) -> Self {
        self.keep_unmatched = keep;
        self
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn threshold(&self) -> f64 {
        self.strategy.threshold()
    }

    /// Compare one pair
    pub fn compare(&self, a: &Fingerprint, b: &Fingerprint) -> Result<MatchResult, CompareError> {
        let distance = self.metric.distance(a, b)?;
        Ok(MatchResult {
            photo_a: a.path().to_string(),
            photo_b: b.path().to_string(),
            size_a: a.size(),
            size_b: b.size(),
            distance,
            matched: self.strategy.is_match(distance),
        })
    }

    /// Compare every unordered pair exactly once
    pub fn all_pairs(&self, fingerprints: &[Fingerprint]) -> MatchReport {
        self.all_pairs_with_events(fingerprints, &null_sender())
    }

    /// Compare every unordered pair exactly once, with progress events
    pub fn all_pairs_with_events(
        &self,
        fingerprints: &[Fingerprint],
        events: &EventSender,
    ) -> MatchReport {
        let n = fingerprints.len();
        let total = n.saturating_sub(1) * n / 2;
        let pairs = (0..n).flat_map(move |i| {
            ((i + 1)..n).map(move |j| (&fingerprints[i], &fingerprints[j]))
        });
        self.run(pairs, total, events)
    }

    /// Compare every reference against every candidate.
    ///
    /// Pairs where both sides are the same photo are skipped.
    pub fn against_reference(
        &self,
        references: &[Fingerprint],
        candidates: &[Fingerprint],
    ) -> MatchReport {
        self.against_reference_with_events(references, candidates, &null_sender())
    }

    /// Reference mode with progress events
    pub fn against_reference_with_events(
        &self,
        references: &[Fingerprint],
        candidates: &[Fingerprint],
        events: &EventSender,
    ) -> MatchReport {
        let pairs: Vec<_> = references
            .iter()
            .flat_map(|r| candidates.iter().map(move |c| (r, c)))
            .filter(|(r, c)| r.path() != c.path())
            .collect();
        let total = pairs.len();
        self.run(pairs.into_iter(), total, events)
    }

    fn run<'a>(
        &self,
        pairs: impl Iterator<Item = (&'a Fingerprint, &'a Fingerprint)>,
        total_comparisons: usize,
        events: &EventSender,
    ) -> MatchReport {
        events.send(Event::Compare(CompareEvent::Started { total_comparisons }));

        let mut report = MatchReport::default();
        let mut comparisons_completed = 0;
        let mut matches_found = 0;
        let update_interval = (total_comparisons / 50).clamp(1, 1000);

        for (a, b) in pairs {
            match self.compare(a, b) {
                Ok(result) => {
                    report.comparisons += 1;
                    if result.matched {
                        matches_found += 1;
                    }
                    if result.matched || self.keep_unmatched {
                        report.results.push(result);
                    }
                }
                Err(error) => {
                    tracing::warn!(a = a.path(), b = b.path(), %error, "skipping pair");
                    events.send(Event::Compare(CompareEvent::Error {
                        photo_a: a.path().to_string(),
                        photo_b: b.path().to_string(),
                        message: error.to_string(),
                    }));
                    report.errors.push(PairError {
                        photo_a: a.path().to_string(),
                        photo_b: b.path().to_string(),
                        error,
                    });
                }
            }

            comparisons_completed += 1;
            if comparisons_completed % update_interval == 0 {
                events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                    comparisons_completed,
                    total_comparisons,
                    matches_found,
                })));
            }
        }

        events.send(Event::Compare(CompareEvent::Completed {
            comparisons: comparisons_completed,
            matches: matches_found,
        }));

        report
    }
}
