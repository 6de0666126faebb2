//! Pipeline execution implementation.

use crate::core::cache::{is_sidecar, FingerprintStore, SidecarStore};
use crate::core::comparator::{
    DistanceMetric, DuplicateMatcher, MatchReport, ThresholdStrategy, DEFAULT_THRESHOLD,
};
use crate::core::fingerprint::{
    ExtractorConfig, Fingerprint, FingerprintSource, GridSize, ImageFingerprinter,
};
use crate::core::scanner::{canonical_path, InputScanner, ScanConfig, WalkDirScanner};
use crate::core::scheduler::{FingerprintScheduler, ScheduleReport, SchedulerConfig};
use crate::error::{ConfigError, PdupeError};
use crate::events::{
    null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of pipeline execution
#[derive(Debug, Default)]
pub struct PipelineResult {
    /// One outcome per image submitted for fingerprinting
    pub fingerprinting: ScheduleReport,
    /// Fingerprints loaded for comparison, in load order
    pub fingerprints: Vec<Fingerprint>,
    /// The loaded reference, in reference mode
    pub reference: Option<Fingerprint>,
    /// Comparison results, empty in fingerprint-only runs
    pub matches: MatchReport,
    /// Recoverable errors encountered, one message each
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Images, sidecars or directories to process
    pub paths: Vec<PathBuf>,
    /// Compare everything against this image or sidecar
    pub reference: Option<PathBuf>,
    /// Distance metric
    pub metric: DistanceMetric,
    /// Inclusive match threshold
    pub threshold: f64,
    /// Fingerprint grid resolution
    pub grid: GridSize,
    /// Parallelism and overwrite policy
    pub scheduler: SchedulerConfig,
    /// Stop after writing sidecars
    pub fingerprint_only: bool,
    /// Keep every compared pair, not only matches
    pub verbose: bool,
    /// Input collection configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            reference: None,
            metric: DistanceMetric::Simple,
            threshold: DEFAULT_THRESHOLD,
            grid: GridSize::default(),
            scheduler: SchedulerConfig::default(),
            fingerprint_only: false,
            verbose: false,
            scan_config: ScanConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    store: Option<Box<dyn FingerprintStore>>,
    source: Option<Box<dyn FingerprintSource>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            store: None,
            source: None,
        }
    }

    /// Inputs to process
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    /// Compare against a single reference image or sidecar
    pub fn reference(mut self, reference: Option<PathBuf>) -> Self {
        self.config.reference = reference;
        self
    }

    /// Set the distance metric
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the match threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the grid resolution
    pub fn grid(mut self, rows: u32, cols: u32) -> Self {
        self.config.grid = GridSize::new(rows, cols);
        self
    }

    /// Maximum number of images fingerprinted at once
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.config.scheduler = self.config.scheduler.parallelism(parallelism);
        self
    }

    /// Regenerate existing sidecars
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.scheduler = self.config.scheduler.overwrite(overwrite);
        self
    }

    /// Skip the comparison stage
    pub fn fingerprint_only(mut self, fingerprint_only: bool) -> Self {
        self.config.fingerprint_only = fingerprint_only;
        self
    }

    /// Keep non-matching pairs in the result
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Set input collection configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Use a different fingerprint store
    pub fn store(mut self, store: Box<dyn FingerprintStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a different fingerprint source
    pub fn source(mut self, source: Box<dyn FingerprintSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the pipeline, validating the configuration
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let config = self.config;

        let strategy = ThresholdStrategy::checked(config.threshold)?;
        if config.scheduler.parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }

        let source: Box<dyn FingerprintSource> = match self.source {
            Some(source) => source,
            None => {
                let extractor = ExtractorConfig::new()
                    .grid(config.grid.rows, config.grid.cols)
                    .build()?;
                Box::new(ImageFingerprinter::new(extractor))
            }
        };
        let store: Box<dyn FingerprintStore> = match self.store {
            Some(store) => store,
            None => Box::new(SidecarStore::new(source.grid())),
        };
        let matcher =
            DuplicateMatcher::new(config.metric, strategy).keep_unmatched(config.verbose);

        Ok(Pipeline {
            config,
            store,
            source,
            matcher,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The fingerprint and comparison pipeline
pub struct Pipeline {
    config: PipelineConfig,
    store: Box<dyn FingerprintStore>,
    source: Box<dyn FingerprintSource>,
    matcher: DuplicateMatcher,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn matcher(&self) -> &DuplicateMatcher {
        &self.matcher
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, PdupeError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Returns an error only for fatal configuration problems; everything
    /// per-file lands in `PipelineResult::errors`.
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult, PdupeError> {
        let start_time = Instant::now();
        let mut result = PipelineResult::default();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Collecting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Collecting,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let mut inputs = scanner.collect_with_events(&self.config.paths, events);
        result.errors.extend(
            std::mem::take(&mut inputs.errors)
                .into_iter()
                .map(|e| PdupeError::from(e).to_string()),
        );

        // Same spelling as collected inputs, so the reference is recognized among them
        let reference_path = self.config.reference.as_deref().map(canonical_path);

        if inputs.is_empty() && reference_path.is_none() {
            return Err(ConfigError::NoInputs.into());
        }

        // Phase 2: Fingerprinting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Fingerprinting,
        }));

        let mut images = inputs.images.clone();
        let reference_image = reference_path.clone().filter(|r| !is_sidecar(r));
        if let Some(reference) = &reference_image {
            if !images.contains(reference) {
                images.push(reference.clone());
            }
        }

        let scheduler =
            FingerprintScheduler::new(self.source.as_ref(), self.store.as_ref(), self.config.scheduler)?;
        result.fingerprinting = scheduler.run_with_events(&images, events)?;
        result.errors.extend(
            result
                .fingerprinting
                .outcomes
                .iter()
                .filter_map(|o| o.error().map(|e| e.to_string())),
        );

        if self.config.fingerprint_only {
            return Ok(self.finish(result, start_time, events));
        }

        // Phase 3: Loading
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Loading,
        }));

        let reference = match &reference_path {
            Some(path) => Some(self.load_reference(path, &result.fingerprinting)?),
            None => None,
        };

        let mut seen = HashSet::new();
        let sidecars: Vec<PathBuf> = result
            .fingerprinting
            .outcomes
            .iter()
            .filter(|o| Some(&o.image) != reference_image.as_ref() || inputs.images.contains(&o.image))
            .filter_map(|o| o.sidecar().map(Path::to_path_buf))
            .chain(inputs.sidecars.iter().cloned())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        for id in &sidecars {
            match self.store.load(id) {
                Ok(fingerprint) => result.fingerprints.push(fingerprint),
                Err(error) => {
                    tracing::warn!(sidecar = %id.display(), %error, "skipping unreadable fingerprint");
                    result.errors.push(PdupeError::from(error).to_string());
                }
            }
        }

        // Phase 4: Comparing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        result.matches = match &reference {
            Some(reference) => self.matcher.against_reference_with_events(
                std::slice::from_ref(reference),
                &result.fingerprints,
                events,
            ),
            None => self
                .matcher
                .all_pairs_with_events(&result.fingerprints, events),
        };
        result.reference = reference;
        result.errors.extend(
            result
                .matches
                .errors
                .iter()
                .map(|e| PdupeError::from(e.error.clone()).to_string()),
        );

        Ok(self.finish(result, start_time, events))
    }

    /// Resolve the reference to a loaded fingerprint. Failure is fatal.
    fn load_reference(&self, path: &Path, report: &ScheduleReport) -> Result<Fingerprint, PdupeError> {
        let fatal = |reason: String| ConfigError::Reference {
            path: path.to_path_buf(),
            reason,
        };

        let id = if is_sidecar(path) {
            path.to_path_buf()
        } else {
            let outcome = report
                .outcomes
                .iter()
                .find(|o| o.image == path)
                .ok_or_else(|| fatal("not fingerprinted".to_string()))?;
            match outcome.sidecar() {
                Some(id) => id.to_path_buf(),
                None => {
                    let reason = outcome
                        .error()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "not fingerprinted".to_string());
                    return Err(fatal(reason).into());
                }
            }
        };

        self.store
            .load(&id)
            .map_err(|e| PdupeError::from(fatal(e.to_string())))
    }

    fn finish(&self, mut result: PipelineResult, start_time: Instant, events: &EventSender) -> PipelineResult {
        result.duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images: result.fingerprinting.outcomes.len(),
                fingerprints_loaded: result.fingerprints.len(),
                comparisons: result.matches.comparisons,
                matches: result.matches.match_count(),
                errors: result.errors.len(),
                duration_ms: result.duration_ms,
            },
        }));

        result
    }
}
