//! # Scheduler Module
//!
//! Fingerprints many images in parallel and writes their sidecars.
//!
//! ## Concurrency
//! Units run on a dedicated rayon pool of exactly `parallelism` threads. Each
//! image is its own task, so a worker picks up the next queued image as soon
//! as it finishes one; there are no batch barriers. The call returns once
//! every unit has finished.
//!
//! Outcomes are gathered by rayon's indexed collect: every unit writes its
//! own slot, so the report holds exactly one outcome per submitted path, in
//! submission order, however the units interleaved.
//!
//! ## Failure isolation
//! A decode, validation or cache failure is recorded against its own image
//! and never stops the others. There is no cancellation, timeout or retry.

use crate::core::cache::FingerprintStore;
use crate::core::fingerprint::FingerprintSource;
use crate::error::{ConfigError, PdupeError};
use crate::events::{null_sender, Event, EventSender, FingerprintEvent, FingerprintProgress};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Configuration for a scheduling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of units in flight
    pub parallelism: usize,
    /// Regenerate sidecars even when a valid one exists
    pub overwrite: bool,
}

impl SchedulerConfig {
    /// One worker per available CPU, reuse existing sidecars
    pub fn new() -> Self {
        Self {
            parallelism: default_parallelism(),
            overwrite: false,
        }
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of CPUs available to this process, at least 1
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// How a single unit ended
#[derive(Debug)]
pub enum UnitStatus {
    /// A fresh fingerprint was extracted and stored
    Fingerprinted(PathBuf),
    /// A valid record already existed and was kept
    Skipped(PathBuf),
    /// The unit failed; siblings were unaffected
    Failed(PdupeError),
}

/// Outcome of one submitted image
#[derive(Debug)]
pub struct UnitOutcome {
    pub image: PathBuf,
    pub status: UnitStatus,
}

impl UnitOutcome {
    /// Identifier of the stored record, if the unit succeeded
    pub fn sidecar(&self) -> Option<&Path> {
        match &self.status {
            UnitStatus::Fingerprinted(id) | UnitStatus::Skipped(id) => Some(id),
            UnitStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PdupeError> {
        match &self.status {
            UnitStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Outcomes of a scheduling run, one per submitted path in submission order
#[derive(Debug, Default)]
pub struct ScheduleReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl ScheduleReport {
    /// Identifiers of every successfully produced or reused record
    pub fn sidecars(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.sidecar().map(Path::to_path_buf))
            .collect()
    }

    pub fn fingerprinted(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Fingerprinted(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&UnitStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }
}

/// Runs extraction and persistence over many images
pub struct FingerprintScheduler<'a> {
    source: &'a dyn FingerprintSource,
    store: &'a dyn FingerprintStore,
    config: SchedulerConfig,
}

impl<'a> FingerprintScheduler<'a> {
    pub fn new(
        source: &'a dyn FingerprintSource,
        store: &'a dyn FingerprintStore,
        config: SchedulerConfig,
    ) -> Result<Self, ConfigError> {
        if config.parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        Ok(Self {
            source,
            store,
            config,
        })
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Fingerprint every path without progress reporting
    pub fn run(&self, images: &[PathBuf]) -> Result<ScheduleReport, PdupeError> {
        self.run_with_events(images, &null_sender())
    }

    /// Fingerprint every path, reporting progress through `events`.
    ///
    /// Only failing to start the worker pool is an error; per-image failures
    /// are recorded in the report.
    pub fn run_with_events(
        &self,
        images: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScheduleReport, PdupeError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .thread_name(|i| format!("pdupe-worker-{}", i))
            .build()
            .map_err(|e| ConfigError::WorkerPool(e.to_string()))?;

        let total = images.len();
        let completed = AtomicUsize::new(0);

        events.send(Event::Fingerprint(FingerprintEvent::Started { total }));
        tracing::debug!(total, parallelism = self.config.parallelism, "fingerprinting");

        let outcomes: Vec<UnitOutcome> = pool.install(|| {
            images
                .par_iter()
                .with_max_len(1)
                .map(|image| {
                    let status = self.run_unit(image);
                    self.report_unit(image, &status, events);

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    events.send(Event::Fingerprint(FingerprintEvent::Progress(
                        FingerprintProgress {
                            completed: done,
                            total,
                            current_path: image.clone(),
                        },
                    )));

                    UnitOutcome {
                        image: image.clone(),
                        status,
                    }
                })
                .collect()
        });

        let report = ScheduleReport { outcomes };
        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            fingerprinted: report.fingerprinted(),
            skipped: report.skipped(),
            failed: report.failed(),
        }));

        Ok(report)
    }

    /// One image: reuse, or extract and store.
    fn run_unit(&self, image: &Path) -> UnitStatus {
        if !self.config.overwrite {
            if let Some(id) = self.store.existing(image) {
                return UnitStatus::Skipped(id);
            }
        }

        let stored = self
            .source
            .fingerprint(image)
            .and_then(|fingerprint| {
                self.store
                    .save(image, &fingerprint)
                    .map_err(PdupeError::from)
            });

        match stored {
            Ok(id) => UnitStatus::Fingerprinted(id),
            Err(error) => UnitStatus::Failed(error),
        }
    }

    fn report_unit(&self, image: &Path, status: &UnitStatus, events: &EventSender) {
        match status {
            UnitStatus::Skipped(id) => {
                tracing::debug!(image = %image.display(), "reusing existing fingerprint");
                events.send(Event::Fingerprint(FingerprintEvent::Skipped {
                    path: image.to_path_buf(),
                    sidecar: id.clone(),
                }));
            }
            UnitStatus::Failed(error) => {
                tracing::warn!(image = %image.display(), %error, "fingerprinting failed");
                events.send(Event::Fingerprint(FingerprintEvent::Error {
                    path: image.to_path_buf(),
                    message: error.to_string(),
                }));
            }
            UnitStatus::Fingerprinted(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::InMemoryStore;
    use crate::core::fingerprint::{Fingerprint, GridSize};
    use crate::error::{DecodeError, ValidationError};
    use crate::events::EventChannel;
    use std::time::Duration;

    const GRID: GridSize = GridSize { rows: 2, cols: 2 };

    /// Source that counts calls and fails for names containing "bad"
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FingerprintSource for CountingSource {
        fn fingerprint(&self, path: &Path) -> Result<Fingerprint, PdupeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let name = path.to_string_lossy();
            if name.contains("bad") {
                return Err(DecodeError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "bad bytes".to_string(),
                }
                .into());
            }
            if name.contains("blank") {
                return Err(ValidationError::Blank.into());
            }
            Ok(Fingerprint::new(name, 1, vec![9; GRID.byte_len()], GRID)?)
        }

        fn grid(&self) -> GridSize {
            GRID
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from(format!("/photos/{}", n))).collect()
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let result = FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(0));

        assert!(matches!(result, Err(ConfigError::ZeroParallelism)));
    }

    #[test]
    fn returns_one_outcome_per_path_in_order() {
        let source = CountingSource {
            delay: Some(Duration::from_millis(2)),
            ..Default::default()
        };
        let store = InMemoryStore::new(GRID);
        let images: Vec<PathBuf> = (0..20)
            .map(|i| {
                if i % 5 == 0 {
                    PathBuf::from(format!("/photos/bad{}.jpg", i))
                } else {
                    PathBuf::from(format!("/photos/{}.jpg", i))
                }
            })
            .collect();
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(3)).unwrap();

        let report = scheduler.run(&images).unwrap();

        assert_eq!(report.outcomes.len(), 20);
        for (outcome, image) in report.outcomes.iter().zip(&images) {
            assert_eq!(&outcome.image, image);
        }
        assert_eq!(report.failed(), 4);
        assert_eq!(report.fingerprinted(), 16);
        assert_eq!(report.sidecars().len(), 16);
        assert_eq!(store.len(), 16);
    }

    #[test]
    fn never_exceeds_parallelism() {
        let source = CountingSource {
            delay: Some(Duration::from_millis(5)),
            ..Default::default()
        };
        let store = InMemoryStore::new(GRID);
        let images: Vec<PathBuf> = (0..12).map(|i| PathBuf::from(format!("/p/{}.jpg", i))).collect();
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(2)).unwrap();

        scheduler.run(&images).unwrap();

        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 12);
    }

    /// Source whose "slow" images take far longer than the rest
    struct UnevenSource {
        finished: std::sync::Mutex<Vec<String>>,
    }

    impl FingerprintSource for UnevenSource {
        fn fingerprint(&self, path: &Path) -> Result<Fingerprint, PdupeError> {
            let name = path.to_string_lossy();
            let delay = if name.contains("slow") { 300 } else { 5 };
            std::thread::sleep(Duration::from_millis(delay));
            if let Ok(mut finished) = self.finished.lock() {
                finished.push(name.to_string());
            }
            Ok(Fingerprint::new(name, 1, vec![9; GRID.byte_len()], GRID)?)
        }

        fn grid(&self) -> GridSize {
            GRID
        }
    }

    #[test]
    fn idle_worker_drains_queue_while_another_is_busy() {
        let source = UnevenSource {
            finished: std::sync::Mutex::new(Vec::new()),
        };
        let store = InMemoryStore::new(GRID);
        let images = paths(&["slow.jpg", "a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"]);
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(2)).unwrap();

        let report = scheduler.run(&images).unwrap();

        let finished = source.finished.lock().unwrap().clone();
        assert_eq!(finished.len(), 7);
        assert_eq!(finished.last().map(String::as_str), Some("/photos/slow.jpg"));
        let order: Vec<_> = report.outcomes.iter().map(|o| o.image.clone()).collect();
        assert_eq!(order, images);
        assert_eq!(report.fingerprinted(), 7);
    }

    #[test]
    fn skips_existing_record_without_extracting() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let image = PathBuf::from("/photos/a.jpg");
        let existing = Fingerprint::new("/photos/a.jpg", 1, vec![3; GRID.byte_len()], GRID).unwrap();
        let id = store.save(&image, &existing).unwrap();
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(2)).unwrap();

        let report = scheduler.run(&[image]).unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(matches!(&report.outcomes[0].status, UnitStatus::Skipped(found) if *found == id));
    }

    #[test]
    fn overwrite_regenerates_existing_record() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let image = PathBuf::from("/photos/a.jpg");
        let existing = Fingerprint::new("/photos/a.jpg", 1, vec![3; GRID.byte_len()], GRID).unwrap();
        let id = store.save(&image, &existing).unwrap();
        let config = SchedulerConfig::new().parallelism(1).overwrite(true);
        let scheduler = FingerprintScheduler::new(&source, &store, config).unwrap();

        let report = scheduler.run(&[image]).unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.fingerprinted(), 1);
        assert_eq!(store.load(&id).unwrap().cells(), &[9; 12]);
    }

    #[test]
    fn corrupt_record_is_regenerated() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let image = PathBuf::from("/photos/a.jpg");
        store.insert_raw(store.locate(&image), b"garbage".to_vec());
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(1)).unwrap();

        let report = scheduler.run(&[image]).unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.fingerprinted(), 1);
    }

    #[test]
    fn failures_keep_their_error_kind() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(2)).unwrap();

        let report = scheduler.run(&paths(&["bad.jpg", "blank.jpg", "ok.jpg"])).unwrap();

        assert!(matches!(report.outcomes[0].error(), Some(PdupeError::Decode(_))));
        assert!(matches!(report.outcomes[1].error(), Some(PdupeError::Validation(_))));
        assert!(report.outcomes[2].sidecar().is_some());
    }

    #[test]
    fn empty_input_is_an_empty_report() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let scheduler = FingerprintScheduler::new(&source, &store, SchedulerConfig::new()).unwrap();

        let report = scheduler.run(&[]).unwrap();

        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn emits_one_progress_event_per_unit() {
        let source = CountingSource::default();
        let store = InMemoryStore::new(GRID);
        let scheduler =
            FingerprintScheduler::new(&source, &store, SchedulerConfig::new().parallelism(4)).unwrap();
        let (sender, receiver) = EventChannel::new();

        scheduler
            .run_with_events(&paths(&["a.jpg", "bad.jpg", "c.jpg", "d.jpg", "e.jpg"]), &sender)
            .unwrap();
        drop(sender);
        let events: Vec<_> = receiver.iter().collect();

        let progress = events
            .iter()
            .filter(|e| matches!(e, Event::Fingerprint(FingerprintEvent::Progress(_))))
            .count();
        let errors = events
            .iter()
            .filter(|e| matches!(e, Event::Fingerprint(FingerprintEvent::Error { .. })))
            .count();
        assert_eq!(progress, 5);
        assert_eq!(errors, 1);
        assert!(matches!(
            events.last(),
            Some(Event::Fingerprint(FingerprintEvent::Completed {
                fingerprinted: 4,
                skipped: 0,
                failed: 1
            }))
        ));
    }
}
