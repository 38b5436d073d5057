//! Parallel metadata attachment over a set of files.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{info, warn};

use srcmeta_core::{
    BaselineLookupError, BatchError, FileStatus, InputFile, MetadataConfig, MetadataError,
    UnreadableFileError,
};

use crate::generator::MetadataGenerator;
use crate::progress::MetadataProgress;
use crate::registry::FileRegistry;

/// Send a progress update every this many files.
const PROGRESS_INTERVAL: u64 = 100;

/// Result of a completed batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Files with attached metadata.
    pub registry: FileRegistry,
    /// Unreadable files that were skipped.
    pub skipped: Vec<UnreadableFileError>,
    /// Files skipped because their baseline lookup failed.
    pub baseline_failures: Vec<BaselineLookupError>,
    /// Keys given more than once; only the first descriptor was published.
    pub duplicates: Vec<String>,
    /// Number of files with status ADDED.
    pub added: u64,
    /// Number of files with status CHANGED.
    pub changed: u64,
    /// Number of files with status SAME.
    pub same: u64,
    /// Wall time of the batch.
    pub elapsed: Duration,
}

impl BatchReport {
    fn new(registry: FileRegistry) -> Self {
        Self {
            registry,
            skipped: Vec::new(),
            baseline_failures: Vec::new(),
            duplicates: Vec::new(),
            added: 0,
            changed: 0,
            same: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::Added => self.added += 1,
            FileStatus::Changed => self.changed += 1,
            FileStatus::Same => self.same += 1,
        }
    }

    /// Number of files with attached metadata.
    pub fn published(&self) -> usize {
        self.registry.len()
    }

    /// Check if any file was skipped.
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
            || !self.baseline_failures.is_empty()
            || !self.duplicates.is_empty()
    }
}

/// Outcome of one file.
enum Outcome {
    Published(FileStatus),
    Skipped(UnreadableFileError),
    BaselineFailed(BaselineLookupError),
    Duplicate(String),
    Fatal(MetadataError),
    Cancelled,
}

/// Shared state of one run.
struct RunState {
    registry: FileRegistry,
    stop: AtomicBool,
    processed: AtomicU64,
    failures: AtomicU64,
    total: u64,
    start: Instant,
}

/// Attaches metadata to many files on a bounded worker pool.
///
/// Files are processed in no particular order. Unreadable files and failed
/// baseline lookups are skipped with a warning unless `abort_on_unreadable`
/// or `abort_on_baseline_error` is set. A key seen twice keeps its first
/// descriptor. Once stopped, files already in flight finish but no new file
/// is started.
pub struct MetadataBatch {
    config: MetadataConfig,
    generator: MetadataGenerator,
    progress_tx: broadcast::Sender<MetadataProgress>,
}

impl MetadataBatch {
    /// Create a new batch runner.
    pub fn new(config: MetadataConfig, generator: MetadataGenerator) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            generator,
            progress_tx,
        }
    }

    /// Subscribe to batch progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<MetadataProgress> {
        self.progress_tx.subscribe()
    }

    /// Attach metadata to every file.
    pub fn run(&self, files: Vec<InputFile>) -> Result<BatchReport, BatchError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| BatchError::ThreadPool {
                message: e.to_string(),
            })?;

        let state = RunState {
            registry: FileRegistry::new(),
            stop: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            total: files.len() as u64,
            start: Instant::now(),
        };

        let outcomes: Vec<Outcome> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| self.process(file, &state))
                .collect()
        });

        let processed = state.processed.load(Ordering::Acquire) as usize;
        let mut report = BatchReport::new(state.registry);
        let mut fatal = None;

        for outcome in outcomes {
            match outcome {
                Outcome::Published(status) => report.record(status),
                Outcome::Skipped(err) => report.skipped.push(err),
                Outcome::BaselineFailed(err) => report.baseline_failures.push(err),
                Outcome::Duplicate(key) => report.duplicates.push(key),
                Outcome::Fatal(err) => {
                    fatal.get_or_insert(err);
                }
                Outcome::Cancelled => {}
            }
        }

        if let Some(source) = fatal {
            return Err(BatchError::Aborted { processed, source });
        }

        report.elapsed = state.start.elapsed();
        info!(
            published = report.published(),
            skipped = report.skipped.len(),
            baseline_failures = report.baseline_failures.len(),
            duplicates = report.duplicates.len(),
            added = report.added,
            changed = report.changed,
            same = report.same,
            "metadata batch finished in {:.2}s",
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    /// Process one file.
    fn process(&self, mut file: InputFile, state: &RunState) -> Outcome {
        if state.stop.load(Ordering::Acquire) {
            return Outcome::Cancelled;
        }

        let current_path = PathBuf::from(file.relative_path());
        let result = self
            .generator
            .generate(&file, self.config.default_encoding);

        let outcome = match result {
            Ok(attributes) => {
                let status = attributes.status;
                let key = file.key();
                file.publish(attributes);
                if state.registry.publish(file) {
                    Outcome::Published(status)
                } else {
                    warn!("'{key}' given more than once, keeping the first");
                    Outcome::Duplicate(key)
                }
            }
            Err(MetadataError::Unreadable(err)) if !self.config.abort_on_unreadable => {
                warn!("{err}: {}", err.source);
                state.failures.fetch_add(1, Ordering::Relaxed);
                Outcome::Skipped(err)
            }
            Err(MetadataError::Baseline(err)) if !self.config.abort_on_baseline_error => {
                warn!("{err}");
                state.failures.fetch_add(1, Ordering::Relaxed);
                Outcome::BaselineFailed(err)
            }
            Err(err) => {
                state.failures.fetch_add(1, Ordering::Relaxed);
                state.stop.store(true, Ordering::Release);
                Outcome::Fatal(err)
            }
        };

        let done = state.processed.fetch_add(1, Ordering::AcqRel) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == state.total {
            let _ = self.progress_tx.send(MetadataProgress {
                files_processed: done,
                total_files: state.total,
                failures: state.failures.load(Ordering::Relaxed),
                current_path,
                elapsed: state.start.elapsed(),
            });
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use std::sync::Arc;

    use srcmeta_core::{ContentHash, Encoding};
    use tempfile::TempDir;

    use crate::status::{BaselineStore, StatusDetector};

    fn batch(config: MetadataConfig) -> MetadataBatch {
        MetadataBatch::new(config, MetadataGenerator::new(StatusDetector::empty()))
    }

    #[test]
    fn test_run_publishes_all_files() {
        let temp = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..10 {
            let name = format!("f{i}.txt");
            fs::write(temp.path().join(&name), format!("line {i}\n")).unwrap();
            files.push(InputFile::new("m", temp.path(), name));
        }

        let config = MetadataConfig::builder()
            .module_key("m")
            .threads(2usize)
            .build()
            .unwrap();
        let report = batch(config).run(files).unwrap();

        assert_eq!(report.published(), 10);
        assert_eq!(report.added, 10);
        assert!(!report.has_skipped());
        assert_eq!(report.registry.get("m:f3.txt").unwrap().lines(), Some(1));
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ok.txt"), "ok").unwrap();
        let files = vec![
            InputFile::new("m", temp.path(), "ok.txt"),
            InputFile::new("m", temp.path(), "gone.txt"),
        ];

        let report = batch(MetadataConfig::new("m")).run(files).unwrap();

        assert_eq!(report.published(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("gone.txt"));
        assert!(!report.registry.contains("m:gone.txt"));
    }

    #[test]
    fn test_unreadable_file_aborts_when_configured() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.txt"), [b'a', 0xFF]).unwrap();
        let files = vec![InputFile::new("m", temp.path(), "bad.txt")];

        let config = MetadataConfig::builder()
            .module_key("m")
            .default_encoding(Encoding::Utf8)
            .abort_on_unreadable(true)
            .build()
            .unwrap();
        let err = batch(config).run(files).unwrap_err();

        match err {
            BatchError::Aborted { processed, source } => {
                assert_eq!(processed, 1);
                assert!(source.is_unreadable());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_same_key_counted_once() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        let files = vec![
            InputFile::new("m", temp.path(), "a.txt"),
            InputFile::new("m", temp.path(), "a.txt"),
        ];

        let report = batch(MetadataConfig::new("m")).run(files).unwrap();

        assert_eq!(report.published(), 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, vec!["m:a.txt".to_string()]);
        assert!(report.has_skipped());
    }

    struct OfflineBaseline;

    impl BaselineStore for OfflineBaseline {
        fn previous_hash(
            &self,
            project_key: &str,
            relative_path: &str,
        ) -> Result<Option<ContentHash>, BaselineLookupError> {
            if relative_path == "lost.txt" {
                Err(BaselineLookupError::new(project_key, relative_path, "offline"))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn test_baseline_failure_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ok.txt"), "ok").unwrap();
        fs::write(temp.path().join("lost.txt"), "lost").unwrap();
        let files = vec![
            InputFile::new("m", temp.path(), "ok.txt"),
            InputFile::new("m", temp.path(), "lost.txt"),
        ];

        let generator = MetadataGenerator::new(StatusDetector::new(Arc::new(OfflineBaseline)));
        let report = MetadataBatch::new(MetadataConfig::new("m"), generator)
            .run(files)
            .unwrap();

        assert_eq!(report.published(), 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.baseline_failures.len(), 1);
        assert_eq!(report.baseline_failures[0].relative_path, "lost.txt");
        assert!(!report.registry.contains("m:lost.txt"));
    }

    #[test]
    fn test_progress_reports_completion() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let runner = batch(MetadataConfig::new("m"));
        let mut rx = runner.subscribe();
        runner
            .run(vec![InputFile::new("m", temp.path(), "a.txt")])
            .unwrap();

        let progress = rx.try_recv().unwrap();
        assert!(progress.is_complete());
        assert_eq!(progress.total_files, 1);
    }
}
