//! Batch progress reporting.

use std::path::PathBuf;
use std::time::Duration;

/// Progress information during a metadata batch.
#[derive(Debug, Clone)]
pub struct MetadataProgress {
    /// Files finished so far, including failures.
    pub files_processed: u64,
    /// Files in the batch.
    pub total_files: u64,
    /// Files that could not be processed.
    pub failures: u64,
    /// Last file finished.
    pub current_path: PathBuf,
    /// Time elapsed since the batch started.
    pub elapsed: Duration,
}

impl MetadataProgress {
    /// Create initial progress state.
    pub fn new(total_files: u64) -> Self {
        Self {
            files_processed: 0,
            total_files,
            failures: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Fraction of the batch done, between 0 and 1.
    pub fn fraction(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            self.files_processed as f64 / self.total_files as f64
        }
    }

    /// Calculate throughput in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_processed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Check if every file has been processed.
    pub fn is_complete(&self) -> bool {
        self.files_processed >= self.total_files
    }
}
