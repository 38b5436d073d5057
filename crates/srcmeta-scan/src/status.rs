//! Change status against a previous analysis.

use std::collections::HashMap;
use std::sync::Arc;

use compact_str::CompactString;

use srcmeta_core::{BaselineLookupError, ContentHash, FileStatus};

/// Read-only view of the previous analysis.
///
/// Implementations are queried from many worker threads at once.
pub trait BaselineStore: Send + Sync {
    /// Hash recorded for `relative_path` in the previous analysis of
    /// `project_key`, or `None` when the path was not analyzed before.
    fn previous_hash(
        &self,
        project_key: &str,
        relative_path: &str,
    ) -> Result<Option<ContentHash>, BaselineLookupError>;
}

impl<T: BaselineStore + ?Sized> BaselineStore for Arc<T> {
    fn previous_hash(
        &self,
        project_key: &str,
        relative_path: &str,
    ) -> Result<Option<ContentHash>, BaselineLookupError> {
        (**self).previous_hash(project_key, relative_path)
    }
}

/// Baseline held in memory, keyed by project then relative path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBaseline {
    projects: HashMap<CompactString, HashMap<CompactString, ContentHash>>,
}

impl InMemoryBaseline {
    /// Create an empty baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the hash of a path.
    pub fn insert(
        &mut self,
        project_key: impl Into<CompactString>,
        relative_path: impl Into<CompactString>,
        hash: ContentHash,
    ) {
        self.projects
            .entry(project_key.into())
            .or_default()
            .insert(relative_path.into(), hash);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_entry(
        mut self,
        project_key: impl Into<CompactString>,
        relative_path: impl Into<CompactString>,
        hash: ContentHash,
    ) -> Self {
        self.insert(project_key, relative_path, hash);
        self
    }

    /// Total number of recorded paths.
    pub fn len(&self) -> usize {
        self.projects.values().map(HashMap::len).sum()
    }

    /// Check if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BaselineStore for InMemoryBaseline {
    fn previous_hash(
        &self,
        project_key: &str,
        relative_path: &str,
    ) -> Result<Option<ContentHash>, BaselineLookupError> {
        Ok(self
            .projects
            .get(project_key)
            .and_then(|paths| paths.get(relative_path))
            .copied())
    }
}

/// Classifies files as added, changed or unchanged.
#[derive(Clone)]
pub struct StatusDetector {
    baseline: Arc<dyn BaselineStore>,
}

impl StatusDetector {
    /// Create a detector backed by `baseline`.
    pub fn new(baseline: Arc<dyn BaselineStore>) -> Self {
        Self { baseline }
    }

    /// Detector for a first analysis, where every file is new.
    pub fn empty() -> Self {
        Self::new(Arc::new(InMemoryBaseline::new()))
    }

    /// Status of `relative_path` given its freshly computed hash.
    ///
    /// A failed lookup is returned as an error, never as [`FileStatus::Added`].
    pub fn status(
        &self,
        project_key: &str,
        relative_path: &str,
        hash: &ContentHash,
    ) -> Result<FileStatus, BaselineLookupError> {
        let status = match self.baseline.previous_hash(project_key, relative_path)? {
            None => FileStatus::Added,
            Some(previous) if previous == *hash => FileStatus::Same,
            Some(_) => FileStatus::Changed,
        };
        Ok(status)
    }
}

impl std::fmt::Debug for StatusDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusDetector").finish_non_exhaustive()
    }
}
