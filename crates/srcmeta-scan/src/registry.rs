//! Concurrent registry of published input files.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use srcmeta_core::InputFile;

/// Files whose metadata has been attached, keyed by `module:relative/path`.
///
/// Workers insert complete descriptors; every reader that finds an entry sees
/// it fully populated.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: DashMap<String, Arc<InputFile>>,
}

impl FileRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            files: DashMap::new(),
        }
    }

    /// Publish a descriptor.
    ///
    /// Returns `false` and keeps the earlier descriptor if the key is
    /// already present.
    pub fn publish(&self, file: InputFile) -> bool {
        match self.files.entry(file.key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(file));
                true
            }
        }
    }

    /// Look up a descriptor by key.
    pub fn get(&self, key: &str) -> Option<Arc<InputFile>> {
        self.files.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a key has been published.
    pub fn contains(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    /// Get the number of published files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All published files, sorted by key.
    pub fn files(&self) -> Vec<Arc<InputFile>> {
        let mut files: Vec<_> = self
            .files
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        files.sort_by_key(|f| f.key());
        files
    }
}
