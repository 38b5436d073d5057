//! Input file descriptors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;
use crate::metadata::FileMetadata;

/// Status of a file relative to the previous analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    /// No previous record for this path.
    Added,
    /// A previous record exists with a different hash.
    Changed,
    /// A previous record exists with the same hash.
    Same,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileStatus::Added => "ADDED",
            FileStatus::Changed => "CHANGED",
            FileStatus::Same => "SAME",
        })
    }
}

/// Whether a file holds production or test code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputFileType {
    /// Production source.
    #[default]
    Main,
    /// Test source.
    Test,
}

/// Everything the metadata engine computes for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Encoding the file was decoded with.
    pub encoding: Encoding,
    /// Line and hash accounting.
    pub metadata: FileMetadata,
    /// Status against the baseline.
    pub status: FileStatus,
}

impl FileAttributes {
    /// Create a new attribute set.
    pub fn new(encoding: Encoding, metadata: FileMetadata, status: FileStatus) -> Self {
        Self {
            encoding,
            metadata,
            status,
        }
    }
}

/// A project file, identified by module and relative path.
///
/// The descriptor starts with identity only. The metadata engine publishes a
/// complete [`FileAttributes`] value in a single step; readers never observe a
/// partially populated descriptor.
#[derive(Debug, Clone)]
pub struct InputFile {
    module_key: CompactString,
    base_dir: PathBuf,
    relative_path: CompactString,
    file_type: InputFileType,
    attributes: Option<Arc<FileAttributes>>,
}

impl InputFile {
    /// Create a descriptor for `relative_path` (with `/` separators) under
    /// the module base directory.
    pub fn new(
        module_key: impl Into<CompactString>,
        base_dir: impl Into<PathBuf>,
        relative_path: impl Into<CompactString>,
    ) -> Self {
        Self {
            module_key: module_key.into(),
            base_dir: base_dir.into(),
            relative_path: relative_path.into(),
            file_type: InputFileType::Main,
            attributes: None,
        }
    }

    /// Set the file type.
    pub fn with_type(mut self, file_type: InputFileType) -> Self {
        self.file_type = file_type;
        self
    }

    /// Key of the owning module (project).
    pub fn module_key(&self) -> &str {
        &self.module_key
    }

    /// Path relative to the module base directory.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Module base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Unique key, `module:relative/path`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.module_key, self.relative_path)
    }

    /// Production or test source.
    pub fn file_type(&self) -> InputFileType {
        self.file_type
    }

    /// Absolute location of the file.
    ///
    /// A relative base directory is resolved against the current directory.
    pub fn absolute_path(&self) -> PathBuf {
        let joined = self.base_dir.join(self.relative_path.as_str());
        std::path::absolute(&joined).unwrap_or(joined)
    }

    /// Publish computed attributes, replacing any earlier ones.
    pub fn publish(&mut self, attributes: FileAttributes) {
        self.attributes = Some(Arc::new(attributes));
    }

    /// Published attributes, if metadata has been attached.
    pub fn attributes(&self) -> Option<&FileAttributes> {
        self.attributes.as_deref()
    }

    /// Check if metadata has been attached.
    pub fn is_published(&self) -> bool {
        self.attributes.is_some()
    }

    /// Line and hash accounting, if attached.
    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.attributes().map(|a| &a.metadata)
    }

    /// Detected encoding, if attached.
    pub fn encoding(&self) -> Option<Encoding> {
        self.attributes().map(|a| a.encoding)
    }

    /// Change status, if attached.
    pub fn status(&self) -> Option<FileStatus> {
        self.attributes().map(|a| a.status)
    }

    /// Number of lines, if attached.
    pub fn lines(&self) -> Option<usize> {
        self.metadata().map(|m| m.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ContentHash;

    #[test]
    fn test_key_and_paths() {
        let file = InputFile::new("struts", "/repo", "src/main/java/foo/Bar.java");
        assert_eq!(file.key(), "struts:src/main/java/foo/Bar.java");
        assert_eq!(
            file.absolute_path(),
            PathBuf::from("/repo/src/main/java/foo/Bar.java")
        );
        assert_eq!(file.file_type(), InputFileType::Main);
    }

    #[test]
    fn test_relative_base_dir_resolves() {
        let file = InputFile::new("m", "fixtures", "a.txt");
        assert!(file.absolute_path().is_absolute());
        assert!(file.absolute_path().ends_with("fixtures/a.txt"));
    }

    #[test]
    fn test_publish() {
        let mut file = InputFile::new("m", "/repo", "a.txt").with_type(InputFileType::Test);
        assert!(!file.is_published());
        assert_eq!(file.lines(), None);

        let metadata = FileMetadata::new(1, ContentHash::new([1; 32]), vec![0], vec![3], 3);
        file.publish(FileAttributes::new(Encoding::Utf8, metadata, FileStatus::Added));

        assert!(file.is_published());
        assert_eq!(file.lines(), Some(1));
        assert_eq!(file.encoding(), Some(Encoding::Utf8));
        assert_eq!(file.status(), Some(FileStatus::Added));
        assert_eq!(file.file_type(), InputFileType::Test);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(FileStatus::Added.to_string(), "ADDED");
        assert_eq!(FileStatus::Changed.to_string(), "CHANGED");
        assert_eq!(FileStatus::Same.to_string(), "SAME");
    }
}
