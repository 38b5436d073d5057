//! Error types for metadata computation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::Encoding;

/// Failure while reading or decoding one file.
#[derive(Debug, Error)]
pub enum ReadError {
    /// File does not exist.
    #[error("File not found")]
    NotFound,

    /// Permission denied.
    #[error("Permission denied")]
    PermissionDenied,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Bytes are not valid under the resolved encoding.
    #[error("Malformed {encoding} input at byte {offset}")]
    Decode { encoding: Encoding, offset: usize },
}

impl ReadError {
    /// Classify an I/O error.
    pub fn io(source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(source),
        }
    }
}

/// A file could not be read; carries the absolute path.
#[derive(Debug, Error)]
#[error("Unable to read file {}", path.display())]
pub struct UnreadableFileError {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// What went wrong.
    #[source]
    pub source: ReadError,
}

impl UnreadableFileError {
    /// Wrap a read failure with the file's path.
    pub fn new(path: impl Into<PathBuf>, source: ReadError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// The baseline store could not answer a status query.
///
/// Distinct from "no previous record", which is not an error.
#[derive(Debug, Error)]
#[error("Baseline lookup failed for {project_key}:{relative_path}: {message}")]
pub struct BaselineLookupError {
    /// Project scope of the lookup.
    pub project_key: String,
    /// Path that was looked up.
    pub relative_path: String,
    /// Store specific reason.
    pub message: String,
}

impl BaselineLookupError {
    /// Create a new lookup error.
    pub fn new(
        project_key: impl Into<String>,
        relative_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            project_key: project_key.into(),
            relative_path: relative_path.into(),
            message: message.into(),
        }
    }
}

/// Errors from attaching metadata to one file.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The file could not be read or decoded.
    #[error(transparent)]
    Unreadable(#[from] UnreadableFileError),

    /// The baseline could not be consulted.
    #[error(transparent)]
    Baseline(#[from] BaselineLookupError),
}

impl MetadataError {
    /// Check if this is an unreadable file error.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, MetadataError::Unreadable(_))
    }
}

/// Errors that end a whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A fatal per-file error stopped the run.
    #[error("Metadata batch aborted after {processed} file(s)")]
    Aborted {
        /// Files that finished before the run stopped.
        processed: usize,
        #[source]
        source: MetadataError,
    },

    /// Worker pool could not be created.
    #[error("Failed to build worker pool: {message}")]
    ThreadPool { message: String },
}

/// Errors that can occur while discovering input files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Base directory is not a directory.
    #[error("Base directory is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A glob pattern could not be compiled.
    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl DiscoveryError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Non-fatal problem met while walking the base directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
}

impl DiscoveryWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}
