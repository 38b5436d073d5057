//! Core types for srcmeta.
//!
//! This crate provides the data structures shared by the metadata engine:
//! encodings, content hashes, per-file metadata records, input file
//! descriptors, configuration and the error taxonomy.

mod config;
mod encoding;
mod error;
mod input_file;
mod metadata;

pub use config::{MetadataConfig, MetadataConfigBuilder};
pub use encoding::{Encoding, ParseEncodingError};
pub use error::{
    BaselineLookupError, BatchError, DiscoveryError, DiscoveryWarning, MetadataError, ReadError,
    UnreadableFileError,
};
pub use input_file::{FileAttributes, FileStatus, InputFile, InputFileType};
pub use metadata::{ContentHash, FileMetadata};
