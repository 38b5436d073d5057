//! File metadata and change-status engine for srcmeta.
//!
//! This crate reads every project source file once, resolves its encoding,
//! counts its lines, computes a content hash that does not depend on the
//! source encoding or line endings, and classifies the file against a
//! previous analysis.
//!
//! # Overview
//!
//! - **Encoding detection** from byte-order marks ([`bom`])
//! - **Line accounting and hashing** of the decoded text ([`reader`])
//! - **Status detection** against a read-only [`BaselineStore`]
//! - **Metadata attachment** for one file ([`MetadataGenerator`]) or many
//!   files on a worker pool ([`MetadataBatch`])
//! - **File discovery** via jwalk ([`FileDiscovery`])
//!
//! # Example
//!
//! ```rust,no_run
//! use srcmeta_scan::{
//!     FileDiscovery, MetadataBatch, MetadataConfig, MetadataGenerator, StatusDetector,
//! };
//!
//! let config = MetadataConfig::new("my-project");
//! let discovered = FileDiscovery::new(&config)
//!     .unwrap()
//!     .discover("/path/to/project".as_ref())
//!     .unwrap();
//!
//! let batch = MetadataBatch::new(config, MetadataGenerator::new(StatusDetector::empty()));
//! let report = batch.run(discovered.files).unwrap();
//!
//! for file in report.registry.files() {
//!     println!("{} {:?} {:?}", file.relative_path(), file.status(), file.lines());
//! }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use srcmeta_scan::{MetadataBatch, MetadataConfig, MetadataGenerator, StatusDetector};
//!
//! let batch = MetadataBatch::new(
//!     MetadataConfig::new("my-project"),
//!     MetadataGenerator::new(StatusDetector::empty()),
//! );
//! let mut progress_rx = batch.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("{}/{} files", progress.files_processed, progress.total_files);
//!     }
//! });
//! ```

mod batch;
pub mod bom;
mod discovery;
mod generator;
mod progress;
pub mod reader;
mod registry;
mod status;

pub use batch::{BatchReport, MetadataBatch};
pub use bom::Detection;
pub use discovery::{Discovered, FileDiscovery};
pub use generator::MetadataGenerator;
pub use progress::MetadataProgress;
pub use registry::FileRegistry;
pub use status::{BaselineStore, InMemoryBaseline, StatusDetector};

// Re-export core types for convenience
pub use srcmeta_core::{
    BaselineLookupError, BatchError, ContentHash, DiscoveryError, DiscoveryWarning, Encoding,
    FileAttributes, FileMetadata, FileStatus, InputFile, InputFileType, MetadataConfig,
    MetadataError, ReadError, UnreadableFileError,
};
