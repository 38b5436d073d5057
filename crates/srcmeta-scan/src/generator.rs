//! Attaches metadata and status to input files.

use tracing::debug;

use srcmeta_core::{
    Encoding, FileAttributes, InputFile, InputFileType, MetadataError, UnreadableFileError,
};

use crate::reader;
use crate::status::StatusDetector;

/// Computes encoding, metadata and status for one file at a time.
///
/// Cheap to clone and safe to share between worker threads.
#[derive(Debug, Clone)]
pub struct MetadataGenerator {
    status: StatusDetector,
}

impl MetadataGenerator {
    /// Create a generator that classifies files with `status`.
    pub fn new(status: StatusDetector) -> Self {
        Self { status }
    }

    /// Compute and publish the attributes of `file`.
    ///
    /// On error the descriptor is left exactly as it was.
    pub fn attach_metadata(
        &self,
        file: &mut InputFile,
        default_encoding: Encoding,
    ) -> Result<(), MetadataError> {
        let attributes = self.generate(file, default_encoding)?;
        file.publish(attributes);
        Ok(())
    }

    /// Compute the attributes of `file` without touching it.
    pub fn generate(
        &self,
        file: &InputFile,
        default_encoding: Encoding,
    ) -> Result<FileAttributes, MetadataError> {
        let path = file.absolute_path();
        let (detection, metadata) = reader::read_metadata(&path, default_encoding)
            .map_err(|source| UnreadableFileError::new(path, source))?;

        let status =
            self.status
                .status(file.module_key(), file.relative_path(), &metadata.hash)?;

        debug!(
            "'{}' generated metadata{} with encoding '{}'",
            file.relative_path(),
            if file.file_type() == InputFileType::Test {
                " as test"
            } else {
                ""
            },
            detection.encoding
        );

        Ok(FileAttributes::new(detection.encoding, metadata, status))
    }
}
