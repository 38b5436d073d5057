//! Metadata engine configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;

/// Configuration for discovering files and attaching metadata.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MetadataConfig {
    /// Key of the module (project) the files belong to.
    pub module_key: String,

    /// Encoding used when a file has no byte-order mark.
    #[builder(default)]
    #[serde(default)]
    pub default_encoding: Encoding,

    /// Number of worker threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Stop the whole run on the first unreadable file instead of skipping it.
    #[builder(default = "false")]
    #[serde(default)]
    pub abort_on_unreadable: bool,

    /// Stop the whole run on the first failed baseline lookup instead of
    /// skipping the file.
    #[builder(default = "false")]
    #[serde(default)]
    pub abort_on_baseline_error: bool,

    /// Glob patterns (relative paths) of files to leave out.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Glob patterns (relative paths) of test sources.
    #[builder(default = "default_test_patterns()")]
    #[serde(default = "default_test_patterns")]
    pub test_patterns: Vec<String>,

    /// Include hidden files (starting with .).
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,
}

fn default_test_patterns() -> Vec<String> {
    ["**/src/test/**", "**/tests/**", "**/*_test.*", "**/*Test.java"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl MetadataConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.module_key {
            Some(ref key) if key.is_empty() => Err("Module key cannot be empty".to_string()),
            Some(ref key) if key.contains(':') => {
                Err(format!("Module key cannot contain ':' ({key})"))
            }
            Some(_) => Ok(()),
            None => Err("Module key is required".to_string()),
        }
    }
}

impl MetadataConfig {
    /// Create a new config builder.
    pub fn builder() -> MetadataConfigBuilder {
        MetadataConfigBuilder::default()
    }

    /// Create a simple config for a module.
    pub fn new(module_key: impl Into<String>) -> Self {
        Self {
            module_key: module_key.into(),
            default_encoding: Encoding::default(),
            threads: 0,
            abort_on_unreadable: false,
            abort_on_baseline_error: false,
            ignore_patterns: Vec::new(),
            test_patterns: default_test_patterns(),
            include_hidden: false,
        }
    }
}
