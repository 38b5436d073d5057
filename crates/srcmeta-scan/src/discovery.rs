//! JWalk-based discovery of input files.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use srcmeta_core::{DiscoveryError, DiscoveryWarning, InputFile, InputFileType, MetadataConfig};

/// Files found under a module base directory.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Input files, sorted by relative path.
    pub files: Vec<InputFile>,
    /// Entries that could not be read.
    pub warnings: Vec<DiscoveryWarning>,
}

/// Walks a module base directory and builds input file descriptors.
pub struct FileDiscovery {
    module_key: String,
    threads: usize,
    include_hidden: bool,
    ignore: GlobSet,
    tests: GlobSet,
}

impl FileDiscovery {
    /// Compile the patterns of `config`.
    pub fn new(config: &MetadataConfig) -> Result<Self, DiscoveryError> {
        Ok(Self {
            module_key: config.module_key.clone(),
            threads: config.threads,
            include_hidden: config.include_hidden,
            ignore: build_glob_set(&config.ignore_patterns)?,
            tests: build_glob_set(&config.test_patterns)?,
        })
    }

    /// Discover every regular file under `base_dir`.
    pub fn discover(&self, base_dir: &Path) -> Result<Discovered, DiscoveryError> {
        let root = base_dir
            .canonicalize()
            .map_err(|e| DiscoveryError::io(base_dir, e))?;

        if !root.is_dir() {
            return Err(DiscoveryError::NotADirectory { path: root });
        }

        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root)
            .parallelism(parallelism)
            .skip_hidden(!self.include_hidden)
            .follow_links(false);

        let mut discovered = Discovered::default();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    discovered
                        .warnings
                        .push(DiscoveryWarning::new(path, err.to_string()));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&root) else {
                continue;
            };
            let Some(relative_path) = slash_path(relative) else {
                discovered
                    .warnings
                    .push(DiscoveryWarning::new(&path, "File name is not valid UTF-8"));
                continue;
            };

            if self.ignore.is_match(&relative_path) {
                debug!("'{relative_path}' excluded by ignore patterns");
                continue;
            }

            let file_type = if self.tests.is_match(&relative_path) {
                InputFileType::Test
            } else {
                InputFileType::Main
            };

            discovered.files.push(
                InputFile::new(self.module_key.as_str(), root.as_path(), relative_path)
                    .with_type(file_type),
            );
        }

        discovered
            .files
            .sort_by(|a, b| a.relative_path().cmp(b.relative_path()));

        Ok(discovered)
    }
}

/// `relative` with `/` separators, or `None` if a component is not UTF-8.
fn slash_path(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, DiscoveryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| DiscoveryError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| DiscoveryError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("src/main/java/foo")).unwrap();
        fs::create_dir_all(root.join("src/test/java/foo")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();

        fs::write(root.join("src/main/java/foo/Bar.java"), "class Bar {}").unwrap();
        fs::write(root.join("src/test/java/foo/BarTest.java"), "class BarTest {}").unwrap();
        fs::write(root.join("target/Bar.class"), "binary").unwrap();
        fs::write(root.join(".hidden"), "secret").unwrap();

        temp
    }

    #[test]
    fn test_discover_classifies_tests() {
        let temp = create_test_tree();
        let config = MetadataConfig::builder()
            .module_key("foo")
            .ignore_patterns(vec!["target/**".to_string()])
            .build()
            .unwrap();

        let discovered = FileDiscovery::new(&config)
            .unwrap()
            .discover(temp.path())
            .unwrap();

        let paths: Vec<_> = discovered.files.iter().map(|f| f.relative_path()).collect();
        assert_eq!(
            paths,
            vec!["src/main/java/foo/Bar.java", "src/test/java/foo/BarTest.java"]
        );
        assert_eq!(discovered.files[0].file_type(), InputFileType::Main);
        assert_eq!(discovered.files[1].file_type(), InputFileType::Test);
        assert_eq!(discovered.files[0].module_key(), "foo");
    }

    #[test]
    fn test_include_hidden() {
        let temp = create_test_tree();
        let mut config = MetadataConfig::new("foo");
        config.include_hidden = true;

        let discovered = FileDiscovery::new(&config)
            .unwrap()
            .discover(temp.path())
            .unwrap();

        assert!(discovered.files.iter().any(|f| f.relative_path() == ".hidden"));
        assert!(discovered.files.iter().any(|f| f.relative_path() == "target/Bar.class"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = MetadataConfig::new("foo");
        config.ignore_patterns = vec!["[".to_string()];
        assert!(matches!(
            FileDiscovery::new(&config),
            Err(DiscoveryError::InvalidPattern { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_reported() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ok.rs"), "ok").unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"bad\xff.rs")), "bad").unwrap();

        let discovered = FileDiscovery::new(&MetadataConfig::new("foo"))
            .unwrap()
            .discover(temp.path())
            .unwrap();

        let paths: Vec<_> = discovered.files.iter().map(|f| f.relative_path()).collect();
        assert_eq!(paths, vec!["ok.rs"]);
        assert_eq!(discovered.warnings.len(), 1);
        assert!(discovered.warnings[0].path.ends_with(OsStr::from_bytes(b"bad\xff.rs")));
    }

    #[test]
    fn test_missing_base_dir() {
        let discovery = FileDiscovery::new(&MetadataConfig::new("foo")).unwrap();
        let err = discovery.discover(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound { .. }));
    }
}
