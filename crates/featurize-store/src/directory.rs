//! Feature store backed by a checkout of a feature repository.
//!
//! Layout under the root directory:
//!
//! ```text
//! features/
//!   <name>/
//!     meta.yml     description, author, dependencies
//!     Dockerfile   build snippet (optional)
//!     test.bats    test snippet (optional)
//! ```
//!
//! `updated_at` is the modification time of `meta.yml`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use featurize_common::cancel::CancelToken;
use featurize_common::constants::{
    FEATURE_META_FILE, FEATURE_SNIPPET_FILE, FEATURE_TEST_FILE, FEATURES_DIR,
    TEST_MANIFEST_HEADER,
};
use featurize_common::error::{FeaturizeError, Result};
use featurize_common::types::{Feature, FeatureMeta};
use regex::Regex;
use serde::Deserialize;

use crate::FeatureStore;

const KIND: &str = "directory";

/// On-disk shape of `meta.yml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetaFile {
    description: String,
    author: String,
    dependencies: Vec<String>,
}

/// Feature store reading a local repository checkout.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Opens the store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if `root/features` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let features_dir = root.join(FEATURES_DIR);
        if !features_dir.is_dir() {
            return Err(FeaturizeError::unavailable(
                KIND,
                format!("{} is not a directory", features_dir.display()),
            ));
        }
        tracing::info!(path = %root.display(), "opened directory store");
        Ok(Self { root })
    }

    /// Returns the root of the checkout.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory of one feature, rejecting names that would
    /// escape the features directory.
    fn feature_dir(&self, name: &str) -> Option<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        valid.then(|| self.root.join(FEATURES_DIR).join(name))
    }

    fn read_meta(&self, name: &str) -> Result<FeatureMeta> {
        let dir = self
            .feature_dir(name)
            .ok_or_else(|| FeaturizeError::not_found(name))?;
        let path = dir.join(FEATURE_META_FILE);
        if !path.is_file() {
            return Err(FeaturizeError::not_found(name));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| io_unavailable(&path, &e))?;
        let parsed: MetaFile = if content.trim().is_empty() {
            MetaFile::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                FeaturizeError::unavailable(KIND, format!("invalid {}: {e}", path.display()))
            })?
        };

        let updated_at = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Ok(FeatureMeta {
            name: name.to_string(),
            description: parsed.description,
            author: parsed.author,
            updated_at,
            dependencies: parsed.dependencies,
        })
    }

    fn feature_names(&self) -> Result<Vec<String>> {
        let dir = self.root.join(FEATURES_DIR);
        let entries = std::fs::read_dir(&dir).map_err(|e| io_unavailable(&dir, &e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_unavailable(&dir, &e))?;
            if entry.path().join(FEATURE_META_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn io_unavailable(path: &Path, err: &std::io::Error) -> FeaturizeError {
    FeaturizeError::unavailable(KIND, format!("cannot read {}: {err}", path.display()))
}

/// Reads an optional file, treating absence as empty content.
fn read_optional(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(io_unavailable(path, &e)),
    }
}

/// Normalizes a stored bats file into a bare test snippet.
///
/// Trailing whitespace is trimmed from every line, the bats shebang is
/// dropped so it is emitted only once in the generated manifest, and the
/// result is trimmed.
#[must_use]
pub fn read_test_snippet(content: &str) -> String {
    let mut buffer = String::with_capacity(content.len());
    for line in content.lines().map(str::trim_end) {
        if line.trim_start() == TEST_MANIFEST_HEADER {
            continue;
        }
        buffer.push_str(line);
        buffer.push('\n');
    }
    buffer.trim().to_string()
}

impl FeatureStore for DirectoryStore {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn search_meta(&self, pattern: &Regex, cancel: &CancelToken) -> Result<Vec<FeatureMeta>> {
        cancel.check()?;
        let mut metas = Vec::new();
        for name in self.feature_names()? {
            if pattern.is_match(&name) {
                cancel.check()?;
                metas.push(self.read_meta(&name)?);
            }
        }
        tracing::debug!(pattern = %pattern, matches = metas.len(), "searched directory store");
        Ok(metas)
    }

    fn get_meta(&self, name: &str, cancel: &CancelToken) -> Result<FeatureMeta> {
        cancel.check()?;
        self.read_meta(name)
    }

    fn get_feature(&self, name: &str, cancel: &CancelToken) -> Result<Feature> {
        cancel.check()?;
        let meta = self.read_meta(name)?;
        let dir = self
            .feature_dir(name)
            .ok_or_else(|| FeaturizeError::not_found(name))?;
        let snippet = read_optional(&dir.join(FEATURE_SNIPPET_FILE))?;
        let test_snippet = read_test_snippet(&read_optional(&dir.join(FEATURE_TEST_FILE))?);
        tracing::debug!(feature = name, "loaded feature from directory store");
        Ok(Feature {
            meta,
            snippet,
            test_snippet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_feature(root: &Path, name: &str, meta: &str, snippet: Option<&str>, test: Option<&str>) {
        let dir = root.join(FEATURES_DIR).join(name);
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join(FEATURE_META_FILE), meta).expect("write meta");
        if let Some(s) = snippet {
            std::fs::write(dir.join(FEATURE_SNIPPET_FILE), s).expect("write snippet");
        }
        if let Some(t) = test {
            std::fs::write(dir.join(FEATURE_TEST_FILE), t).expect("write test");
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        write_feature(
            dir.path(),
            "java",
            "description: OpenJDK\nauthor: alice\n",
            Some("RUN apt-get install -y openjdk-17-jdk\n"),
            Some("#!/usr/bin/env bats\n\n@test \"java\" {\n  java -version\n}\n"),
        );
        write_feature(
            dir.path(),
            "maven",
            "description: Maven\nauthor: bob\ndependencies:\n  - java\n",
            Some("RUN apt-get install -y maven\n"),
            None,
        );
        write_feature(dir.path(), "empty", "", None, None);
        dir
    }

    #[test]
    fn open_requires_features_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DirectoryStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, FeaturizeError::StoreUnavailable { .. }));
    }

    #[test]
    fn get_meta_reads_yaml() {
        let dir = fixture();
        let store = DirectoryStore::open(dir.path()).expect("open");
        let meta = store.get_meta("maven", &CancelToken::new()).expect("meta");
        assert_eq!(meta.name, "maven");
        assert_eq!(meta.author, "bob");
        assert_eq!(meta.dependencies, vec!["java"]);
        assert!(meta.updated_at.is_some());
    }

    #[test]
    fn get_feature_reads_snippets_and_strips_shebang() {
        let dir = fixture();
        let store = DirectoryStore::open(dir.path()).expect("open");
        let feature = store.get_feature("java", &CancelToken::new()).expect("feature");
        assert!(feature.snippet.contains("openjdk-17-jdk"));
        assert!(!feature.test_snippet.contains("#!/usr/bin/env bats"));
        assert!(feature.test_snippet.starts_with("@test \"java\""));
    }

    #[test]
    fn feature_without_snippet_files_has_empty_snippets() {
        let dir = fixture();
        let store = DirectoryStore::open(dir.path()).expect("open");
        let feature = store.get_feature("empty", &CancelToken::new()).expect("feature");
        assert!(feature.snippet.is_empty());
        assert!(feature.test_snippet.is_empty());
        assert!(feature.meta.dependencies.is_empty());
    }

    #[test]
    fn missing_feature_is_not_found() {
        let dir = fixture();
        let store = DirectoryStore::open(dir.path()).expect("open");
        assert!(store.get_feature("ruby", &CancelToken::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn path_traversal_names_are_not_found() {
        let dir = fixture();
        let store = DirectoryStore::open(dir.path()).expect("open");
        for name in ["..", "../features/java", "java/..", ""] {
            assert!(store.get_meta(name, &CancelToken::new()).unwrap_err().is_not_found());
        }
    }

    #[test]
    fn invalid_yaml_is_store_error() {
        let dir = fixture();
        write_feature(dir.path(), "broken", "dependencies: [unterminated\n", None, None);
        let store = DirectoryStore::open(dir.path()).expect("open");
        let err = store.get_meta("broken", &CancelToken::new()).unwrap_err();
        assert!(matches!(err, FeaturizeError::StoreUnavailable { .. }));
    }

    #[test]
    fn search_lists_matching_features_in_name_order() {
        let dir = fixture();
        std::fs::create_dir_all(dir.path().join(FEATURES_DIR).join("not-a-feature"))
            .expect("mkdir");
        let store = DirectoryStore::open(dir.path()).expect("open");
        let all = store
            .search_meta(&Regex::new(".*").expect("regex"), &CancelToken::new())
            .expect("search");
        let names: Vec<&str> = all.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["empty", "java", "maven"]);

        let some = store
            .search_meta(&Regex::new("^ma").expect("regex"), &CancelToken::new())
            .expect("search");
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].description, "Maven");
    }

    #[test]
    fn read_test_snippet_normalizes_content() {
        let raw = "  #!/usr/bin/env bats  \n\n@test \"x\" {   \n  true\n}\n\n";
        assert_eq!(read_test_snippet(raw), "@test \"x\" {\n  true\n}");
    }

    #[test]
    fn read_test_snippet_of_empty_input_is_empty() {
        assert_eq!(read_test_snippet(""), "");
    }
}
