//! System-wide constants and default paths.

use std::path::PathBuf;

/// Base image used when neither the project file nor the config names one.
pub const DEFAULT_BASE_IMAGE: &str = "ubuntu:20.04";

/// Command placed in the closing `CMD` directive of generated Dockerfiles.
pub const DEFAULT_ENTRYPOINT: &str = "/bin/bash";

/// Default registry endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8080";

/// Default per-invocation deadline for store access, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Name of the project file recording the base image and selected features.
pub const FEATURIZEFILE_NAME: &str = "Featurizefile";

/// Name of the generated build descriptor.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Name of the generated test manifest.
pub const TEST_MANIFEST_NAME: &str = "test.bats";

/// First line of every generated test manifest.
pub const TEST_MANIFEST_HEADER: &str = "#!/usr/bin/env bats";

/// Comment prefix marking the start of a feature's block in both artifacts.
pub const FEATURE_MARKER_PREFIX: &str = "# feature: ";

/// Directory holding features inside a directory store.
pub const FEATURES_DIR: &str = "features";

/// Per-feature metadata file inside a directory store.
pub const FEATURE_META_FILE: &str = "meta.yml";

/// Per-feature build snippet file inside a directory store.
pub const FEATURE_SNIPPET_FILE: &str = "Dockerfile";

/// Per-feature test snippet file inside a directory store.
pub const FEATURE_TEST_FILE: &str = "test.bats";

/// Directory name under `$HOME` holding user configuration.
pub const CONFIG_DIR_NAME: &str = ".featurize";

/// Configuration file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Application name used in CLI output.
pub const APP_NAME: &str = "featurize";

/// Returns the user configuration directory, `$HOME/.featurize`.
///
/// Falls back to the current directory when no home directory is set.
pub fn config_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
        .join(CONFIG_DIR_NAME)
}

/// Returns the default configuration file path.
pub fn default_config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Renders the marker comment that opens a feature's block.
#[must_use]
pub fn feature_marker(name: &str) -> String {
    format!("{FEATURE_MARKER_PREFIX}{name}")
}

/// Neutralizes lines of user text that would read as feature markers.
///
/// Such lines get one more `#`, which keeps them comments in both a
/// Dockerfile and a bats file. Line endings are preserved.
pub fn escape_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.starts_with(FEATURE_MARKER_PREFIX) {
            out.push('#');
        }
        out.push_str(line);
    }
    out
}

/// Extracts feature names from marker comments, in order of appearance.
///
/// Works on both the generated Dockerfile and the generated test manifest.
pub fn feature_markers(text: &str) -> Vec<&str> {
    text.lines()
        .filter_map(|line| line.strip_prefix(FEATURE_MARKER_PREFIX))
        .map(str::trim_end)
        .collect()
}
