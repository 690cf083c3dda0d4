//! The `Featurizefile` project file and feature list editing.
//!
//! A project records its base image and the features requested by the
//! user; the resolved dependencies are not stored.

use std::path::Path;

use featurize_common::error::{FeaturizeError, Result};
use serde::{Deserialize, Serialize};

/// Contents of a `Featurizefile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Base image of the generated Dockerfile.
    pub base: String,
    /// Requested feature names, in request order.
    #[serde(default)]
    pub features: Vec<String>,
}

impl FeatureSet {
    /// Creates a feature set.
    #[must_use]
    pub fn new(base: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            base: base.into(),
            features,
        }
    }

    /// Parses a feature set from YAML.
    ///
    /// # Errors
    ///
    /// Returns `Yaml` on malformed input and `Config` if `base` is empty.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let set: Self = serde_yaml::from_str(content)?;
        if set.base.trim().is_empty() {
            return Err(FeaturizeError::Config {
                message: "Featurizefile does not name a base image".into(),
            });
        }
        Ok(set)
    }

    /// Serializes the feature set to YAML.
    ///
    /// # Errors
    ///
    /// Returns `Yaml` if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reads a feature set from `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, or the errors of
    /// [`FeatureSet::from_yaml`].
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FeaturizeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Reads a feature set from `path` if the file exists.
    ///
    /// # Errors
    ///
    /// See [`FeatureSet::read`].
    pub fn read_optional(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::read(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Writes the feature set to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| FeaturizeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), features = self.features.len(), "wrote feature set");
        Ok(())
    }
}

/// Splits a comma- or whitespace-separated feature list.
///
/// Empty entries are dropped and duplicates keep their first position.
#[must_use]
pub fn parse_feature_list(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
    {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Computes a project's new feature list.
///
/// `init` replaces the list, `add` appends the names not already present,
/// and with neither the list is kept.
///
/// # Errors
///
/// Returns `Config` if both `init` and `add` are given.
pub fn merge_feature_lists(
    existing: &[String],
    init: &[String],
    add: &[String],
) -> Result<Vec<String>> {
    match (init.is_empty(), add.is_empty()) {
        (false, false) => Err(FeaturizeError::Config {
            message: "--init and --add cannot be used together".into(),
        }),
        (false, true) => Ok(init.to_vec()),
        (true, false) => {
            let mut merged = existing.to_vec();
            for name in add {
                if !merged.contains(name) {
                    merged.push(name.clone());
                }
            }
            Ok(merged)
        }
        (true, true) => Ok(existing.to_vec()),
    }
}

/// Removes `names` from a feature list, keeping the order of the rest.
#[must_use]
pub fn remove_features(existing: &[String], names: &[String]) -> Vec<String> {
    existing
        .iter()
        .filter(|n| !names.contains(n))
        .cloned()
        .collect()
}
