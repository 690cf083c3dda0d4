//! User configuration for Featurize.
//!
//! The configuration is a plain struct loaded once at process start and
//! passed by reference to the store factory and the generator. Keys exposed
//! to `featurize config` are listed explicitly in [`CONFIG_KEYS`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{FeaturizeError, Result};

/// Which feature store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Empty in-memory store; useful for tests and dry runs.
    Memory,
    /// On-disk checkout of a feature repository.
    #[default]
    Directory,
    /// Remote feature registry over HTTP.
    Registry,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Directory => write!(f, "directory"),
            Self::Registry => write!(f, "registry"),
        }
    }
}

impl FromStr for StorageType {
    type Err = FeaturizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(Self::Memory),
            "directory" => Ok(Self::Directory),
            "registry" => Ok(Self::Registry),
            other => Err(FeaturizeError::Config {
                message: format!(
                    "unknown storage type: {other} (expected memory, directory or registry)"
                ),
            }),
        }
    }
}

/// Settings for the directory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Root of the feature repository checkout.
    pub path: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: constants::config_dir().join("features-repo"),
        }
    }
}

/// Settings for the registry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry, without the `/api` suffix.
    pub url: String,
    /// Bearer token forwarded with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_REGISTRY_URL.to_string(),
            token: None,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizeConfig {
    /// Base image for new projects.
    pub base: String,
    /// Command of the closing `CMD` directive.
    pub entrypoint: String,
    /// Store backend to use.
    pub storage_type: StorageType,
    /// Deadline for all store access in one invocation, in seconds (0 disables).
    pub timeout_secs: u64,
    /// Directory store settings.
    pub directory: DirectoryConfig,
    /// Registry store settings.
    pub registry: RegistryConfig,
}

impl Default for FeaturizeConfig {
    fn default() -> Self {
        Self {
            base: constants::DEFAULT_BASE_IMAGE.to_string(),
            entrypoint: constants::DEFAULT_ENTRYPOINT.to_string(),
            storage_type: StorageType::default(),
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
            directory: DirectoryConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

impl FeaturizeConfig {
    /// Loads the configuration from `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| FeaturizeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FeaturizeError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|e| FeaturizeError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Looks up a key in [`CONFIG_KEYS`].
    ///
    /// # Errors
    ///
    /// Returns `Config` if the key is unknown.
    pub fn key(key: &str) -> Result<&'static ConfigKey> {
        CONFIG_KEYS
            .iter()
            .find(|k| k.key == key)
            .ok_or_else(|| FeaturizeError::Config {
                message: format!("unknown configuration key: {key}"),
            })
    }

    /// Returns the string form of a configuration value.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the key is unknown.
    pub fn get(&self, key: &str) -> Result<String> {
        Ok((Self::key(key)?.get)(self))
    }

    /// Parses and assigns a configuration value.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the key is unknown or the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (Self::key(key)?.set)(self, value)
    }
}

/// One user-visible configuration entry.
pub struct ConfigKey {
    /// Dotted key as typed on the command line.
    pub key: &'static str,
    /// One-line description for `featurize config help`.
    pub help: &'static str,
    /// Reads the value as a string.
    pub get: fn(&FeaturizeConfig) -> String,
    /// Parses and stores a new value.
    pub set: fn(&mut FeaturizeConfig, &str) -> Result<()>,
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey").field("key", &self.key).finish()
    }
}

/// Every key understood by `featurize config get|set|list|help`.
pub static CONFIG_KEYS: &[ConfigKey] = &[
    ConfigKey {
        key: "base",
        help: "Base image used when a project does not name one",
        get: |c| c.base.clone(),
        set: |c, v| {
            non_empty("base", v)?;
            c.base = v.to_string();
            Ok(())
        },
    },
    ConfigKey {
        key: "entrypoint",
        help: "Command of the closing CMD directive in generated Dockerfiles",
        get: |c| c.entrypoint.clone(),
        set: |c, v| {
            non_empty("entrypoint", v)?;
            c.entrypoint = v.to_string();
            Ok(())
        },
    },
    ConfigKey {
        key: "storage_type",
        help: "Feature store backend: directory or registry (memory opens an empty store, for dry runs)",
        get: |c| c.storage_type.to_string(),
        set: |c, v| {
            c.storage_type = v.parse()?;
            Ok(())
        },
    },
    ConfigKey {
        key: "timeout_secs",
        help: "Deadline for store access per invocation, in seconds (0 disables)",
        get: |c| c.timeout_secs.to_string(),
        set: |c, v| {
            c.timeout_secs = v.parse().map_err(|_| FeaturizeError::Config {
                message: format!("timeout_secs must be a non-negative integer, got {v}"),
            })?;
            Ok(())
        },
    },
    ConfigKey {
        key: "directory.path",
        help: "Root of the feature repository checkout for the directory store",
        get: |c| c.directory.path.display().to_string(),
        set: |c, v| {
            non_empty("directory.path", v)?;
            c.directory.path = PathBuf::from(v);
            Ok(())
        },
    },
    ConfigKey {
        key: "registry.url",
        help: "Base URL of the feature registry",
        get: |c| c.registry.url.clone(),
        set: |c, v| {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(FeaturizeError::Config {
                    message: format!("registry.url must be an http(s) URL, got {v}"),
                });
            }
            c.registry.url = v.trim_end_matches('/').to_string();
            Ok(())
        },
    },
    ConfigKey {
        key: "registry.token",
        help: "Bearer token sent to the registry (empty to unset)",
        get: |c| c.registry.token.clone().unwrap_or_default(),
        set: |c, v| {
            c.registry.token = (!v.is_empty()).then(|| v.to_string());
            Ok(())
        },
    },
];

fn non_empty(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FeaturizeError::Config {
            message: format!("{key} must not be empty"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = FeaturizeConfig::default();
        assert_eq!(config.base, constants::DEFAULT_BASE_IMAGE);
        assert_eq!(config.entrypoint, "/bin/bash");
        assert_eq!(config.storage_type, StorageType::Directory);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = FeaturizeConfig::load(&dir.path().join("nope.yaml")).expect("load");
        assert_eq!(config, FeaturizeConfig::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = FeaturizeConfig::default();
        config.set("base", "debian:bookworm").expect("set base");
        config.set("storage_type", "registry").expect("set storage");
        config
            .set("registry.url", "https://features.example.com/")
            .expect("set url");
        config.save(&path).expect("save");

        let loaded = FeaturizeConfig::load(&path).expect("load");
        assert_eq!(loaded.base, "debian:bookworm");
        assert_eq!(loaded.storage_type, StorageType::Registry);
        assert_eq!(loaded.registry.url, "https://features.example.com");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "base: alpine:3.19\n").expect("write");
        let config = FeaturizeConfig::load(&path).expect("load");
        assert_eq!(config.base, "alpine:3.19");
        assert_eq!(config.timeout_secs, constants::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn every_key_reads_back_what_was_set() {
        let mut config = FeaturizeConfig::default();
        let samples = [
            ("base", "fedora:40"),
            ("entrypoint", "/bin/sh"),
            ("storage_type", "memory"),
            ("timeout_secs", "5"),
            ("directory.path", "/srv/features"),
            ("registry.url", "http://registry:8080"),
            ("registry.token", "s3cret"),
        ];
        assert_eq!(samples.len(), CONFIG_KEYS.len());
        for (key, value) in samples {
            config.set(key, value).expect(key);
            assert_eq!(config.get(key).expect(key), value);
        }
    }

    #[test]
    fn storage_type_help_warns_that_memory_is_empty() {
        let entry = CONFIG_KEYS
            .iter()
            .find(|k| k.key == "storage_type")
            .expect("storage_type key");
        assert!(entry.help.contains("memory opens an empty store"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = FeaturizeConfig::default();
        assert!(config.get("git.url").is_err());
        assert!(config.set("git.url", "x").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = FeaturizeConfig::default();
        assert!(config.set("storage_type", "postgres").is_err());
        assert!(config.set("timeout_secs", "-1").is_err());
        assert!(config.set("registry.url", "ftp://x").is_err());
        assert!(config.set("base", "  ").is_err());
    }

    #[test]
    fn every_key_has_help() {
        assert!(CONFIG_KEYS.iter().all(|k| !k.help.is_empty()));
    }
}
