//! Unified error types for the Featurize workspace.
//!
//! Each higher-level crate may define its own domain-specific error enum
//! (for example the snippet parser's) and map it into [`FeaturizeError`]
//! once the feature in play is known.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum FeaturizeError {
    /// A requested feature, or one of its transitive dependencies, is absent
    /// from the store.
    #[error("feature not found: {name}{}", required_by_suffix(.required_by.as_deref()))]
    FeatureNotFound {
        /// Name of the missing feature.
        name: String,
        /// Feature whose dependency list referenced the missing one.
        required_by: Option<String>,
    },

    /// The backing store could not be reached or returned garbage.
    #[error("{store} store unavailable{}: {message}", feature_suffix(.feature.as_deref()))]
    StoreUnavailable {
        /// Kind of store (`memory`, `directory`, `registry`).
        store: &'static str,
        /// Feature being fetched when the failure happened, if known.
        feature: Option<String>,
        /// Backend-specific failure description.
        message: String,
    },

    /// A COPY instruction does not carry both a source and a destination.
    #[error("malformed COPY instruction in feature {feature} at line {line}: {instruction}")]
    MalformedCopyInstruction {
        /// Feature owning the snippet.
        feature: String,
        /// 1-based line in the snippet.
        line: usize,
        /// The offending instruction text.
        instruction: String,
    },

    /// A feature's build snippet could not be parsed.
    #[error("cannot parse snippet of feature {feature} at line {line}: {message}")]
    SnippetParse {
        /// Feature owning the snippet.
        feature: String,
        /// 1-based line in the snippet.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// The operation was cancelled or its deadline elapsed.
    #[error("cancelled{}: {reason}", feature_suffix(.feature.as_deref()))]
    Cancelled {
        /// Feature being fetched when cancellation was observed, if any.
        feature: Option<String>,
        /// Why the operation stopped.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value or argument is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML serialization or deserialization failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

fn required_by_suffix(parent: Option<&str>) -> String {
    parent.map_or_else(String::new, |p| format!(" (required by {p})"))
}

fn feature_suffix(feature: Option<&str>) -> String {
    feature.map_or_else(String::new, |f| format!(" while fetching {f}"))
}

impl FeaturizeError {
    /// Builds a `FeatureNotFound` error for a top-level name.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::FeatureNotFound {
            name: name.into(),
            required_by: None,
        }
    }

    /// Builds a `StoreUnavailable` error without feature context.
    #[must_use]
    pub fn unavailable(store: &'static str, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store,
            feature: None,
            message: message.into(),
        }
    }

    /// Annotates store-originated errors with the feature being resolved.
    ///
    /// Context that is already present is kept; other variants pass through.
    #[must_use]
    pub fn for_feature(self, name: &str) -> Self {
        match self {
            Self::StoreUnavailable {
                store,
                feature: None,
                message,
            } => Self::StoreUnavailable {
                store,
                feature: Some(name.to_string()),
                message,
            },
            Self::Cancelled {
                feature: None,
                reason,
            } => Self::Cancelled {
                feature: Some(name.to_string()),
                reason,
            },
            other => other,
        }
    }

    /// Records which feature depended on a missing one.
    #[must_use]
    pub fn required_by(self, parent: &str) -> Self {
        match self {
            Self::FeatureNotFound {
                name,
                required_by: None,
            } => Self::FeatureNotFound {
                name,
                required_by: Some(parent.to_string()),
            },
            other => other,
        }
    }

    /// Returns `true` for the `FeatureNotFound` variant.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FeatureNotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, FeaturizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_feature() {
        let err = FeaturizeError::not_found("python");
        assert_eq!(err.to_string(), "feature not found: python");
    }

    #[test]
    fn required_by_is_rendered() {
        let err = FeaturizeError::not_found("jdk").required_by("maven");
        assert_eq!(err.to_string(), "feature not found: jdk (required by maven)");
    }

    #[test]
    fn required_by_keeps_first_parent() {
        let err = FeaturizeError::not_found("jdk")
            .required_by("maven")
            .required_by("gradle");
        assert!(err.to_string().contains("maven"));
        assert!(!err.to_string().contains("gradle"));
    }

    #[test]
    fn for_feature_annotates_unavailable_store() {
        let err = FeaturizeError::unavailable("registry", "connection refused").for_feature("node");
        assert_eq!(
            err.to_string(),
            "registry store unavailable while fetching node: connection refused"
        );
    }

    #[test]
    fn for_feature_leaves_other_variants_alone() {
        let err = FeaturizeError::not_found("x").for_feature("y");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "feature not found: x");
    }
}
