//! Feature model shared by stores, the resolver and the renderers.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and graph-relevant data for a feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMeta {
    /// Unique, case-sensitive identifier within a store.
    pub name: String,
    /// Human-readable summary.
    #[serde(default)]
    pub description: String,
    /// Maintainer of the feature.
    #[serde(default)]
    pub author: String,
    /// Last modification time, when the store knows it.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Names of the features this one requires, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl FeatureMeta {
    /// Creates metadata with only a name and dependencies set.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Full feature data needed for composition.
///
/// Two features are equal when their names are equal; the snippets and the
/// rest of the metadata do not take part in identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feature {
    /// Identity and dependency metadata.
    pub meta: FeatureMeta,
    /// Dockerfile instructions contributed by this feature.
    #[serde(default)]
    pub snippet: String,
    /// bats test cases verifying this feature inside the built image.
    #[serde(default)]
    pub test_snippet: String,
}

impl Feature {
    /// Creates a feature from its metadata and snippets.
    #[must_use]
    pub fn new(
        meta: FeatureMeta,
        snippet: impl Into<String>,
        test_snippet: impl Into<String>,
    ) -> Self {
        Self {
            meta,
            snippet: snippet.into(),
            test_snippet: test_snippet.into(),
        }
    }

    /// Returns the feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Returns the declared dependency names.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.meta.dependencies
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.meta.name == other.meta.name
    }
}

impl Eq for Feature {}

impl Hash for Feature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.meta.name.hash(state);
    }
}

/// Outcome of dependency resolution.
///
/// `order` lists every key of `features` exactly once, dependencies before
/// their dependents (best-effort along a cycle).
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Feature names in dependency order.
    pub order: Vec<String>,
    /// Resolved features keyed by name.
    pub features: HashMap<String, Feature>,
}

impl Resolution {
    /// Returns `true` when nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of resolved features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns the resolved features in dependency order.
    ///
    /// Names in `order` missing from `features` are skipped, which can only
    /// happen for a hand-built or store-supplied resolution.
    #[must_use]
    pub fn ordered_features(&self) -> Vec<&Feature> {
        self.order
            .iter()
            .filter_map(|name| self.features.get(name))
            .collect()
    }

    /// Checks that `order` and `features` describe the same set of names.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.order.len());
        self.order.len() == self.features.len()
            && self
                .order
                .iter()
                .all(|name| self.features.contains_key(name) && seen.insert(name.as_str()))
    }
}
