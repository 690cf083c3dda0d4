//! In-memory feature store.
//!
//! Holds features in a name-sorted map. Used by tests, by dry runs with
//! `storage_type: memory`, and as the reference backend for the store
//! contract.

use std::collections::BTreeMap;

use featurize_common::cancel::CancelToken;
use featurize_common::error::{FeaturizeError, Result};
use featurize_common::types::{Feature, FeatureMeta};
use regex::Regex;

use crate::FeatureStore;

/// Feature store backed by a sorted map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    features: BTreeMap<String, Feature>,
}

impl MemoryStore {
    /// Creates a store holding `features`. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut store = Self::default();
        for feature in features {
            store.insert(feature);
        }
        store
    }

    /// Adds or replaces a feature.
    pub fn insert(&mut self, feature: Feature) {
        let _ = self.features.insert(feature.meta.name.clone(), feature);
    }

    /// Number of stored features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the store holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn search_meta(&self, pattern: &Regex, cancel: &CancelToken) -> Result<Vec<FeatureMeta>> {
        cancel.check()?;
        Ok(self
            .features
            .values()
            .filter(|f| pattern.is_match(&f.meta.name))
            .map(|f| f.meta.clone())
            .collect())
    }

    fn get_meta(&self, name: &str, cancel: &CancelToken) -> Result<FeatureMeta> {
        self.get_feature(name, cancel).map(|f| f.meta)
    }

    fn get_feature(&self, name: &str, cancel: &CancelToken) -> Result<Feature> {
        cancel.check()?;
        self.features
            .get(name)
            .cloned()
            .ok_or_else(|| FeaturizeError::not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new([
            Feature::new(FeatureMeta::new("python", Vec::<String>::new()), "RUN py", "python -V"),
            Feature::new(FeatureMeta::new("java", Vec::<String>::new()), "RUN java", ""),
            Feature::new(FeatureMeta::new("maven", ["java"]), "RUN mvn", ""),
        ])
    }

    #[test]
    fn get_existing_feature() {
        let feature = store()
            .get_feature("maven", &CancelToken::new())
            .expect("get");
        assert_eq!(feature.name(), "maven");
        assert_eq!(feature.dependencies(), ["java"]);
        assert_eq!(feature.snippet, "RUN mvn");
    }

    #[test]
    fn get_is_case_sensitive() {
        let err = store()
            .get_feature("Python", &CancelToken::new())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn get_meta_of_missing_feature_fails() {
        assert!(store().get_meta("ruby", &CancelToken::new()).is_err());
    }

    #[test]
    fn search_returns_sorted_matches() {
        let pattern = Regex::new("a").expect("regex");
        let metas = store()
            .search_meta(&pattern, &CancelToken::new())
            .expect("search");
        let names: Vec<&str> = metas.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["java", "maven"]);
    }

    #[test]
    fn search_without_match_is_empty() {
        let pattern = Regex::new("^rust$").expect("regex");
        assert!(
            store()
                .search_meta(&pattern, &CancelToken::new())
                .expect("search")
                .is_empty()
        );
    }

    #[test]
    fn insert_replaces_same_name() {
        let mut store = store();
        store.insert(Feature::new(
            FeatureMeta::new("python", Vec::<String>::new()),
            "RUN py3",
            "",
        ));
        assert_eq!(store.len(), 3);
        let feature = store
            .get_feature("python", &CancelToken::new())
            .expect("get");
        assert_eq!(feature.snippet, "RUN py3");
    }

    #[test]
    fn cancelled_token_aborts_lookup() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            store().get_feature("python", &cancel),
            Err(FeaturizeError::Cancelled { .. })
        ));
    }
}
