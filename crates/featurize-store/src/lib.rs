//! # featurize-store
//!
//! The read contract every feature backend satisfies, and its
//! implementations:
//! - **Memory**: features held in a sorted map.
//! - **Directory**: an on-disk checkout of a feature repository.
//! - **Registry**: a remote feature registry over HTTP.
//! - **Source**: selection of a backend from the user configuration.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod directory;
pub mod memory;
pub mod registry;
pub mod source;

use featurize_common::cancel::CancelToken;
use featurize_common::error::Result;
use featurize_common::types::{Feature, FeatureMeta, Resolution};
use regex::Regex;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;
pub use registry::RegistryStore;
pub use source::open_store;

/// Uniform read access to a feature backend.
///
/// Backends translate their native failures into
/// [`FeaturizeError`](featurize_common::error::FeaturizeError) kinds: a
/// missing feature is `FeatureNotFound`, transport trouble is
/// `StoreUnavailable`. Every call receives the invocation's cancellation
/// token.
pub trait FeatureStore {
    /// Short backend name used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Returns metadata of every feature whose name matches `pattern`, in
    /// arbitrary order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn search_meta(&self, pattern: &Regex, cancel: &CancelToken) -> Result<Vec<FeatureMeta>>;

    /// Returns the metadata of one feature.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if no feature has this exact name.
    fn get_meta(&self, name: &str, cancel: &CancelToken) -> Result<FeatureMeta>;

    /// Returns the full data of one feature.
    ///
    /// # Errors
    ///
    /// Returns `FeatureNotFound` if no feature has this exact name.
    fn get_feature(&self, name: &str, cancel: &CancelToken) -> Result<Feature>;

    /// Resolves `names` server-side, when the backend can.
    ///
    /// Implementations must honour the reference resolver's contract.
    /// `None` means the caller should resolve itself.
    fn native_resolve(
        &self,
        _names: &[String],
        _cancel: &CancelToken,
    ) -> Option<Result<Resolution>> {
        None
    }
}

impl<T: FeatureStore + ?Sized> FeatureStore for Box<T> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn search_meta(&self, pattern: &Regex, cancel: &CancelToken) -> Result<Vec<FeatureMeta>> {
        (**self).search_meta(pattern, cancel)
    }

    fn get_meta(&self, name: &str, cancel: &CancelToken) -> Result<FeatureMeta> {
        (**self).get_meta(name, cancel)
    }

    fn get_feature(&self, name: &str, cancel: &CancelToken) -> Result<Feature> {
        (**self).get_feature(name, cancel)
    }

    fn native_resolve(
        &self,
        names: &[String],
        cancel: &CancelToken,
    ) -> Option<Result<Resolution>> {
        (**self).native_resolve(names, cancel)
    }
}
