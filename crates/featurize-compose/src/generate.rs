//! One-shot generation of a project's artifacts.
//!
//! Resolves the requested features once, then renders the build descriptor
//! and the test manifest from the same ordered list so their feature blocks
//! always agree.

use std::path::{Path, PathBuf};

use featurize_common::cancel::CancelToken;
use featurize_common::constants::{DOCKERFILE_NAME, TEST_MANIFEST_NAME};
use featurize_common::error::{FeaturizeError, Result};
use featurize_common::types::Resolution;
use featurize_store::FeatureStore;

use crate::composer::Composer;
use crate::graph::DependencyGraph;
use crate::manifest::write_test_manifest;
use crate::project::FeatureSet;
use crate::resolver;

/// Generated project artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Base image the descriptor starts from.
    pub base_image: String,
    /// Feature names as requested, before resolution.
    pub requested: Vec<String>,
    /// Resolved feature names in dependency order.
    pub order: Vec<String>,
    /// Dockerfile text.
    pub build_descriptor: String,
    /// bats test manifest text.
    pub test_manifest: String,
    /// Dependency cycles found among the resolved features.
    pub cycles: Vec<Vec<String>>,
}

impl Artifacts {
    /// Returns the project file recording these artifacts.
    ///
    /// Only the requested names are recorded; dependencies are resolved
    /// again on the next generation.
    #[must_use]
    pub fn feature_set(&self) -> FeatureSet {
        FeatureSet::new(self.base_image.clone(), self.requested.clone())
    }

    /// Writes the Dockerfile and the test manifest into `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = [
            (DOCKERFILE_NAME, &self.build_descriptor),
            (TEST_MANIFEST_NAME, &self.test_manifest),
        ];
        let mut written = Vec::with_capacity(files.len());
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::write(&path, content).map_err(|e| FeaturizeError::Io {
                path: path.clone(),
                source: e,
            })?;
            tracing::info!(path = %path.display(), "wrote artifact");
            written.push(path);
        }
        Ok(written)
    }
}

/// Ties a store, a composer and a cancellation token together.
#[derive(Debug)]
pub struct Generator<'s, S: FeatureStore + ?Sized> {
    store: &'s S,
    composer: Composer,
    cancel: CancelToken,
}

impl<'s, S: FeatureStore + ?Sized> Generator<'s, S> {
    /// Creates a generator with the default composer and no deadline.
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            composer: Composer::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the composer.
    #[must_use]
    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = composer;
        self
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Resolves `names`, preferring the store's native resolution.
    ///
    /// # Errors
    ///
    /// Returns the resolver's errors.
    pub fn resolve<N: AsRef<str>>(&self, names: &[N]) -> Result<Resolution> {
        resolver::resolve_with(names, self.store, &self.cancel)
    }

    /// Generates the artifacts for `names` on top of `base_image`.
    ///
    /// # Errors
    ///
    /// Returns the first resolver or composer error; nothing is produced
    /// on error.
    pub fn generate<N: AsRef<str>>(&self, base_image: &str, names: &[N]) -> Result<Artifacts> {
        let resolution = self.resolve(names)?;
        let cycles = DependencyGraph::from_resolution(&resolution).cycles();
        for cycle in &cycles {
            tracing::warn!(features = ?cycle, "dependency cycle, order along it is best-effort");
        }

        let features = resolution.ordered_features();
        let build_descriptor = self.composer.compose(base_image, &features)?;
        let test_manifest = write_test_manifest(&features);
        tracing::info!(
            base = base_image,
            requested = names.len(),
            resolved = resolution.len(),
            "generated artifacts"
        );

        Ok(Artifacts {
            base_image: base_image.trim().to_string(),
            requested: names.iter().map(|n| n.as_ref().to_string()).collect(),
            order: resolution.order,
            build_descriptor,
            test_manifest,
            cycles,
        })
    }
}

/// Generates artifacts with default settings.
///
/// # Errors
///
/// See [`Generator::generate`].
pub fn generate<N, S>(base_image: &str, names: &[N], store: &S) -> Result<Artifacts>
where
    N: AsRef<str>,
    S: FeatureStore + ?Sized,
{
    Generator::new(store).generate(base_image, names)
}
