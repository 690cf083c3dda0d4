//! Transitive dependency resolution.
//!
//! Expands a requested feature list into its dependency closure, ordered so
//! that every feature comes after the features it depends on. Traversal is
//! depth-first with an explicit stack; a dependency that is still on the
//! current path closes a cycle and is skipped, so cyclic graphs terminate
//! with each member listed once.

use std::collections::HashSet;

use featurize_common::cancel::CancelToken;
use featurize_common::error::{FeaturizeError, Result};
use featurize_common::types::{Feature, Resolution};
use featurize_store::FeatureStore;

/// A feature whose dependencies are being visited.
struct Frame {
    name: String,
    feature: Feature,
    next_dependency: usize,
}

impl Frame {
    /// Returns the next dependency to visit and advances past it.
    fn next_dependency(&mut self) -> Option<String> {
        let dep = self
            .feature
            .meta
            .dependencies
            .get(self.next_dependency)
            .cloned()?;
        self.next_dependency += 1;
        Some(dep)
    }
}

/// Resolves `names` and their transitive dependencies against `store`.
///
/// Requested names are processed first-requested-first and dependencies in
/// declaration order. Each distinct name is fetched from the store exactly
/// once.
///
/// # Errors
///
/// Returns `FeatureNotFound` for an unknown requested or transitive name (the
/// latter records the feature that required it), `Cancelled` when `cancel`
/// trips before a fetch, and any store error annotated with the feature
/// being fetched.
pub fn resolve<N, S>(names: &[N], store: &S, cancel: &CancelToken) -> Result<Resolution>
where
    N: AsRef<str>,
    S: FeatureStore + ?Sized,
{
    let mut resolution = Resolution::default();
    let mut in_progress: HashSet<String> = HashSet::new();
    let mut stack: Vec<Frame> = Vec::new();

    for requested in names {
        let requested = requested.as_ref();
        if resolution.features.contains_key(requested) {
            continue;
        }
        stack.push(enter(requested, None, store, cancel, &mut in_progress)?);

        while let Some(frame) = stack.last_mut() {
            let Some(dep) = frame.next_dependency() else {
                if let Some(done) = stack.pop() {
                    let _ = in_progress.remove(&done.name);
                    tracing::trace!(feature = %done.name, "feature resolved");
                    resolution.order.push(done.name.clone());
                    let _ = resolution.features.insert(done.name, done.feature);
                }
                continue;
            };
            if resolution.features.contains_key(&dep) {
                continue;
            }
            if in_progress.contains(&dep) {
                tracing::debug!(
                    feature = %frame.name,
                    dependency = %dep,
                    "dependency cycle, skipping back edge"
                );
                continue;
            }
            let parent = frame.name.clone();
            let next = enter(&dep, Some(&parent), store, cancel, &mut in_progress)?;
            stack.push(next);
        }
    }

    tracing::debug!(
        requested = names.len(),
        resolved = resolution.len(),
        "resolved feature set"
    );
    Ok(resolution)
}

fn enter<S>(
    name: &str,
    parent: Option<&str>,
    store: &S,
    cancel: &CancelToken,
    in_progress: &mut HashSet<String>,
) -> Result<Frame>
where
    S: FeatureStore + ?Sized,
{
    let annotate = |err: FeaturizeError| {
        let err = err.for_feature(name);
        match parent {
            Some(p) => err.required_by(p),
            None => err,
        }
    };
    cancel.check().map_err(annotate)?;
    let feature = store.get_feature(name, cancel).map_err(annotate)?;
    if feature.name() != name {
        tracing::warn!(
            requested = name,
            returned = feature.name(),
            "store returned a feature under a different name"
        );
    }
    let _ = in_progress.insert(name.to_string());
    Ok(Frame {
        name: name.to_string(),
        feature,
        next_dependency: 0,
    })
}

/// Resolves through the store's native resolution when it offers one,
/// falling back to [`resolve`].
///
/// # Errors
///
/// Returns the errors of [`resolve`] or of the store's own resolution, and
/// `StoreUnavailable` if a native resolution is internally inconsistent.
pub fn resolve_with<N, S>(names: &[N], store: &S, cancel: &CancelToken) -> Result<Resolution>
where
    N: AsRef<str>,
    S: FeatureStore + ?Sized,
{
    let owned: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
    match store.native_resolve(&owned, cancel) {
        Some(result) => {
            let resolution = result?;
            if !resolution.is_consistent() {
                return Err(FeaturizeError::unavailable(
                    store.kind(),
                    "native resolution lists features it did not return",
                ));
            }
            tracing::debug!(store = store.kind(), "used native resolution");
            Ok(resolution)
        }
        None => resolve(names, store, cancel),
    }
}
