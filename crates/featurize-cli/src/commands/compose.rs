//! `featurize compose` — Create or update a project and generate its artifacts.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Args;
use featurize_compose::Artifacts;
use featurize_compose::project::{FeatureSet, merge_feature_lists, parse_feature_list};

use super::{Context, featurizefile};

/// Arguments for the `compose` command.
#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Replace the project's features with this comma-separated list.
    #[arg(short, long, value_name = "FEATURES", conflicts_with = "add")]
    pub init: Option<String>,

    /// Append these comma-separated features to the project.
    #[arg(short, long, value_name = "FEATURES")]
    pub add: Option<String>,

    /// Base image, overriding the Featurizefile and the configuration.
    #[arg(short, long)]
    pub base: Option<String>,

    /// Project directory.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Executes the `compose` command.
///
/// Merges the requested features into the project's `Featurizefile`,
/// checks that every name exists in the store, generates the Dockerfile and
/// the test manifest and finally records the project file.
///
/// # Errors
///
/// Returns an error if a feature is unknown, the store is unreachable, or a
/// file cannot be written.
pub fn execute(args: ComposeArgs, ctx: &Context) -> anyhow::Result<()> {
    let path = featurizefile(&args.dir);
    let existing = FeatureSet::read_optional(&path)
        .with_context(|| format!("reading {}", path.display()))?;

    let init = args.init.as_deref().map(parse_feature_list).unwrap_or_default();
    let add = args.add.as_deref().map(parse_feature_list).unwrap_or_default();
    let current = existing
        .as_ref()
        .map(|set| set.features.clone())
        .unwrap_or_default();
    let features = merge_feature_lists(&current, &init, &add)?;
    if features.is_empty() {
        anyhow::bail!("no features requested; pass --init or --add");
    }

    let base = args
        .base
        .or_else(|| existing.map(|set| set.base))
        .unwrap_or_else(|| ctx.config.base.clone());

    let store = ctx.open_store()?;
    for name in &features {
        let _ = store
            .get_meta(name, &ctx.cancel)
            .with_context(|| format!("checking feature {name}"))?;
    }

    let artifacts = ctx.generator(store.as_ref()).generate(&base, &features)?;
    write_project(&args.dir, &artifacts)?;

    tracing::info!(features = ?artifacts.requested, "project composed");
    println!(
        "Composed {} feature(s) on {}: {}",
        artifacts.order.len(),
        artifacts.base_image,
        artifacts.order.join(", ")
    );
    Ok(())
}

/// Writes the artifacts into `dir`, then the `Featurizefile`.
///
/// The project file is only updated once both artifacts are on disk.
fn write_project(dir: &Path, artifacts: &Artifacts) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let _ = artifacts.write_to(dir)?;
    artifacts.feature_set().write(&featurizefile(dir))?;
    Ok(())
}
