//! `featurize build` — Regenerate artifacts from the Featurizefile.

use std::path::PathBuf;

use clap::Args;

use super::{Context, read_project};

/// Arguments for the `build` command.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project directory.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Executes the `build` command.
///
/// # Errors
///
/// Returns an error if the project file is missing, resolution or
/// composition fails, or the artifacts cannot be written.
pub fn execute(args: BuildArgs, ctx: &Context) -> anyhow::Result<()> {
    let project = read_project(&args.dir)?;
    let store = ctx.open_store()?;
    let artifacts = ctx
        .generator(store.as_ref())
        .generate(&project.base, &project.features)?;
    for path in artifacts.write_to(&args.dir)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
