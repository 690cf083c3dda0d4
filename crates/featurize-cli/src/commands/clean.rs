//! `featurize clean` — Remove generated files and the Featurizefile.

use std::path::{Path, PathBuf};

use clap::Args;
use featurize_common::constants::{DOCKERFILE_NAME, FEATURIZEFILE_NAME, TEST_MANIFEST_NAME};

/// Arguments for the `clean` command.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Project directory.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Executes the `clean` command.
///
/// Missing files are reported but do not fail the command.
///
/// # Errors
///
/// Returns an error if an existing file cannot be removed.
pub fn execute(args: &CleanArgs) -> anyhow::Result<()> {
    for (path, removed) in clean(&args.dir)? {
        if removed {
            println!("Removed {}", path.display());
        } else {
            println!("Not found {}", path.display());
        }
    }
    Ok(())
}

fn clean(dir: &Path) -> anyhow::Result<Vec<(PathBuf, bool)>> {
    let mut outcome = Vec::new();
    for name in [FEATURIZEFILE_NAME, DOCKERFILE_NAME, TEST_MANIFEST_NAME] {
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => outcome.push((path, true)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "nothing to remove");
                outcome.push((path, false));
            }
            Err(e) => return Err(anyhow::anyhow!("removing {}: {e}", path.display())),
        }
    }
    Ok(outcome)
}
