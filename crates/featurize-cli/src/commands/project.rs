//! `featurize project` — Inspect or edit the project's feature list.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use featurize_compose::project::{parse_feature_list, remove_features};

use super::{featurizefile, read_project};

/// Arguments for the `project` command.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Action to perform.
    #[command(subcommand)]
    pub action: ProjectAction,

    /// Project directory.
    #[arg(short, long, default_value = ".", global = true)]
    pub dir: PathBuf,
}

/// Project actions.
#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Print the base image and requested features.
    List,
    /// Remove comma-separated features from the project.
    Remove {
        /// Features to remove.
        features: String,
    },
}

/// Executes the `project` command.
///
/// # Errors
///
/// Returns an error if the project file is missing or cannot be written.
pub fn execute(args: ProjectArgs) -> anyhow::Result<()> {
    let mut project = read_project(&args.dir)?;
    match args.action {
        ProjectAction::List => {
            println!("base: {}", project.base);
            for name in &project.features {
                println!("  - {name}");
            }
        }
        ProjectAction::Remove { features } => {
            let names = parse_feature_list(&features);
            let before = project.features.len();
            project.features = remove_features(&project.features, &names);
            project.write(&featurizefile(&args.dir))?;
            println!(
                "Removed {} feature(s). Run `featurize build` to regenerate.",
                before - project.features.len()
            );
        }
    }
    Ok(())
}
