//! `featurize plan` — Show the resolved feature order before generating.

use std::path::PathBuf;

use clap::Args;
use featurize_compose::graph::DependencyGraph;

use super::{Context, read_project};

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Project directory.
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,
}

/// Executes the `plan` command.
///
/// Resolves the project's features and displays the order in which their
/// snippets will be emitted, with their direct dependencies and any cycles.
///
/// # Errors
///
/// Returns an error if the project file is missing or resolution fails.
pub fn execute(args: PlanArgs, ctx: &Context) -> anyhow::Result<()> {
    let project = read_project(&args.dir)?;
    let store = ctx.open_store()?;
    let resolution = ctx.generator(store.as_ref()).resolve(&project.features)?;
    let graph = DependencyGraph::from_resolution(&resolution);

    println!("Plan for: {}", args.dir.display());
    println!("{}", "\u{2550}".repeat(35));
    println!();
    println!("  FROM {}", project.base);
    for feature in resolution.ordered_features() {
        let marker = if project.features.iter().any(|n| n == feature.name()) {
            "+"
        } else {
            "~"
        };
        println!("  {marker} {}", feature.name());
        if !feature.dependencies().is_empty() {
            println!("      requires: {}", feature.dependencies().join(", "));
        }
    }
    println!();
    println!(
        "  {} feature(s), {} requested, {} pulled in as dependencies.",
        resolution.len(),
        project.features.len(),
        resolution.len().saturating_sub(project.features.len())
    );

    let cycles = graph.cycles();
    if !cycles.is_empty() {
        println!();
        println!("  Dependency cycles (order along them is best-effort):");
        for cycle in &cycles {
            println!("    {}", cycle.join(" <-> "));
        }
        for (dependent, dependency) in graph.order_violations(&resolution.order) {
            println!("    {dependent} is emitted before its dependency {dependency}");
        }
    }
    Ok(())
}
