//! CLI command definitions and dispatch.

pub mod build;
pub mod clean;
pub mod compose;
pub mod config;
pub mod plan;
pub mod project;
pub mod search;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use featurize_common::cancel::CancelToken;
use featurize_common::config::FeaturizeConfig;
use featurize_common::constants::{self, FEATURIZEFILE_NAME};
use featurize_compose::composer::Composer;
use featurize_compose::project::FeatureSet;
use featurize_compose::Generator;
use featurize_store::FeatureStore;

/// Featurize — Compose Dockerfiles and test suites from reusable features.
#[derive(Parser, Debug)]
#[command(name = "featurize", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file.
    #[arg(long, global = true, env = "FEATURIZE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or update a project and generate its artifacts.
    Compose(compose::ComposeArgs),
    /// Regenerate the Dockerfile and test manifest from the Featurizefile.
    Build(build::BuildArgs),
    /// Show the resolved feature order without writing anything.
    Plan(plan::PlanArgs),
    /// Search the feature store by name.
    Search(search::SearchArgs),
    /// Inspect or edit the project's feature list.
    Project(project::ProjectArgs),
    /// Read and write configuration values.
    Config(config::ConfigArgs),
    /// Remove generated files and the Featurizefile.
    Clean(clean::CleanArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(cli.config)?;
    match cli.command {
        Command::Compose(args) => compose::execute(args, &ctx),
        Command::Build(args) => build::execute(args, &ctx),
        Command::Plan(args) => plan::execute(args, &ctx),
        Command::Search(args) => search::execute(args, &ctx),
        Command::Project(args) => project::execute(args),
        Command::Config(args) => config::execute(args, &ctx),
        Command::Clean(args) => clean::execute(&args),
    }
}

/// Per-invocation state shared by the commands.
#[derive(Debug)]
pub struct Context {
    /// Loaded configuration.
    pub config: FeaturizeConfig,
    /// Where the configuration was loaded from.
    pub config_path: PathBuf,
    /// Cancelled by Ctrl-C or when `timeout_secs` elapses.
    pub cancel: CancelToken,
}

impl Context {
    /// Loads the configuration and arms cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but is invalid.
    pub fn load(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = config_path.unwrap_or_else(constants::default_config_file);
        let config = FeaturizeConfig::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;

        let interrupt = CancelToken::new();
        let handle = interrupt.clone();
        if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
            tracing::warn!(error = %e, "failed to set Ctrl+C handler");
        }
        let cancel = if config.timeout_secs == 0 {
            interrupt
        } else {
            interrupt.with_timeout(Duration::from_secs(config.timeout_secs))
        };

        Ok(Self {
            config,
            config_path,
            cancel,
        })
    }

    /// Opens the configured feature store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub fn open_store(&self) -> anyhow::Result<Box<dyn FeatureStore>> {
        featurize_store::open_store(&self.config)
            .with_context(|| format!("opening {} feature store", self.config.storage_type))
    }

    /// Builds a generator over `store` honouring the configured entrypoint.
    pub fn generator<'s, S: FeatureStore + ?Sized>(&self, store: &'s S) -> Generator<'s, S> {
        Generator::new(store)
            .with_composer(Composer::new(self.config.entrypoint.clone()))
            .with_cancel(self.cancel.clone())
    }
}

/// Path of the `Featurizefile` in a project directory.
pub fn featurizefile(dir: &Path) -> PathBuf {
    dir.join(FEATURIZEFILE_NAME)
}

/// Reads the project file of `dir`, explaining how to create a missing one.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid.
pub fn read_project(dir: &Path) -> anyhow::Result<FeatureSet> {
    let path = featurizefile(dir);
    if !path.exists() {
        anyhow::bail!(
            "no {FEATURIZEFILE_NAME} in {}\nCreate one with: featurize compose --init <features>",
            dir.display()
        );
    }
    FeatureSet::read(&path).with_context(|| format!("reading {}", path.display()))
}
