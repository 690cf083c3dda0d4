//! `featurize config` — Read and write configuration values.

use clap::{Args, Subcommand};
use featurize_common::config::{CONFIG_KEYS, FeaturizeConfig};

use super::Context;
use crate::output::format_table;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
#[command(disable_help_subcommand = true)]
pub struct ConfigArgs {
    /// Action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print one value.
    Get {
        /// Dotted key, e.g. `registry.url`.
        key: String,
    },
    /// Set and persist one value.
    Set {
        /// Dotted key, e.g. `registry.url`.
        key: String,
        /// New value.
        value: String,
    },
    /// Print every key with its value.
    List,
    /// Describe every key.
    Help,
}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error for an unknown key, an invalid value, or when the
/// configuration file cannot be written.
pub fn execute(args: ConfigArgs, ctx: &Context) -> anyhow::Result<()> {
    match args.action {
        ConfigAction::Get { key } => println!("{}", ctx.config.get(&key)?),
        ConfigAction::Set { key, value } => {
            let mut config = ctx.config.clone();
            config.set(&key, &value)?;
            config.save(&ctx.config_path)?;
            tracing::info!(key = %key, path = %ctx.config_path.display(), "configuration updated");
        }
        ConfigAction::List => print!("{}", list(&ctx.config)),
        ConfigAction::Help => {
            let rows: Vec<Vec<String>> = CONFIG_KEYS
                .iter()
                .map(|k| vec![k.key.to_string(), k.help.to_string()])
                .collect();
            print!("{}", format_table(&["KEY", "DESCRIPTION"], &rows));
        }
    }
    Ok(())
}

/// Renders every key as `key = value`, hiding the registry token.
fn list(config: &FeaturizeConfig) -> String {
    CONFIG_KEYS
        .iter()
        .map(|k| {
            let value = (k.get)(config);
            let shown = if k.key == "registry.token" && !value.is_empty() {
                "********".to_string()
            } else {
                value
            };
            format!("{} = {shown}\n", k.key)
        })
        .collect()
}
