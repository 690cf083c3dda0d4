//! `featurize search` — Search the feature store by name.

use anyhow::Context as _;
use clap::Args;
use regex::Regex;

use super::Context;
use crate::output::{format_table, truncate};

/// Arguments for the `search` command.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Regular expression matched against feature names.
    #[arg(default_value = ".*")]
    pub pattern: String,
}

const DESCRIPTION_WIDTH: usize = 60;

/// Executes the `search` command.
///
/// # Errors
///
/// Returns an error if the pattern is not a valid regular expression or the
/// store cannot be queried.
pub fn execute(args: SearchArgs, ctx: &Context) -> anyhow::Result<()> {
    let pattern =
        Regex::new(&args.pattern).with_context(|| format!("invalid pattern {}", args.pattern))?;
    let store = ctx.open_store()?;
    let mut metas = store.search_meta(&pattern, &ctx.cancel)?;
    metas.sort_by(|a, b| a.name.cmp(&b.name));

    if metas.is_empty() {
        println!("No features match {}.", args.pattern);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = metas
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.author.clone(),
                m.updated_at
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string()),
                truncate(&m.description, DESCRIPTION_WIDTH),
            ]
        })
        .collect();
    print!(
        "{}",
        format_table(&["NAME", "AUTHOR", "UPDATED", "DESCRIPTION"], &rows)
    );
    Ok(())
}
