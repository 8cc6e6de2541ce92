//! Models command: capability and mention-adjusted popularity.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use trendlens_core::Config;
use trendlens_core::models::adjust;

use super::{load_items, progress_enabled};

/// Arguments for the `models` subcommand.
#[derive(Args, Debug, Default)]
pub struct ModelsArgs {
    /// Read cards from a JSON file instead of the API.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<Utf8PathBuf>,

    /// Number of cards to request from the API.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Print model scores adjusted by item mentions.
#[instrument(name = "cmd_models", skip_all, fields(input = ?args.input))]
pub fn cmd_models(
    args: ModelsArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    debug!("executing models command");

    let loaded = load_items(
        args.input.as_deref(),
        args.limit,
        config,
        max_input,
        progress_enabled(global_json),
    )?;
    let models = adjust(&config.model_registry(), &loaded.items);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:>10} {:>10} {:>8}",
        "Model".bold(),
        "Provider".bold(),
        "Capability".bold(),
        "Popularity".bold(),
        "Mentions".bold()
    );
    for m in &models {
        let popularity = if m.adjusted_popularity > m.base_popularity {
            format!("{}→{}", m.base_popularity, m.adjusted_popularity)
        } else {
            m.adjusted_popularity.to_string()
        };
        println!(
            "{:<20} {:<12} {:>10} {:>10} {:>8}{}",
            m.name,
            m.provider,
            m.base_capability,
            popularity,
            m.mention_count,
            if m.is_recent { "  new" } else { "" }
        );
    }

    Ok(())
}
