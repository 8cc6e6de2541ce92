//! Classify command: category sets per item.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use trendlens_core::{Classifier, Config, ContentItem, MatchMode};

use super::{load_items, progress_enabled};

/// Arguments for the `classify` subcommand.
#[derive(Args, Debug, Default)]
pub struct ClassifyArgs {
    /// Read cards from a JSON file instead of the API.
    #[arg(short, long, value_name = "FILE", conflicts_with = "text")]
    pub input: Option<Utf8PathBuf>,

    /// Classify this text instead of loading cards.
    #[arg(long)]
    pub text: Option<String>,

    /// Only use this taxonomy.
    #[arg(short, long, value_name = "NAME")]
    pub taxonomy: Option<String>,

    /// Require keywords to stand alone rather than match inside words.
    #[arg(long)]
    pub word_boundary: bool,

    /// Number of cards to request from the API.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Classified {
    id: String,
    categories: BTreeMap<String, Vec<String>>,
}

/// Print the categories each item falls into.
#[instrument(name = "cmd_classify", skip_all, fields(input = ?args.input))]
pub fn cmd_classify(
    args: ClassifyArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    debug!(taxonomy = ?args.taxonomy, "executing classify command");

    let items = match args.text {
        Some(ref text) => vec![ContentItem::new("text", None, [text.as_str()])],
        None => {
            load_items(
                args.input.as_deref(),
                args.limit,
                config,
                max_input,
                progress_enabled(global_json),
            )?
            .items
        }
    };

    let registry = config.taxonomy_registry();
    let mode = if args.word_boundary {
        MatchMode::WordBoundary
    } else {
        config.match_mode.unwrap_or_default()
    };
    let classifiers: Vec<Classifier> = registry
        .select(args.taxonomy.as_deref())?
        .into_iter()
        .map(|t| Classifier::new(t, mode))
        .collect();

    let results: Vec<Classified> = items
        .iter()
        .map(|item| {
            let text = item.match_text();
            Classified {
                id: item.id.clone(),
                categories: classifiers
                    .iter()
                    .map(|c| {
                        (
                            c.taxonomy_name().to_string(),
                            c.classify_text(&text).into_iter().collect(),
                        )
                    })
                    .collect(),
            }
        })
        .collect();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for r in &results {
        let parts: Vec<String> = r
            .categories
            .iter()
            .map(|(taxonomy, keys)| {
                let keys = if keys.is_empty() {
                    "-".dimmed().to_string()
                } else {
                    keys.join(", ")
                };
                format!("{}: {keys}", taxonomy.dimmed())
            })
            .collect();
        println!("{}  {}", r.id.bold(), parts.join("  "));
    }

    Ok(())
}
