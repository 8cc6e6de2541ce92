//! Command implementations.

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::Context;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use trendlens_core::{Config, ContentItem, WindowDays, items_from_json};

use crate::fetch::CardsClient;

pub mod classify;
pub mod info;
pub mod models;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod trends;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Parse a `--window` value.
pub fn parse_window(s: &str) -> Result<WindowDays, String> {
    let days: u32 = s
        .trim()
        .trim_end_matches('d')
        .parse()
        .map_err(|_| format!("not a number of days: {s}"))?;
    WindowDays::try_from(days).map_err(|e| e.to_string())
}

/// Items for one command run and whether loading them failed.
#[derive(Debug, Default)]
pub struct LoadedItems {
    /// Normalized items; empty when loading failed.
    pub items: Vec<ContentItem>,
    /// Why the API fetch failed, if it did.
    pub load_failed: Option<String>,
}

/// Load items from `--input` or, without one, from the cards API.
///
/// A bad input file is an error. A failed API fetch is not: it is logged,
/// reported on stderr, and the run continues with no items.
pub fn load_items(
    input: Option<&Utf8Path>,
    limit: Option<usize>,
    config: &Config,
    max_input: Option<usize>,
    show_progress: bool,
) -> anyhow::Result<LoadedItems> {
    if let Some(path) = input {
        let body = read_input_file(path, max_input)?;
        let items =
            items_from_json(&body).with_context(|| format!("failed to decode cards in {path}"))?;
        tracing::debug!(items = items.len(), file = %path, "items loaded from file");
        return Ok(LoadedItems {
            items,
            load_failed: None,
        });
    }

    let limit = limit.unwrap_or_else(|| config.item_limit());
    let client = CardsClient::new(config.api_base_url(), &config.fetch)
        .context("failed to build HTTP client")?;
    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;

    let spinner = show_progress.then(|| spinner(format!("Fetching cards from {}", config.api_base_url())));
    let fetched = rt.block_on(client.fetch_items(limit));
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    Ok(match fetched {
        Ok(items) => LoadedItems {
            items,
            load_failed: None,
        },
        Err(e) => {
            tracing::error!(error = %e, url = %client.cards_url(limit), "cards fetch failed");
            eprintln!("{} {e}", "load failed:".red().bold());
            LoadedItems {
                items: Vec::new(),
                load_failed: Some(e.to_string()),
            }
        }
    })
}

/// Whether to draw progress indicators.
pub fn progress_enabled(json: bool) -> bool {
    !json && std::io::stderr().is_terminal()
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// `--now`, or the current time.
pub fn reference_time(now: Option<DateTime<Utc>>) -> DateTime<Utc> {
    now.unwrap_or_else(Utc::now)
}
