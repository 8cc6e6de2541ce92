//! Trends command: ranked categories per taxonomy plus model scores.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use trendlens_core::{
    Config, DailyBucket, FallbackPolicy, MatchMode, ModelScoreEntry, TrendDirection, TrendReport,
    TrendSnapshot, WindowDays, build_snapshot,
};

use super::{load_items, parse_window, progress_enabled, reference_time};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Arguments for the `trends` subcommand.
#[derive(Args, Debug, Default)]
pub struct TrendsArgs {
    /// Read cards from a JSON file instead of the API.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<Utf8PathBuf>,

    /// Comparison window in days (7, 30 or 90).
    #[arg(short, long, value_name = "DAYS", value_parser = parse_window)]
    pub window: Option<WindowDays>,

    /// Only report this taxonomy.
    #[arg(short, long, value_name = "NAME")]
    pub taxonomy: Option<String>,

    /// Reference time instead of the current time (RFC 3339).
    #[arg(long, value_name = "RFC3339")]
    pub now: Option<DateTime<Utc>>,

    /// Require keywords to stand alone rather than match inside words.
    #[arg(long)]
    pub word_boundary: bool,

    /// Fill taxonomies with no matches with flagged sample data.
    #[arg(long)]
    pub sample_data: bool,

    /// Seed for sample data.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Number of cards to request from the API.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Analyze trends and print them.
#[instrument(name = "cmd_trends", skip_all, fields(input = ?args.input))]
pub fn cmd_trends(
    args: TrendsArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    debug!(window = ?args.window, taxonomy = ?args.taxonomy, "executing trends command");

    let loaded = load_items(
        args.input.as_deref(),
        args.limit,
        config,
        max_input,
        progress_enabled(global_json),
    )?;

    let registry = config.taxonomy_registry();
    let taxonomies = registry.select(args.taxonomy.as_deref())?;

    let mut opts = config.analysis_options(reference_time(args.now));
    if let Some(window) = args.window {
        opts.window = window;
    }
    if args.word_boundary {
        opts.match_mode = MatchMode::WordBoundary;
    }
    if args.sample_data {
        opts.fallback = FallbackPolicy::Sample;
    }
    if let Some(seed) = args.seed {
        opts.sample_seed = seed;
    }

    let snapshot = build_snapshot(
        &loaded.items,
        &taxonomies,
        &config.model_registry(),
        &opts,
        0,
    );

    if global_json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }

    Ok(())
}

fn print_snapshot(snapshot: &TrendSnapshot) {
    for (i, report) in snapshot.reports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_report(report);
    }
    println!();
    print_models(&snapshot.models);
}

fn print_report(report: &TrendReport) {
    println!(
        "{} {}",
        report.taxonomy.bold().underline(),
        format!(
            "({}d window ending {}, {} items, {} without timestamp)",
            report.window_days,
            report.generated_at.format("%Y-%m-%d %H:%M UTC"),
            report.total_items,
            report.excluded_items
        )
        .dimmed()
    );
    if report.sample_data {
        println!(
            "{}",
            "SAMPLE DATA: no item matched any category; the values below are synthetic"
                .yellow()
                .bold()
        );
    }

    for (rank, r) in report.records.iter().enumerate() {
        let growth = format!("{:+.1}%", r.growth_percent);
        let arrow = match r.trend_direction {
            TrendDirection::Up => r.trend_direction.arrow().green().to_string(),
            TrendDirection::Down => r.trend_direction.arrow().red().to_string(),
            TrendDirection::Stable => r.trend_direction.arrow().dimmed().to_string(),
        };
        println!(
            "{:>3}. {:<14} {:>5} {:>5} {:>9} {} {}",
            rank + 1,
            r.display_name,
            r.current_count,
            r.previous_count,
            growth,
            arrow,
            sparkline(&r.daily_histogram).cyan()
        );
    }
}

fn print_models(models: &[ModelScoreEntry]) {
    println!("{}", "models".bold().underline());
    for m in models {
        let recent = if m.is_recent { " new" } else { "" };
        println!(
            "  {:<20} {:<12} capability {:>3}  popularity {:>3} ({} mentions){}",
            m.name,
            m.provider.dimmed(),
            m.base_capability,
            m.adjusted_popularity,
            m.mention_count,
            recent.green()
        );
    }
}

/// Render a histogram as block characters scaled to its maximum.
pub fn sparkline(buckets: &[DailyBucket]) -> String {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    buckets
        .iter()
        .map(|b| {
            if max == 0 {
                SPARK_LEVELS[0]
            } else {
                SPARK_LEVELS[b.count * (SPARK_LEVELS.len() - 1) / max]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn buckets(counts: &[usize]) -> Vec<DailyBucket> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| DailyBucket {
                date: NaiveDate::from_ymd_opt(2024, 6, 9 + i as u32).unwrap(),
                label: format!("06-{:02}", 9 + i),
                count,
            })
            .collect()
    }

    #[test]
    fn sparkline_scales_to_max() {
        assert_eq!(sparkline(&buckets(&[0, 1, 2, 3, 4, 5, 7])), "▁▂▃▄▅▆█");
        assert_eq!(sparkline(&buckets(&[0, 0, 0])), "▁▁▁");
        assert_eq!(sparkline(&buckets(&[3, 3])), "██");
    }

    #[test]
    fn sparkline_empty() {
        assert_eq!(sparkline(&[]), "");
    }
}
