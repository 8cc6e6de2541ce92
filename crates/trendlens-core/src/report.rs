//! Per-taxonomy trend reports and whole-refresh snapshots.
//!
//! This is where the components meet: items are classified once per
//! taxonomy, split into the two comparison windows, counted, given growth
//! and a trailing histogram, and finally ranked.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::tally;
use crate::classify::{Classifier, MatchMode};
use crate::growth::{TrendDirection, growth};
use crate::histogram::{DailyBucket, buckets, daily_counts};
use crate::item::ContentItem;
use crate::models::{ModelScoreEntry, adjust_texts};
use crate::rank::{FallbackPolicy, rank_with_fallback};
use crate::taxonomy::Taxonomy;
use crate::window::{TimeWindow, Timestamped, WindowDays, partition};

/// Default seed for the sample-data fallback.
pub const DEFAULT_SAMPLE_SEED: u64 = 0x7472_656e_646c_656e;

/// One category's computed state for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendRecord {
    /// Category key.
    pub category: String,
    /// Human-readable label.
    pub display_name: String,
    /// Icon hint.
    pub icon: String,
    /// Hex color.
    pub color: String,
    /// Matching items in the current window.
    pub current_count: usize,
    /// Matching items in the previous window.
    pub previous_count: usize,
    /// Percentage change from previous to current.
    pub growth_percent: f64,
    /// Direction after the dead-band.
    pub trend_direction: TrendDirection,
    /// Trailing seven days, oldest first.
    pub daily_histogram: Vec<DailyBucket>,
    /// Produced by the sample-data fallback.
    #[serde(default)]
    pub sample: bool,
}

/// Ranked records for one taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendReport {
    /// Taxonomy name.
    pub taxonomy: String,
    /// Comparison window length in days.
    pub window_days: u32,
    /// Window bounds used.
    pub window: TimeWindow,
    /// "Now" for this report.
    #[schemars(with = "String")]
    pub generated_at: DateTime<Utc>,
    /// Items considered.
    pub total_items: usize,
    /// Items excluded for lack of a usable timestamp.
    pub excluded_items: usize,
    /// True when the records are sample data.
    pub sample_data: bool,
    /// Records by current count, descending.
    pub records: Vec<TrendRecord>,
}

/// Everything one refresh produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendSnapshot {
    /// Refresh generation that produced this snapshot.
    pub generation: u64,
    /// "Now" for this snapshot.
    #[schemars(with = "String")]
    pub generated_at: DateTime<Utc>,
    /// Comparison window length in days.
    pub window_days: u32,
    /// One report per taxonomy, in registry order.
    pub reports: Vec<TrendReport>,
    /// Adjusted model scores, by capability.
    pub models: Vec<ModelScoreEntry>,
}

impl TrendSnapshot {
    /// True if any report was filled with sample data.
    pub fn has_sample_data(&self) -> bool {
        self.reports.iter().any(|r| r.sample_data)
    }
}

/// Knobs for one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Comparison window length.
    pub window: WindowDays,
    /// Reference instant.
    pub now: DateTime<Utc>,
    /// Keyword matching mode.
    pub match_mode: MatchMode,
    /// Behavior for an all-zero taxonomy.
    pub fallback: FallbackPolicy,
    /// Seed for sample data.
    pub sample_seed: u64,
}

impl AnalysisOptions {
    /// Options with default matching and no sample data.
    pub fn new(window: WindowDays, now: DateTime<Utc>) -> Self {
        Self {
            window,
            now,
            match_mode: MatchMode::default(),
            fallback: FallbackPolicy::default(),
            sample_seed: DEFAULT_SAMPLE_SEED,
        }
    }

    /// Set the keyword matching mode.
    #[must_use]
    pub const fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Set the fallback policy and its seed.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: FallbackPolicy, seed: u64) -> Self {
        self.fallback = fallback;
        self.sample_seed = seed;
        self
    }
}

/// An item reduced to what the analysis needs.
struct Prepared {
    text: String,
    created_at: Option<DateTime<Utc>>,
    day: Option<NaiveDate>,
}

/// A prepared item with the category indices it matched in one taxonomy.
struct Classified {
    created_at: Option<DateTime<Utc>>,
    day: Option<NaiveDate>,
    hits: Vec<usize>,
}

impl Timestamped for Classified {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

fn prepare(items: &[ContentItem]) -> Vec<Prepared> {
    items
        .iter()
        .map(|item| Prepared {
            text: item.match_text(),
            created_at: item.created_at,
            day: item.created_at.map(|at| at.date_naive()),
        })
        .collect()
}

/// Analyze one taxonomy over an item snapshot.
#[tracing::instrument(skip_all, fields(taxonomy = %taxonomy.name, items = items.len(), window = %opts.window))]
pub fn analyze_taxonomy(
    items: &[ContentItem],
    taxonomy: &Taxonomy,
    opts: &AnalysisOptions,
) -> TrendReport {
    analyze_prepared(&prepare(items), taxonomy, opts)
}

fn analyze_prepared(prepared: &[Prepared], taxonomy: &Taxonomy, opts: &AnalysisOptions) -> TrendReport {
    let classifier = Classifier::new(taxonomy, opts.match_mode);
    let window = TimeWindow::ending_at(opts.window, opts.now);

    let classified: Vec<Classified> = prepared
        .iter()
        .map(|p| Classified {
            created_at: p.created_at,
            day: p.day,
            hits: classifier.category_indices(&p.text).into_iter().collect(),
        })
        .collect();

    let split = partition(&classified, opts.window, opts.now);
    let categories = taxonomy.categories.len();
    let current_counts = tally(split.current.iter().map(|c| c.hits.as_slice()), categories);
    let previous_counts = tally(split.previous.iter().map(|c| c.hits.as_slice()), categories);
    let daily = daily_counts(
        classified.iter().map(|c| (c.day, c.hits.as_slice())),
        categories,
        opts.now,
    );

    let records: Vec<TrendRecord> = taxonomy
        .categories
        .iter()
        .enumerate()
        .map(|(idx, category)| {
            let g = growth(current_counts[idx], previous_counts[idx]);
            TrendRecord {
                category: category.key.clone(),
                display_name: category.label().to_string(),
                icon: category.icon.clone(),
                color: category.color.clone(),
                current_count: current_counts[idx],
                previous_count: previous_counts[idx],
                growth_percent: g.percent,
                trend_direction: g.direction,
                daily_histogram: buckets(opts.now, |slot| daily[idx][slot]),
                sample: false,
            }
        })
        .collect();

    let ranked = rank_with_fallback(records, opts.fallback, opts.sample_seed, opts.now);

    tracing::info!(
        taxonomy = %taxonomy.name,
        current = split.current.len(),
        previous = split.previous.len(),
        excluded = split.unparsable,
        sample_data = ranked.sample_data,
        "taxonomy analyzed"
    );

    TrendReport {
        taxonomy: taxonomy.name.clone(),
        window_days: opts.window.days(),
        window,
        generated_at: opts.now,
        total_items: prepared.len(),
        excluded_items: split.unparsable,
        sample_data: ranked.sample_data,
        records: ranked.records,
    }
}

/// Analyze every taxonomy and adjust model scores over the same snapshot.
///
/// Each item's match text is built once and shared by all taxonomies and
/// the model registry.
#[tracing::instrument(skip_all, fields(items = items.len(), taxonomies = taxonomies.len(), generation = generation))]
pub fn build_snapshot(
    items: &[ContentItem],
    taxonomies: &[&Taxonomy],
    models: &[ModelScoreEntry],
    opts: &AnalysisOptions,
    generation: u64,
) -> TrendSnapshot {
    let prepared = prepare(items);
    let reports = taxonomies
        .iter()
        .map(|taxonomy| analyze_prepared(&prepared, taxonomy, opts))
        .collect();
    let texts: Vec<&str> = prepared.iter().map(|p| p.text.as_str()).collect();

    TrendSnapshot {
        generation,
        generated_at: opts.now,
        window_days: opts.window.days(),
        reports,
        models: adjust_texts(models, &texts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::builtin_models;
    use crate::taxonomy::{AI_FIELD_TAXONOMY, LANGUAGE_TAXONOMY};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn item(id: &str, days_ago: i64, text: &str) -> ContentItem {
        ContentItem::new(id, Some(now() - Duration::days(days_ago)), [text])
    }

    fn record<'a>(report: &'a TrendReport, key: &str) -> &'a TrendRecord {
        report.records.iter().find(|r| r.category == key).unwrap()
    }

    #[test]
    fn report_counts_growth_and_ranking() {
        let items = vec![
            item("1", 1, "Rust async runtime"),
            item("2", 2, "Rust and Python interop"),
            item("3", 3, "Python notebook"),
            item("4", 9, "Python pipeline"),
            item("5", 10, "Python tooling"),
            item("6", 11, "Rust CLI"),
            ContentItem::new("7", None, ["Rust without timestamp"]),
        ];
        let opts = AnalysisOptions::new(WindowDays::Week, now());
        let report = analyze_taxonomy(&items, &LANGUAGE_TAXONOMY, &opts);

        assert_eq!(report.total_items, 7);
        assert_eq!(report.excluded_items, 1);
        assert!(!report.sample_data);
        assert_eq!(report.records.len(), LANGUAGE_TAXONOMY.categories.len());

        let rust = record(&report, "rust");
        assert_eq!((rust.current_count, rust.previous_count), (2, 1));
        assert_eq!(rust.trend_direction, TrendDirection::Up);
        assert!((rust.growth_percent - 100.0).abs() < 1e-9);

        let python = record(&report, "python");
        assert_eq!((python.current_count, python.previous_count), (2, 2));
        assert_eq!(python.trend_direction, TrendDirection::Stable);

        // python precedes rust in taxonomy order, so the tie keeps it first
        assert_eq!(report.records[0].category, "python");
        assert_eq!(report.records[1].category, "rust");
    }

    #[test]
    fn histogram_ignores_window_length() {
        let items = vec![item("1", 1, "rust"), item("2", 40, "rust")];
        let opts = AnalysisOptions::new(WindowDays::Quarter, now());
        let report = analyze_taxonomy(&items, &LANGUAGE_TAXONOMY, &opts);
        let rust = record(&report, "rust");
        assert_eq!(rust.current_count, 2);
        let total: usize = rust.daily_histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 1);
        assert_eq!(rust.daily_histogram.len(), 7);
    }

    #[test]
    fn growth_is_consistent_with_counts() {
        let items: Vec<ContentItem> = (0..20)
            .map(|i| item(&i.to_string(), i % 14, "llm agents with pytorch"))
            .collect();
        let opts = AnalysisOptions::new(WindowDays::Week, now());
        let report = analyze_taxonomy(&items, &AI_FIELD_TAXONOMY, &opts);
        for r in &report.records {
            let g = growth(r.current_count, r.previous_count);
            assert_eq!(r.trend_direction, g.direction, "{}", r.category);
            assert!((r.growth_percent - g.percent).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_input_without_fallback_is_all_zero() {
        let opts = AnalysisOptions::new(WindowDays::Week, now());
        let report = analyze_taxonomy(&[], &LANGUAGE_TAXONOMY, &opts);
        assert!(!report.sample_data);
        assert!(report.records.iter().all(|r| r.current_count == 0
            && r.trend_direction == TrendDirection::Stable
            && !r.sample));
    }

    #[test]
    fn empty_input_with_fallback_is_flagged() {
        let opts = AnalysisOptions::new(WindowDays::Week, now())
            .with_fallback(FallbackPolicy::Sample, 3);
        let report = analyze_taxonomy(&[], &LANGUAGE_TAXONOMY, &opts);
        assert!(report.sample_data);
        assert!(report.records.iter().all(|r| r.sample && r.current_count >= 3));
    }

    #[test]
    fn snapshot_covers_taxonomies_and_models() {
        let items = vec![item("1", 1, "GPT-4o vs Claude for Rust codegen")];
        let opts = AnalysisOptions::new(WindowDays::Week, now());
        let snapshot = build_snapshot(
            &items,
            &[&LANGUAGE_TAXONOMY, &AI_FIELD_TAXONOMY],
            &builtin_models(),
            &opts,
            4,
        );
        assert_eq!(snapshot.generation, 4);
        assert_eq!(snapshot.window_days, 7);
        assert_eq!(snapshot.reports.len(), 2);
        assert!(!snapshot.has_sample_data());
        let gpt = snapshot.models.iter().find(|m| m.name == "GPT-4o").unwrap();
        assert_eq!(gpt.mention_count, 1);
    }

    #[test]
    fn report_counts_agree_with_partition() {
        let items = vec![
            item("1", 1, "rust"),
            item("2", 10, "rust"),
            item("3", 20, "rust"),
            ContentItem::new("4", None, ["rust"]),
        ];
        let opts = AnalysisOptions::new(WindowDays::Week, now());
        let split = partition(&items, opts.window, opts.now);
        let report = analyze_taxonomy(&items, &LANGUAGE_TAXONOMY, &opts);
        let rust = record(&report, "rust");
        assert_eq!(rust.current_count, split.current.len());
        assert_eq!(rust.previous_count, split.previous.len());
        assert_eq!(report.excluded_items, split.unparsable);
        assert_eq!((rust.current_count, rust.previous_count), (1, 1));
    }

    #[test]
    fn tutorial_and_cli_tool_scenario() {
        let items = vec![
            item("torch", 0, "PyTorch tutorial"),
            item("cli", 10, "Rust CLI tool"),
            ContentItem::new("empty", Some(now()), Vec::<String>::new()),
        ];
        let opts = AnalysisOptions::new(WindowDays::Week, now());
        let report = analyze_taxonomy(&items, &LANGUAGE_TAXONOMY, &opts);

        assert_eq!(report.total_items, 3);
        assert_eq!(report.excluded_items, 0);

        let python = record(&report, "python");
        assert_eq!((python.current_count, python.previous_count), (1, 0));
        assert!((python.growth_percent - 100.0).abs() < 1e-9);
        assert_eq!(python.trend_direction, TrendDirection::Up);

        let rust = record(&report, "rust");
        assert_eq!((rust.current_count, rust.previous_count), (0, 1));
        assert!((rust.growth_percent + 100.0).abs() < 1e-9);
        assert_eq!(rust.trend_direction, TrendDirection::Down);

        assert_eq!(report.records[0].category, "python");
    }

    #[test]
    fn report_serializes_snake_case() {
        let opts = AnalysisOptions::new(WindowDays::Month, now());
        let report = analyze_taxonomy(&[item("1", 1, "go语言")], &LANGUAGE_TAXONOMY, &opts);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["window_days"], 30);
        assert_eq!(json["records"][0]["category"], "go");
        assert_eq!(json["records"][0]["trend_direction"], "up");
    }
}
