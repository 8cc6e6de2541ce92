//! Core library for trendlens.
//!
//! Trend analytics over aggregated technology content: items are classified
//! against keyword taxonomies, split into two comparison windows, counted,
//! given a growth figure and a seven-day histogram, and ranked. A small
//! model registry is adjusted by how often each model is mentioned.
//!
//! Every analysis function is pure over its arguments. The only mutable
//! state is [`refresh::RefreshCoordinator`], which keeps the newest
//! committed [`TrendSnapshot`].
//!
//! # Modules
//!
//! - [`item`] - Wire cards and normalized content items
//! - [`taxonomy`] - Built-in and configured taxonomies
//! - [`classify`] - Keyword classification
//! - [`window`] - Comparison windows and partitioning
//! - [`aggregate`] - Per-category counts
//! - [`growth`] - Growth percentage and trend direction
//! - [`histogram`] - Trailing seven-day series
//! - [`rank`] - Ranking and the sample-data fallback
//! - [`models`] - Model score registry
//! - [`report`] - Reports and snapshots
//! - [`refresh`] - Refresh coordination
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use trendlens_core::{ConfigLoader, build_snapshot, items_from_json};
//!
//! let (config, _sources) = ConfigLoader::new()
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let body = std::fs::read_to_string("cards.json").expect("read cards");
//! let items = items_from_json(&body).expect("decode cards");
//! let registry = config.taxonomy_registry();
//! let taxonomies: Vec<_> = registry.all().iter().collect();
//! let opts = config.analysis_options(chrono::Utc::now());
//!
//! let snapshot = build_snapshot(&items, &taxonomies, &config.model_registry(), &opts, 0);
//! for report in &snapshot.reports {
//!     println!("{}: {} records", report.taxonomy, report.records.len());
//! }
//! ```
#![deny(unsafe_code)]

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod growth;
pub mod histogram;
pub mod item;
pub mod models;
pub mod rank;
pub mod refresh;
pub mod report;
pub mod taxonomy;
pub mod window;

pub use classify::{Classifier, MatchMode};
pub use config::{Config, ConfigLoader, ConfigSources, DEFAULT_MAX_INPUT_BYTES, LogLevel};
pub use error::{AnalysisError, AnalysisResult, ConfigError, ConfigResult};
pub use growth::{Growth, TrendDirection, growth};
pub use histogram::DailyBucket;
pub use item::{Card, ContentItem, items_from_json, parse_cards};
pub use models::ModelScoreEntry;
pub use rank::FallbackPolicy;
pub use refresh::{RefreshCoordinator, RefreshTicket};
pub use report::{
    AnalysisOptions, TrendRecord, TrendReport, TrendSnapshot, analyze_taxonomy, build_snapshot,
};
pub use taxonomy::{Category, Taxonomy, TaxonomyRegistry};
pub use window::{TimeWindow, WindowDays};
