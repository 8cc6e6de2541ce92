//! Static model scores with a mention-driven popularity adjustment.
//!
//! The capability and popularity baselines are hand-maintained. Only the
//! popularity adjustment depends on the analyzed items: each item whose
//! match text contains any token of a model's name counts as one mention.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::item::ContentItem;

/// Popularity points added per mentioning item.
pub const POINTS_PER_MENTION: u32 = 2;

/// Upper bound for adjusted popularity.
pub const MAX_POPULARITY: u32 = 100;

/// One model's scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModelScoreEntry {
    /// Display name, e.g. `GPT-4o`.
    pub name: String,
    /// Vendor.
    pub provider: String,
    /// Capability score, 0-100.
    pub base_capability: u32,
    /// Popularity before adjustment, 0-100.
    pub base_popularity: u32,
    /// Released recently.
    #[serde(default)]
    pub is_recent: bool,
    /// Items mentioning the model (derived).
    #[serde(default)]
    pub mention_count: usize,
    /// `min(100, base_popularity + 2 × mention_count)` (derived).
    #[serde(default)]
    pub adjusted_popularity: u32,
}

impl ModelScoreEntry {
    /// Create an entry with no mentions yet.
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        base_capability: u32,
        base_popularity: u32,
        is_recent: bool,
    ) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            base_capability,
            base_popularity,
            is_recent,
            mention_count: 0,
            adjusted_popularity: base_popularity.min(MAX_POPULARITY),
        }
    }

    /// Lowercase name tokens used for mention matching.
    pub fn tokens(&self) -> Vec<String> {
        name_tokens(&self.name)
    }

    fn with_mentions(&self, mention_count: usize) -> Self {
        let bonus = u32::try_from(mention_count)
            .unwrap_or(u32::MAX)
            .saturating_mul(POINTS_PER_MENTION);
        Self {
            mention_count,
            adjusted_popularity: self
                .base_popularity
                .saturating_add(bonus)
                .min(MAX_POPULARITY),
            ..self.clone()
        }
    }
}

/// Split a model name on whitespace, hyphens and dots.
///
/// Tokens are lowercased; empty fragments are dropped. Short fragments such
/// as version digits are kept.
pub fn name_tokens(name: &str) -> Vec<String> {
    name.split(|c: char| c.is_whitespace() || c == '-' || c == '.')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// The built-in model list.
pub fn builtin_models() -> Vec<ModelScoreEntry> {
    vec![
        ModelScoreEntry::new("GPT-4o", "OpenAI", 95, 95, false),
        ModelScoreEntry::new("o1", "OpenAI", 97, 84, true),
        ModelScoreEntry::new("Claude 3.5 Sonnet", "Anthropic", 96, 88, true),
        ModelScoreEntry::new("Gemini 1.5 Pro", "Google", 93, 82, false),
        ModelScoreEntry::new("Llama 3.1 405B", "Meta", 90, 86, false),
        ModelScoreEntry::new("DeepSeek-V3", "DeepSeek", 91, 80, true),
        ModelScoreEntry::new("Qwen2.5-72B", "Alibaba", 89, 78, true),
        ModelScoreEntry::new("Mistral Large", "Mistral AI", 86, 70, false),
    ]
}

/// Recompute popularity from item mentions and sort by capability.
///
/// Capability is untouched. Entries with equal capability keep their
/// input order.
#[tracing::instrument(skip_all, fields(models = entries.len(), items = items.len()))]
pub fn adjust(entries: &[ModelScoreEntry], items: &[ContentItem]) -> Vec<ModelScoreEntry> {
    let texts: Vec<String> = items.iter().map(ContentItem::match_text).collect();
    adjust_texts(entries, &texts)
}

/// [`adjust`] over pre-computed match texts.
pub fn adjust_texts<S: AsRef<str>>(entries: &[ModelScoreEntry], texts: &[S]) -> Vec<ModelScoreEntry> {
    let mut adjusted: Vec<ModelScoreEntry> = entries
        .iter()
        .map(|entry| {
            let tokens = entry.tokens();
            let mentions = texts
                .iter()
                .filter(|text| {
                    let text = text.as_ref();
                    tokens.iter().any(|t| text.contains(t.as_str()))
                })
                .count();
            entry.with_mentions(mentions)
        })
        .collect();
    adjusted.sort_by(|a, b| b.base_capability.cmp(&a.base_capability));
    adjusted
}
