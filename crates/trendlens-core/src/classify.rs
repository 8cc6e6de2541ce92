//! Keyword classification of content items against a taxonomy.
//!
//! Every keyword of a taxonomy is compiled into one Aho-Corasick automaton,
//! so an item's match text is scanned once regardless of how many keywords
//! the taxonomy defines. Overlapping matches are reported, which makes the
//! result identical to testing each keyword with `contains`.

use std::collections::BTreeSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};

use crate::item::ContentItem;
use crate::taxonomy::Taxonomy;

/// How a keyword occurrence is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum MatchMode {
    /// Any substring occurrence counts.
    #[default]
    Substring,
    /// The occurrence must not be glued to ASCII letters or digits.
    WordBoundary,
}

impl MatchMode {
    /// Returns the mode as a kebab-case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::WordBoundary => "word-boundary",
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Matcher {
    Automaton(AhoCorasick),
    // Only used if the automaton exceeds aho-corasick's size limits.
    Scan,
}

/// A taxonomy compiled for repeated classification.
pub struct Classifier {
    taxonomy_name: String,
    keys: Vec<String>,
    patterns: Vec<String>,
    owner: Vec<usize>,
    matcher: Matcher,
    mode: MatchMode,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("taxonomy", &self.taxonomy_name)
            .field("categories", &self.keys.len())
            .field("patterns", &self.patterns.len())
            .field("mode", &self.mode)
            .finish()
    }
}

impl Classifier {
    /// Compile a taxonomy's keywords.
    pub fn new(taxonomy: &Taxonomy, mode: MatchMode) -> Self {
        let mut patterns = Vec::new();
        let mut owner = Vec::new();
        for (idx, category) in taxonomy.categories.iter().enumerate() {
            for kw in &category.keywords {
                patterns.push(kw.to_lowercase());
                owner.push(idx);
            }
        }

        let matcher = match AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
        {
            Ok(ac) => Matcher::Automaton(ac),
            Err(e) => {
                tracing::warn!(taxonomy = %taxonomy.name, error = %e, "keyword automaton unavailable, scanning linearly");
                Matcher::Scan
            }
        };

        Self {
            taxonomy_name: taxonomy.name.clone(),
            keys: taxonomy.categories.iter().map(|c| c.key.clone()).collect(),
            patterns,
            owner,
            matcher,
            mode,
        }
    }

    /// Name of the compiled taxonomy.
    pub fn taxonomy_name(&self) -> &str {
        &self.taxonomy_name
    }

    /// Category keys in taxonomy order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Match mode in effect.
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Classify one item.
    pub fn classify(&self, item: &ContentItem) -> BTreeSet<String> {
        self.classify_text(&item.match_text())
    }

    /// Classify an already case-folded match text.
    pub fn classify_text(&self, text: &str) -> BTreeSet<String> {
        self.category_indices(text)
            .into_iter()
            .map(|idx| self.keys[idx].clone())
            .collect()
    }

    /// Indices (into [`keys`](Self::keys)) of the matching categories.
    pub fn category_indices(&self, text: &str) -> BTreeSet<usize> {
        let mut hits = BTreeSet::new();
        if text.is_empty() {
            return hits;
        }

        match &self.matcher {
            Matcher::Automaton(ac) => {
                for m in ac.find_overlapping_iter(text) {
                    let owner = self.owner[m.pattern().as_usize()];
                    if hits.contains(&owner) {
                        continue;
                    }
                    if self.accepts(text, m.start(), m.end()) {
                        hits.insert(owner);
                        if hits.len() == self.keys.len() {
                            break;
                        }
                    }
                }
            }
            Matcher::Scan => {
                for (pattern, &owner) in self.patterns.iter().zip(&self.owner) {
                    if hits.contains(&owner) {
                        continue;
                    }
                    let found = text
                        .match_indices(pattern.as_str())
                        .any(|(start, m)| self.accepts(text, start, start + m.len()));
                    if found {
                        hits.insert(owner);
                    }
                }
            }
        }

        hits
    }

    fn accepts(&self, text: &str, start: usize, end: usize) -> bool {
        match self.mode {
            MatchMode::Substring => true,
            MatchMode::WordBoundary => is_word_bounded(text, start, end),
        }
    }
}

/// Whether `text[start..end]` is not glued to neighbouring word characters.
///
/// An edge is glued when the keyword's edge character is ASCII alphanumeric
/// and its neighbour is alphanumeric in any script, so `go` is rejected in
/// `google` and in `go语言`. Keywords whose edge is a symbol or a CJK
/// character (`c++`, `大模型`) still match inside running text.
fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];
    let glued = |edge: Option<char>, neighbour: Option<char>| match (edge, neighbour) {
        (Some(a), Some(b)) => a.is_ascii_alphanumeric() && b.is_alphanumeric(),
        _ => false,
    };

    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !glued(matched.chars().next(), before) && !glued(matched.chars().next_back(), after)
}

/// Classify one item against a taxonomy using substring matching.
///
/// Convenience for one-off calls; compile a [`Classifier`] when classifying
/// many items.
pub fn classify(item: &ContentItem, taxonomy: &Taxonomy) -> BTreeSet<String> {
    Classifier::new(taxonomy, MatchMode::Substring).classify(item)
}
