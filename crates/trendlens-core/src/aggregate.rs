//! Per-category counting.

use std::collections::HashMap;

use crate::classify::Classifier;
use crate::item::ContentItem;

/// Count, per category, how many items match.
///
/// Every category of the classifier's taxonomy is present in the result,
/// including those with zero matches. An item contributes to every
/// category it matches.
#[tracing::instrument(skip_all, fields(taxonomy = classifier.taxonomy_name()))]
pub fn count<'a, I>(items: I, classifier: &Classifier) -> HashMap<String, usize>
where
    I: IntoIterator<Item = &'a ContentItem>,
{
    let per_index = count_indices(items.into_iter().map(ContentItem::match_text), classifier);
    classifier
        .keys()
        .iter()
        .cloned()
        .zip(per_index)
        .collect()
}

/// Count matches per category index from pre-computed match texts.
pub fn count_indices<I, S>(texts: I, classifier: &Classifier) -> Vec<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let hits: Vec<Vec<usize>> = texts
        .into_iter()
        .map(|text| classifier.category_indices(text.as_ref()).into_iter().collect())
        .collect();
    tally(hits.iter().map(Vec::as_slice), classifier.keys().len())
}

/// Sum already-classified items into per-category counts.
///
/// Each entry lists the category indices one item matched. Indices at or
/// beyond `categories` are ignored.
pub fn tally<'a, I>(hits: I, categories: usize) -> Vec<usize>
where
    I: IntoIterator<Item = &'a [usize]>,
{
    let mut counts = vec![0usize; categories];
    for item in hits {
        for &idx in item {
            if let Some(c) = counts.get_mut(idx) {
                *c += 1;
            }
        }
    }
    counts
}
