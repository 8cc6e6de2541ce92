//! Trailing seven-day series for sparklines.
//!
//! The series is independent of the comparison window: it always covers the
//! seven calendar days (UTC) ending on `now`'s date, oldest first.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::item::ContentItem;

/// Number of days in every histogram.
pub const HISTOGRAM_DAYS: usize = 7;

/// One day of a category's histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DailyBucket {
    /// Calendar day (UTC).
    #[schemars(with = "String")]
    pub date: NaiveDate,
    /// Short `MM-DD` label.
    pub label: String,
    /// Matching items created that day.
    pub count: usize,
}

/// The seven trailing calendar days ending on `now`'s date, oldest first.
pub fn trailing_days(now: DateTime<Utc>) -> [NaiveDate; HISTOGRAM_DAYS] {
    let today = now.date_naive();
    std::array::from_fn(|i| today - Duration::days((HISTOGRAM_DAYS - 1 - i) as i64))
}

/// Build the trailing seven-day histogram for one category.
///
/// An unknown category key yields seven zero buckets.
pub fn histogram<'a, I>(
    items: I,
    classifier: &Classifier,
    category: &str,
    now: DateTime<Utc>,
) -> Vec<DailyBucket>
where
    I: IntoIterator<Item = &'a ContentItem>,
{
    const MATCHED: &[usize] = &[0];
    let Some(idx) = classifier.keys().iter().position(|k| k == category) else {
        return buckets(now, |_| 0);
    };
    let days = trailing_days(now);
    let entries: Vec<(Option<NaiveDate>, &[usize])> = items
        .into_iter()
        .filter_map(|item| {
            let day = item.created_at?.date_naive();
            (days.contains(&day) && classifier.category_indices(&item.match_text()).contains(&idx))
                .then_some((Some(day), MATCHED))
        })
        .collect();

    let rows = daily_counts(entries, 1, now);
    buckets(now, |slot| rows[0][slot])
}

/// Daily counts for every category at once, from pre-classified items.
///
/// `entries` pairs each item's creation date with the category indices it
/// matched. Returns one `[count; 7]` row per category.
pub fn daily_counts<'a, I>(
    entries: I,
    categories: usize,
    now: DateTime<Utc>,
) -> Vec<[usize; HISTOGRAM_DAYS]>
where
    I: IntoIterator<Item = (Option<NaiveDate>, &'a [usize])>,
{
    let days = trailing_days(now);
    let mut rows = vec![[0usize; HISTOGRAM_DAYS]; categories];
    for (day, hits) in entries {
        let Some(slot) = day.and_then(|d| days.iter().position(|x| *x == d)) else {
            continue;
        };
        for &idx in hits {
            if let Some(row) = rows.get_mut(idx) {
                row[slot] += 1;
            }
        }
    }
    rows
}

/// Materialize seven labelled buckets from a per-slot count function.
pub fn buckets(now: DateTime<Utc>, mut count_for: impl FnMut(usize) -> usize) -> Vec<DailyBucket> {
    trailing_days(now)
        .into_iter()
        .enumerate()
        .map(|(slot, date)| DailyBucket {
            date,
            label: date.format("%m-%d").to_string(),
            count: count_for(slot),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MatchMode;
    use crate::taxonomy::LANGUAGE_TAXONOMY;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
    }

    fn rust_item(id: &str, at: DateTime<Utc>) -> ContentItem {
        ContentItem::new(id, Some(at), ["A Rust crate"])
    }

    #[test]
    fn trailing_days_end_today() {
        let days = trailing_days(now());
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
    }

    #[test]
    fn always_seven_entries() {
        let classifier = Classifier::new(&LANGUAGE_TAXONOMY, MatchMode::Substring);
        let empty: Vec<ContentItem> = Vec::new();
        assert_eq!(histogram(&empty, &classifier, "rust", now()).len(), 7);
        assert_eq!(histogram(&empty, &classifier, "unknown", now()).len(), 7);
    }

    #[test]
    fn counts_by_calendar_day() {
        let classifier = Classifier::new(&LANGUAGE_TAXONOMY, MatchMode::Substring);
        let items = vec![
            // later today, still the same calendar day
            rust_item("a", Utc.with_ymd_and_hms(2024, 6, 15, 23, 0, 0).unwrap()),
            rust_item("b", Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()),
            rust_item("c", Utc.with_ymd_and_hms(2024, 6, 9, 12, 0, 0).unwrap()),
            // eight days back: outside the series
            rust_item("d", Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap()),
            ContentItem::new("e", Some(now()), ["A Python script"]),
            ContentItem::new("f", None, ["Rust without a date"]),
        ];
        let h = histogram(&items, &classifier, "rust", now());
        let counts: Vec<usize> = h.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(h[0].label, "06-09");
        assert_eq!(h[6].label, "06-15");
    }

    #[test]
    fn daily_counts_matches_histogram() {
        let classifier = Classifier::new(&LANGUAGE_TAXONOMY, MatchMode::Substring);
        let items = vec![
            rust_item("a", now()),
            rust_item("b", now() - Duration::days(2)),
        ];
        let classified: Vec<(Option<NaiveDate>, Vec<usize>)> = items
            .iter()
            .map(|i| {
                (
                    i.created_at.map(|at| at.date_naive()),
                    classifier
                        .category_indices(&i.match_text())
                        .into_iter()
                        .collect(),
                )
            })
            .collect();
        let rows = daily_counts(
            classified.iter().map(|(d, hits)| (*d, hits.as_slice())),
            classifier.keys().len(),
            now(),
        );
        let rust_idx = classifier.keys().iter().position(|k| k == "rust").unwrap();
        let expected: Vec<usize> = histogram(&items, &classifier, "rust", now())
            .into_iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(rows[rust_idx].to_vec(), expected);
    }
}
