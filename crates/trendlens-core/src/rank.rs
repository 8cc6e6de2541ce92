//! Ranking of trend records, with an opt-in sample-data fallback.
//!
//! When no item matched any category of a taxonomy, a dashboard renders an
//! empty chart. [`FallbackPolicy::Sample`] fills such a taxonomy with
//! bounded pseudo-random values instead. Substituted records are always
//! flagged (`sample = true`) and the substitution is logged, so callers can
//! label the output as sample data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::growth::growth;
use crate::histogram::{HISTOGRAM_DAYS, buckets};
use crate::report::TrendRecord;

/// Inclusive range for synthetic period counts.
const SAMPLE_COUNT_RANGE: std::ops::RangeInclusive<usize> = 3..=40;

/// Inclusive range for synthetic daily counts.
const SAMPLE_DAILY_RANGE: std::ops::RangeInclusive<usize> = 0..=8;

/// What to do when every record of a taxonomy has a zero current count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FallbackPolicy {
    /// Report the zeros as they are.
    #[default]
    Disabled,
    /// Substitute flagged sample data.
    Sample,
}

impl FallbackPolicy {
    /// Returns the policy as a kebab-case string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Sample => "sample",
        }
    }
}

/// Ranked records and whether they were synthesized.
#[derive(Debug, Clone)]
pub struct Ranked {
    /// Records sorted by current count, descending.
    pub records: Vec<TrendRecord>,
    /// True when the sample-data fallback replaced the real counts.
    pub sample_data: bool,
}

/// Sort records by current-period count, descending.
///
/// The sort is stable: records with equal counts keep their input order.
pub fn rank(mut records: Vec<TrendRecord>) -> Vec<TrendRecord> {
    records.sort_by(|a, b| b.current_count.cmp(&a.current_count));
    records
}

/// Rank records, applying the fallback policy first.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn rank_with_fallback(
    mut records: Vec<TrendRecord>,
    policy: FallbackPolicy,
    seed: u64,
    now: chrono::DateTime<chrono::Utc>,
) -> Ranked {
    let all_zero = records.iter().all(|r| r.current_count == 0);
    let sample_data = all_zero && !records.is_empty() && policy == FallbackPolicy::Sample;

    if sample_data {
        tracing::warn!(
            categories = records.len(),
            seed,
            "no category matched any item; substituting sample data"
        );
        fill_with_samples(&mut records, seed, now);
    }

    Ranked {
        records: rank(records),
        sample_data,
    }
}

/// Overwrite counts, growth and histograms with bounded sample values.
///
/// Growth is recomputed from the sample counts, so the record stays
/// internally consistent.
fn fill_with_samples(records: &mut [TrendRecord], seed: u64, now: chrono::DateTime<chrono::Utc>) {
    let mut rng = StdRng::seed_from_u64(seed);
    for record in records.iter_mut() {
        let current = rng.random_range(SAMPLE_COUNT_RANGE);
        let previous = rng.random_range(SAMPLE_COUNT_RANGE);
        let g = growth(current, previous);
        let daily: [usize; HISTOGRAM_DAYS] =
            std::array::from_fn(|_| rng.random_range(SAMPLE_DAILY_RANGE));

        record.current_count = current;
        record.previous_count = previous;
        record.growth_percent = g.percent;
        record.trend_direction = g.direction;
        record.daily_histogram = buckets(now, |slot| daily[slot]);
        record.sample = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::TrendDirection;
    use chrono::{TimeZone, Utc};

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn record(key: &str, current: usize) -> TrendRecord {
        let g = growth(current, 0);
        TrendRecord {
            category: key.to_string(),
            display_name: key.to_uppercase(),
            icon: String::new(),
            color: String::new(),
            current_count: current,
            previous_count: 0,
            growth_percent: g.percent,
            trend_direction: g.direction,
            daily_histogram: buckets(now(), |_| 0),
            sample: false,
        }
    }

    fn keys(records: &[TrendRecord]) -> Vec<&str> {
        records.iter().map(|r| r.category.as_str()).collect()
    }

    #[test]
    fn sorts_descending() {
        let ranked = rank(vec![record("a", 1), record("b", 9), record("c", 4)]);
        assert_eq!(keys(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank(vec![record("a", 5), record("b", 5), record("c", 3)]);
        assert_eq!(keys(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn disabled_fallback_keeps_zeros() {
        let ranked = rank_with_fallback(
            vec![record("a", 0), record("b", 0)],
            FallbackPolicy::Disabled,
            7,
            now(),
        );
        assert!(!ranked.sample_data);
        assert_eq!(keys(&ranked.records), vec!["a", "b"]);
        assert!(ranked.records.iter().all(|r| r.current_count == 0 && !r.sample));
    }

    #[test]
    fn sample_fallback_fills_and_flags() {
        let ranked = rank_with_fallback(
            vec![record("a", 0), record("b", 0), record("c", 0)],
            FallbackPolicy::Sample,
            42,
            now(),
        );
        assert!(ranked.sample_data);
        for r in &ranked.records {
            assert!(r.sample);
            assert!(SAMPLE_COUNT_RANGE.contains(&r.current_count));
            assert!(SAMPLE_COUNT_RANGE.contains(&r.previous_count));
            assert_eq!(r.daily_histogram.len(), HISTOGRAM_DAYS);
            assert!(r.daily_histogram.iter().all(|b| SAMPLE_DAILY_RANGE.contains(&b.count)));
            let g = growth(r.current_count, r.previous_count);
            assert_eq!(r.trend_direction, g.direction);
            assert!((r.growth_percent - g.percent).abs() < 1e-9);
        }
        let counts: Vec<usize> = ranked.records.iter().map(|r| r.current_count).collect();
        let mut sorted = counts.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
    }

    #[test]
    fn sample_fallback_is_deterministic_per_seed() {
        let make = || vec![record("a", 0), record("b", 0)];
        let first = rank_with_fallback(make(), FallbackPolicy::Sample, 9, now());
        let second = rank_with_fallback(make(), FallbackPolicy::Sample, 9, now());
        let counts = |r: &Ranked| {
            r.records
                .iter()
                .map(|x| (x.category.clone(), x.current_count, x.previous_count))
                .collect::<Vec<_>>()
        };
        assert_eq!(counts(&first), counts(&second));
    }

    #[test]
    fn sample_fallback_skipped_when_real_data_exists() {
        let ranked = rank_with_fallback(
            vec![record("a", 0), record("b", 2)],
            FallbackPolicy::Sample,
            1,
            now(),
        );
        assert!(!ranked.sample_data);
        assert_eq!(keys(&ranked.records), vec!["b", "a"]);
        assert_eq!(ranked.records[0].trend_direction, TrendDirection::Up);
    }

    #[test]
    fn empty_taxonomy_is_not_sampled() {
        let ranked = rank_with_fallback(Vec::new(), FallbackPolicy::Sample, 1, now());
        assert!(!ranked.sample_data);
        assert!(ranked.records.is_empty());
    }
}
