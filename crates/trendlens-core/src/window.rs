//! Period windows and item partitioning.
//!
//! A refresh compares two contiguous, equally long windows ending at "now":
//!
//! ```text
//! previous_start      previous_end == current_start        current_end (now)
//!       |<------ window_days ------>|<------ window_days ------>|
//! ```

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::item::ContentItem;

/// Supported comparison window lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WindowDays {
    /// 7 days.
    #[default]
    Week,
    /// 30 days.
    Month,
    /// 90 days.
    Quarter,
}

impl WindowDays {
    /// All supported lengths, shortest first.
    pub const ALL: [Self; 3] = [Self::Week, Self::Month, Self::Quarter];

    /// Window length in days.
    pub const fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    /// Window length as a duration.
    pub fn duration(self) -> Duration {
        Duration::days(i64::from(self.days()))
    }
}

impl TryFrom<u32> for WindowDays {
    type Error = AnalysisError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(Self::Week),
            30 => Ok(Self::Month),
            90 => Ok(Self::Quarter),
            other => Err(AnalysisError::UnsupportedWindow(other)),
        }
    }
}

impl From<WindowDays> for u32 {
    fn from(window: WindowDays) -> Self {
        window.days()
    }
}

impl std::fmt::Display for WindowDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// The current/previous window pair for one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeWindow {
    /// Exclusive lower bound of the current window.
    #[schemars(with = "String")]
    pub current_start: DateTime<Utc>,
    /// "Now".
    #[schemars(with = "String")]
    pub current_end: DateTime<Utc>,
    /// Exclusive lower bound of the previous window.
    #[schemars(with = "String")]
    pub previous_start: DateTime<Utc>,
    /// Inclusive upper bound of the previous window.
    #[schemars(with = "String")]
    pub previous_end: DateTime<Utc>,
}

impl TimeWindow {
    /// Derive both windows from a length and "now".
    pub fn ending_at(window: WindowDays, now: DateTime<Utc>) -> Self {
        let len = window.duration();
        let current_start = now - len;
        Self {
            current_start,
            current_end: now,
            previous_start: current_start - len,
            previous_end: current_start,
        }
    }

    /// Whether a timestamp falls in the current window (after `current_start`).
    pub fn in_current(&self, at: DateTime<Utc>) -> bool {
        at > self.current_start
    }

    /// Whether a timestamp falls in the previous window.
    pub fn in_previous(&self, at: DateTime<Utc>) -> bool {
        at > self.previous_start && at <= self.previous_end
    }
}

/// Anything that carries an optional creation instant.
///
/// Implemented for [`ContentItem`] and for the pre-classified entries the
/// report builder partitions.
pub trait Timestamped {
    /// Creation instant, if it parsed.
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for ContentItem {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// Items split into the two comparison windows.
#[derive(Debug, Clone)]
pub struct Partition<'a, T = ContentItem> {
    /// Items created after `now - window`.
    pub current: Vec<&'a T>,
    /// Items created in `(now - 2·window, now - window]`.
    pub previous: Vec<&'a T>,
    /// Items without a usable timestamp.
    pub unparsable: usize,
}

impl<T> Default for Partition<'_, T> {
    fn default() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
            unparsable: 0,
        }
    }
}

/// Split items into current and previous windows.
///
/// Items with no parsable timestamp land in neither window; items older
/// than both windows are dropped silently.
#[tracing::instrument(skip_all, fields(items = items.len(), window = %window))]
pub fn partition<T: Timestamped>(
    items: &[T],
    window: WindowDays,
    now: DateTime<Utc>,
) -> Partition<'_, T> {
    let bounds = TimeWindow::ending_at(window, now);
    let mut out = Partition::default();

    for item in items {
        let Some(at) = item.created_at() else {
            out.unparsable += 1;
            continue;
        };
        if bounds.in_current(at) {
            out.current.push(item);
        } else if bounds.in_previous(at) {
            out.previous.push(item);
        }
    }

    tracing::debug!(
        current = out.current.len(),
        previous = out.previous.len(),
        unparsable = out.unparsable,
        "items partitioned"
    );
    out
}
