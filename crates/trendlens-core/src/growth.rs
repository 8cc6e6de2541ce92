//! Period-over-period growth and trend direction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Growth within ±this many percent is reported as stable.
pub const DEAD_BAND_PERCENT: f64 = 5.0;

/// Direction of a category's trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Growth above the dead-band.
    Up,
    /// Decline below the dead-band.
    Down,
    /// Within the dead-band, or no data in either period.
    Stable,
}

impl TrendDirection {
    /// Returns the direction as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }

    /// Arrow glyph for terminal output.
    pub const fn arrow(&self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Stable => "→",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage change and the direction it implies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Growth {
    /// Percentage change from the previous period.
    pub percent: f64,
    /// Trend direction after applying the dead-band.
    pub direction: TrendDirection,
}

/// Compute growth from current and previous period counts.
///
/// A category that appears from nothing reports +100%. Otherwise the change
/// is relative to the previous count, and anything within
/// ±[`DEAD_BAND_PERCENT`] is stable.
pub fn growth(current: usize, previous: usize) -> Growth {
    if previous == 0 {
        return if current > 0 {
            Growth {
                percent: 100.0,
                direction: TrendDirection::Up,
            }
        } else {
            Growth {
                percent: 0.0,
                direction: TrendDirection::Stable,
            }
        };
    }

    let percent = (current as f64 - previous as f64) * 100.0 / previous as f64;
    let direction = if percent > DEAD_BAND_PERCENT {
        TrendDirection::Up
    } else if percent < -DEAD_BAND_PERCENT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    Growth { percent, direction }
}
