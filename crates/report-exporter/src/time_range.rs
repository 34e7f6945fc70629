//! Time-range windows applied to period series before export

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants;

/// Caller-selected window over the most recent periods
///
/// Parsing never fails: labels other than `1m`, `3m`, `6m` and `12m` are kept
/// verbatim (they still name the output file) and resolve to the widest window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeRange {
    Last1,
    Last3,
    Last6,
    #[default]
    Last12,
    Unrecognized(String),
}

impl TimeRange {
    /// Label used in file names and document headers
    pub fn label(&self) -> &str {
        match self {
            TimeRange::Last1 => "1m",
            TimeRange::Last3 => "3m",
            TimeRange::Last6 => "6m",
            TimeRange::Last12 => "12m",
            TimeRange::Unrecognized(label) => label,
        }
    }

    /// Number of trailing periods this range keeps
    pub fn period_count(&self) -> usize {
        match self {
            TimeRange::Last1 => 1,
            TimeRange::Last3 => 3,
            TimeRange::Last6 => 6,
            TimeRange::Last12 | TimeRange::Unrecognized(_) => constants::DEFAULT_PERIOD_COUNT,
        }
    }
}

impl From<&str> for TimeRange {
    fn from(label: &str) -> Self {
        match label.trim() {
            "1m" => TimeRange::Last1,
            "3m" => TimeRange::Last3,
            "6m" => TimeRange::Last6,
            "12m" => TimeRange::Last12,
            _ => TimeRange::Unrecognized(label.to_string()),
        }
    }
}

impl From<String> for TimeRange {
    fn from(label: String) -> Self {
        TimeRange::from(label.as_str())
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.label().to_string()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a time range to its period count (unrecognized ranges get 12)
pub fn period_count_for_range(range: &TimeRange) -> usize {
    range.period_count()
}

/// Keep only the most recent periods of a chronological sequence.
///
/// Returns the input unchanged when it is no longer than the window,
/// otherwise exactly its last `period_count_for_range(range)` elements.
pub fn truncate_to_recent_periods<'a, T>(items: &'a [T], range: &TimeRange) -> &'a [T] {
    let count = period_count_for_range(range);
    if items.len() <= count {
        items
    } else {
        &items[items.len() - count..]
    }
}
