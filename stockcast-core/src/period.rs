//! Period selector: coarse UI labels to provider (period, interval) pairs.
//!
//! | label  | period  | interval  |
//! |--------|---------|-----------|
//! | `24h`  | 1 day   | 5 minutes |
//! | `5d`   | 5 days  | daily     |
//! | `1mo`  | 1 month | daily     |
//! | `max`  | max     | daily     |
//!
//! Unknown labels fail closed to `max`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How far back a history request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    SixMonths,
    Max,
}

impl Period {
    /// Provider `range` query value.
    pub fn as_range(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::SixMonths => "6mo",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

/// Bar resolution of a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    FiveMinutes,
    /// The provider's native daily resolution.
    Daily,
}

impl Interval {
    /// Provider `interval` query value.
    pub fn as_query(self) -> &'static str {
        match self {
            Interval::FiveMinutes => "5m",
            Interval::Daily => "1d",
        }
    }

    pub fn is_intraday(self) -> bool {
        matches!(self, Interval::FiveMinutes)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// A user-facing period choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PeriodSelection {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    Month,
    #[default]
    #[serde(rename = "max")]
    Max,
}

impl PeriodSelection {
    /// Every selection, in button order.
    pub const ALL: [PeriodSelection; 4] = [
        PeriodSelection::Day,
        PeriodSelection::FiveDays,
        PeriodSelection::Month,
        PeriodSelection::Max,
    ];

    /// Parse a label. Anything unrecognized becomes `Max`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "24h" => PeriodSelection::Day,
            "5d" => PeriodSelection::FiveDays,
            "1mo" => PeriodSelection::Month,
            _ => PeriodSelection::Max,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PeriodSelection::Day => "24h",
            PeriodSelection::FiveDays => "5d",
            PeriodSelection::Month => "1mo",
            PeriodSelection::Max => "max",
        }
    }

    pub fn resolve(self) -> (Period, Interval) {
        match self {
            PeriodSelection::Day => (Period::OneDay, Interval::FiveMinutes),
            PeriodSelection::FiveDays => (Period::FiveDays, Interval::Daily),
            PeriodSelection::Month => (Period::OneMonth, Interval::Daily),
            PeriodSelection::Max => (Period::Max, Interval::Daily),
        }
    }
}

impl fmt::Display for PeriodSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a coarse label straight to a (period, interval) pair.
pub fn resolve(label: &str) -> (Period, Interval) {
    PeriodSelection::parse(label).resolve()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_uses_five_minute_bars() {
        assert_eq!(resolve("24h"), (Period::OneDay, Interval::FiveMinutes));
    }

    #[test]
    fn daily_labels() {
        assert_eq!(resolve("5d"), (Period::FiveDays, Interval::Daily));
        assert_eq!(resolve("1mo"), (Period::OneMonth, Interval::Daily));
        assert_eq!(resolve("max"), (Period::Max, Interval::Daily));
    }

    #[test]
    fn unknown_label_fails_closed_to_max() {
        assert_eq!(resolve("bogus-label"), resolve("max"));
        assert_eq!(resolve(""), resolve("max"));
    }

    #[test]
    fn labels_roundtrip_through_parse() {
        for sel in PeriodSelection::ALL {
            assert_eq!(PeriodSelection::parse(sel.label()), sel);
        }
    }

    #[test]
    fn parse_ignores_case_and_whitespace() {
        assert_eq!(PeriodSelection::parse(" MAX "), PeriodSelection::Max);
        assert_eq!(PeriodSelection::parse("24H"), PeriodSelection::Day);
    }

    #[test]
    fn query_values() {
        assert_eq!(Period::SixMonths.as_range(), "6mo");
        assert_eq!(Interval::FiveMinutes.as_query(), "5m");
        assert!(Interval::FiveMinutes.is_intraday());
        assert!(!Interval::Daily.is_intraday());
    }

    #[test]
    fn selection_serializes_as_label() {
        let json = serde_json::to_string(&PeriodSelection::Month).unwrap();
        assert_eq!(json, "\"1mo\"");
    }
}
