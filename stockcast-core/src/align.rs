//! Display-axis alignment for the historical + forecast overlay chart.
//!
//! The axis is a labelling aid, not a resampled series: a few month-start
//! anchors covering the trailing window of history, followed by one timestamp
//! per forecast day. Anchors are `<= last` and forecast days are `> last`, so
//! the two ranges never overlap and the concatenation is strictly increasing.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{ForecastSeries, PriceSeries};

/// Default forecast horizon in calendar days.
pub const DEFAULT_HORIZON: usize = 30;

/// Default trailing window for month-start anchors.
pub const DEFAULT_TRAILING_MONTHS: u32 = 4;

/// Axis timestamps: trailing month-start anchors, then forecast days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayAxis {
    anchors: Vec<NaiveDateTime>,
    forecast_days: Vec<NaiveDateTime>,
}

impl DisplayAxis {
    /// Guarded constructor: `None` for an empty series instead of a panic.
    pub fn for_series(series: &PriceSeries, horizon: usize, trailing_months: u32) -> Option<Self> {
        series
            .last_timestamp()
            .map(|last| build_display_axis_from(last, horizon, trailing_months))
    }

    /// Month-start anchors in the trailing window.
    pub fn anchors(&self) -> &[NaiveDateTime] {
        &self.anchors
    }

    /// The `horizon` forecast-day timestamps (the tail of the axis).
    pub fn forecast_days(&self) -> &[NaiveDateTime] {
        &self.forecast_days
    }

    /// All timestamps, anchors first.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.anchors
            .iter()
            .chain(self.forecast_days.iter())
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.anchors.len() + self.forecast_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn horizon(&self) -> usize {
        self.forecast_days.len()
    }

    /// Pair forecast values with the final `horizon` axis timestamps.
    ///
    /// Extra values on either side are dropped; the pairing is positional.
    pub fn pair_forecast(&self, forecast: &ForecastSeries) -> Vec<(NaiveDateTime, f64)> {
        self.forecast_days
            .iter()
            .copied()
            .zip(forecast.points.iter().map(|p| p.predicted_close))
            .collect()
    }
}

/// Build the display axis for a series.
///
/// # Panics
///
/// Panics if `series` is empty. Callers must check non-emptiness first (or
/// use [`DisplayAxis::for_series`]); an empty series here is a programming
/// error, not a runtime condition.
pub fn build_display_axis(
    series: &PriceSeries,
    horizon: usize,
    trailing_months: u32,
) -> DisplayAxis {
    let last = series
        .last_timestamp()
        .expect("build_display_axis called with an empty PriceSeries");
    build_display_axis_from(last, horizon, trailing_months)
}

/// Build the display axis from the final historical timestamp.
pub fn build_display_axis_from(
    last: NaiveDateTime,
    horizon: usize,
    trailing_months: u32,
) -> DisplayAxis {
    let anchor_start = last
        .checked_sub_months(Months::new(trailing_months))
        .unwrap_or(NaiveDateTime::MIN);
    DisplayAxis {
        anchors: month_starts(anchor_start, last),
        forecast_days: forecast_timestamps(last, horizon),
    }
}

/// First-of-month timestamps in `[start, end]`, ascending.
///
/// The time of day of `start` is carried onto every month start, so an
/// intraday `start` only matches a first-of-month at or after that time.
pub fn month_starts(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    let mut out = Vec::new();
    let Some(first) = NaiveDate::from_ymd_opt(start.year(), start.month(), 1) else {
        return out;
    };
    let mut cursor = first.and_time(start.time());
    if cursor < start {
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => return out,
        }
    }
    while cursor <= end {
        out.push(cursor);
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    out
}

/// `horizon` consecutive calendar days, starting the day after `last`.
pub fn forecast_timestamps(last: NaiveDateTime, horizon: usize) -> Vec<NaiveDateTime> {
    (1..=horizon as i64)
        .map(|k| last + Duration::days(k))
        .collect()
}
