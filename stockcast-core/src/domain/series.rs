//! Price and forecast series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::PriceBar;

/// Errors from series construction.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("timestamps must be strictly increasing: {previous} is followed by {next}")]
    NotIncreasing {
        previous: NaiveDateTime,
        next: NaiveDateTime,
    },
}

/// Ordered OHLCV series with strictly increasing timestamps.
///
/// Empty series are valid. Once built the bars are never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for w in bars.windows(2) {
            if w[1].timestamp <= w[0].timestamp {
                return Err(SeriesError::NotIncreasing {
                    previous: w[0].timestamp,
                    next: w[1].timestamp,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Normalize raw provider bars into a valid series.
    ///
    /// Void bars are dropped, the rest sorted by timestamp. When two bars share
    /// a timestamp the later one in input order wins (providers append the live
    /// bar after the settled one).
    pub fn from_unsorted(bars: Vec<PriceBar>) -> Self {
        let mut bars: Vec<PriceBar> = bars.into_iter().filter(|b| !b.is_void()).collect();
        bars.sort_by_key(|b| b.timestamp);

        let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match out.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => out.push(bar),
            }
        }
        Self { bars: out }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in timestamp order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Lowest low and highest high across the series.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        if self.bars.is_empty() {
            return None;
        }
        let lo = self.bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let hi = self
            .bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((lo, hi))
    }
}

/// Lower/upper bound of a forecast interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionBand {
    pub lower: f64,
    pub upper: f64,
}

/// One forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub predicted_close: f64,
    pub band: Option<PredictionBand>,
}

/// Fixed-length point forecast, one entry per calendar day after the last
/// historical timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
    /// Coverage of the prediction bands (e.g. 0.95), when bands are present.
    pub confidence: Option<f64>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            timestamp: ts(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10,
        }
    }

    #[test]
    fn new_accepts_increasing() {
        let s = PriceSeries::new(vec![bar(1, 10.0), bar(2, 11.0)]).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.last_close(), Some(11.0));
    }

    #[test]
    fn new_rejects_duplicates() {
        let err = PriceSeries::new(vec![bar(2, 10.0), bar(2, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NotIncreasing { .. }));
    }

    #[test]
    fn from_unsorted_sorts_dedupes_and_drops_void() {
        let mut void = bar(3, 12.0);
        void.close = f64::NAN;
        let s = PriceSeries::from_unsorted(vec![bar(2, 11.0), bar(1, 10.0), void, bar(2, 11.5)]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.closes(), vec![10.0, 11.5]);
        assert_eq!(s.last_timestamp(), Some(ts(2)));
    }

    #[test]
    fn empty_series_has_no_range() {
        let s = PriceSeries::empty();
        assert!(s.is_empty());
        assert!(s.price_range().is_none());
        assert!(s.last_timestamp().is_none());
    }

    #[test]
    fn price_range_spans_lows_and_highs() {
        let s = PriceSeries::new(vec![bar(1, 10.0), bar(2, 20.0)]).unwrap();
        assert_eq!(s.price_range(), Some((9.0, 21.0)));
    }

    #[test]
    fn forecast_series_accessors() {
        let f = ForecastSeries {
            points: vec![ForecastPoint {
                timestamp: ts(1) + Duration::days(1),
                predicted_close: 5.0,
                band: None,
            }],
            confidence: None,
        };
        assert_eq!(f.len(), 1);
        assert_eq!(f.values(), vec![5.0]);
        assert_eq!(f.timestamps(), vec![ts(2)]);
    }
}
