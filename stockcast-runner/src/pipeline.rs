//! Dashboard pipeline: fetch → forecast → align, memoized per input.
//!
//! Each user action runs one synchronous pass. Degradations never fail the
//! pass: a missing series yields an empty view, a failed fit drops the
//! forecast overlay, a failed snapshot renders every field as "N/A". What
//! went wrong is reported through [`Issue`]s on the returned view.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use stockcast_core::align::{DisplayAxis, DEFAULT_HORIZON, DEFAULT_TRAILING_MONTHS};
use stockcast_core::data::{DataError, DataSource, MarketDataProvider, MemoCache};
use stockcast_core::domain::{ForecastSeries, PriceSeries};
use stockcast_core::forecast::{ForecastEngine, ForecastError};
use stockcast_core::fundamentals::{FundamentalsPanel, Snapshot};
use stockcast_core::period::{Interval, Period, PeriodSelection};

/// Chart title for the forecast figure.
pub const FORECAST_TITLE: &str = "Stock Price Forecast (ARIMA)";

/// History cache key: the exact provider request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
}

/// A degradation reported alongside an otherwise usable view.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    /// No price data: empty series or a provider error.
    DataUnavailable { reason: String },
    /// The forecast overlay was omitted.
    ForecastUnavailable(ForecastError),
    /// Fundamentals could not be fetched; every field shows "N/A".
    SnapshotUnavailable { reason: String },
}

impl Issue {
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::DataUnavailable { .. } => "data_unavailable",
            Issue::ForecastUnavailable(_) => "forecast_unavailable",
            Issue::SnapshotUnavailable { .. } => "snapshot_unavailable",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DataUnavailable { reason } => write!(f, "no price data: {reason}"),
            Issue::ForecastUnavailable(e) => write!(f, "forecast unavailable: {e}"),
            Issue::SnapshotUnavailable { reason } => {
                write!(f, "fundamentals unavailable: {reason}")
            }
        }
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Issue", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

/// Everything the Stock Data page draws.
#[derive(Debug, Clone, Serialize)]
pub struct StockDataView {
    pub ticker: String,
    pub selection: PeriodSelection,
    pub period: Period,
    pub interval: Interval,
    pub source: DataSource,
    pub series: PriceSeries,
    pub forecast: Option<ForecastSeries>,
    /// Present whenever `series` is non-empty.
    pub axis: Option<DisplayAxis>,
    /// Forecast values paired with the axis' forecast days.
    pub forecast_trace: Vec<(NaiveDateTime, f64)>,
    pub issues: Vec<Issue>,
}

impl StockDataView {
    pub fn candle_title(&self) -> String {
        format!(
            "Candlestick Chart for {} (Last {})",
            self.ticker,
            self.selection.label()
        )
    }

    pub fn forecast_title(&self) -> &'static str {
        FORECAST_TITLE
    }

    pub fn has_data(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Everything the Stock Info page draws.
#[derive(Debug, Clone, Serialize)]
pub struct StockInfoView {
    pub ticker: String,
    pub panel: FundamentalsPanel,
    /// Six months of daily bars.
    pub history: PriceSeries,
    pub issues: Vec<Issue>,
}

impl StockInfoView {
    pub fn history_title(&self) -> String {
        format!("{} Stock Price History (Last 6 months)", self.ticker)
    }

    pub fn valuation_title(&self) -> String {
        format!("{} Valuation Metrics", self.ticker)
    }

    pub fn ratings_title(&self) -> String {
        format!("{} Analyst Ratings Distribution", self.ticker)
    }
}

/// The pipeline plus its process-wide caches.
pub struct Dashboard {
    provider: Arc<dyn MarketDataProvider>,
    engine: ForecastEngine,
    horizon: usize,
    trailing_months: u32,
    history: MemoCache<HistoryKey, PriceSeries>,
    forecasts: MemoCache<HistoryKey, Result<ForecastSeries, ForecastError>>,
    snapshots: MemoCache<String, Snapshot>,
}

impl Dashboard {
    /// ARIMA(5,1,0), 30-day horizon, 4 trailing months, no cache expiry.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_settings(
            provider,
            ForecastEngine::default(),
            DEFAULT_HORIZON,
            DEFAULT_TRAILING_MONTHS,
            None,
        )
    }

    pub fn with_settings(
        provider: Arc<dyn MarketDataProvider>,
        engine: ForecastEngine,
        horizon: usize,
        trailing_months: u32,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            provider,
            engine,
            horizon,
            trailing_months,
            history: MemoCache::with_ttl("history", cache_ttl),
            forecasts: MemoCache::with_ttl("forecast", cache_ttl),
            snapshots: MemoCache::with_ttl("snapshot", cache_ttl),
        }
    }

    pub fn provider(&self) -> &dyn MarketDataProvider {
        self.provider.as_ref()
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Cached history. Errors are not cached, so the next call retries.
    pub fn history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries, DataError> {
        let key = HistoryKey {
            ticker: ticker.to_string(),
            period,
            interval,
        };
        self.history.get_or_try_insert_with(&key, || {
            debug!(ticker, %period, %interval, provider = self.provider.name(), "fetching history");
            self.provider.history(ticker, period, interval)
        })
    }

    /// Cached snapshot.
    pub fn snapshot(&self, ticker: &str) -> Result<Snapshot, DataError> {
        self.snapshots
            .get_or_try_insert_with(&ticker.to_string(), || self.provider.snapshot(ticker))
    }

    /// Stock Data page: candles, forecast overlay, and the display axis.
    pub fn stock_data(&self, ticker: &str, selection: PeriodSelection) -> StockDataView {
        let (period, interval) = selection.resolve();
        let mut issues = Vec::new();

        let series = match self.history(ticker, period, interval) {
            Ok(s) if s.is_empty() => {
                issues.push(Issue::DataUnavailable {
                    reason: format!("provider returned no bars for {period}"),
                });
                s
            }
            Ok(s) => s,
            Err(e) => {
                issues.push(Issue::DataUnavailable {
                    reason: e.to_string(),
                });
                PriceSeries::empty()
            }
        };

        let mut view = StockDataView {
            ticker: ticker.to_string(),
            selection,
            period,
            interval,
            source: self.provider.source(),
            series,
            forecast: None,
            axis: None,
            forecast_trace: Vec::new(),
            issues,
        };

        if view.series.is_empty() {
            info!(ticker, %selection, "no data, rendering empty chart");
            return view;
        }

        view.axis = DisplayAxis::for_series(&view.series, self.horizon, self.trailing_months);

        let key = HistoryKey {
            ticker: ticker.to_string(),
            period,
            interval,
        };
        let outcome = self
            .forecasts
            .get_or_try_insert_with::<std::convert::Infallible>(&key, || {
                Ok(self.engine.forecast(&view.series, self.horizon))
            })
            .unwrap_or_else(|never| match never {});

        match outcome {
            Ok(fc) => {
                if let Some(axis) = &view.axis {
                    view.forecast_trace = axis.pair_forecast(&fc);
                }
                view.forecast = Some(fc);
            }
            Err(e) => {
                info!(ticker, %selection, error = %e, "forecast overlay omitted");
                view.issues.push(Issue::ForecastUnavailable(e));
            }
        }
        view
    }

    /// Stock Info page: fundamentals panel and six months of daily closes.
    pub fn stock_info(&self, ticker: &str) -> StockInfoView {
        let mut issues = Vec::new();

        let snapshot = match self.snapshot(ticker) {
            Ok(s) => s,
            Err(e) => {
                info!(ticker, error = %e, "fundamentals unavailable");
                issues.push(Issue::SnapshotUnavailable {
                    reason: e.to_string(),
                });
                Snapshot::new()
            }
        };

        let history = match self.history(ticker, Period::SixMonths, Interval::Daily) {
            Ok(s) => {
                if s.is_empty() {
                    issues.push(Issue::DataUnavailable {
                        reason: "provider returned no bars for 6mo".to_string(),
                    });
                }
                s
            }
            Err(e) => {
                issues.push(Issue::DataUnavailable {
                    reason: e.to_string(),
                });
                PriceSeries::empty()
            }
        };

        StockInfoView {
            ticker: ticker.to_string(),
            panel: FundamentalsPanel::build(ticker, &snapshot),
            history,
            issues,
        }
    }

    /// Drop every cached history, forecast, and snapshot.
    pub fn clear_caches(&self) {
        self.history.clear();
        self.forecasts.clear();
        self.snapshots.clear();
        info!("caches cleared");
    }

    /// (history, forecast, snapshot) entry counts.
    pub fn cache_sizes(&self) -> (usize, usize, usize) {
        (self.history.len(), self.forecasts.len(), self.snapshots.len())
    }
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("provider", &self.provider.name())
            .field("engine", &self.engine)
            .field("horizon", &self.horizon)
            .field("trailing_months", &self.trailing_months)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_serializes_as_kind_and_message() {
        let issue = Issue::ForecastUnavailable(ForecastError::ConstantSeries);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "forecast_unavailable");
        assert_eq!(json["message"], "forecast unavailable: series is constant");
    }

    #[test]
    fn data_issue_display() {
        let issue = Issue::DataUnavailable {
            reason: "symbol not found: ZZZZ".into(),
        };
        assert_eq!(issue.to_string(), "no price data: symbol not found: ZZZZ");
    }
}
