//! Integration tests for the dashboard pipeline.
//!
//! Tests:
//! 1. History is fetched once per (ticker, period, interval) and then memoized
//! 2. A short series degrades to "forecast unavailable" but keeps its axis
//! 3. Empty series and provider errors degrade to an empty chart
//! 4. A failed snapshot renders every fundamentals field as "N/A"
//! 5. clear_caches forces a refetch
//! 6. The forecast trace lines up with the tail of the display axis

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use stockcast_core::data::{DataError, DataSource, MarketDataProvider, SyntheticProvider};
use stockcast_core::domain::{PriceBar, PriceSeries};
use stockcast_core::forecast::ForecastError;
use stockcast_core::fundamentals::{Recommendation, Snapshot, NOT_AVAILABLE};
use stockcast_core::period::{Interval, Period, PeriodSelection};
use stockcast_runner::{export_view_csv, Dashboard, DashboardConfig, Issue};

// ── Scripted provider ────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedProvider {
    series: Mutex<HashMap<String, Result<PriceSeries, DataError>>>,
    snapshots: Mutex<HashMap<String, Result<Snapshot, DataError>>>,
    history_calls: AtomicUsize,
    snapshot_calls: AtomicUsize,
}

impl ScriptedProvider {
    fn with_series(self, ticker: &str, series: Result<PriceSeries, DataError>) -> Self {
        self.series
            .lock()
            .unwrap()
            .insert(ticker.to_string(), series);
        self
    }

    fn with_snapshot(self, ticker: &str, snapshot: Result<Snapshot, DataError>) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .insert(ticker.to_string(), snapshot);
        self
    }

    fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn history(
        &self,
        symbol: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<PriceSeries, DataError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.series
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| {
                Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            })
    }

    fn snapshot(&self, symbol: &str) -> Result<Snapshot, DataError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Ok(Snapshot::new()))
    }
}

fn walk(n: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut level = 150.0;
    let bars = (0..n)
        .map(|i| {
            // Deterministic but irregular steps.
            level += ((i * 37 % 11) as f64 - 5.0) * 0.4 + (i as f64 * 0.7).sin();
            PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: level - 0.5,
                high: level + 1.0,
                low: level - 1.0,
                close: level,
                volume: 10_000 + i as u64,
            }
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

fn dashboard(provider: ScriptedProvider) -> (Dashboard, Arc<ScriptedProvider>) {
    let provider = Arc::new(provider);
    (Dashboard::new(provider.clone()), provider)
}

// ── 1. Memoization ───────────────────────────────────────────────────

#[test]
fn history_is_fetched_once_per_key() {
    let (dash, provider) = dashboard(ScriptedProvider::default().with_series("AAPL", Ok(walk(120))));

    let first = dash.stock_data("AAPL", PeriodSelection::Max);
    let second = dash.stock_data("AAPL", PeriodSelection::Max);
    assert_eq!(provider.history_calls(), 1);
    assert_eq!(first.series, second.series);
    assert_eq!(first.forecast, second.forecast);

    dash.stock_data("AAPL", PeriodSelection::Month);
    assert_eq!(provider.history_calls(), 2);
    assert_eq!(dash.cache_sizes().0, 2);
}

#[test]
fn provider_errors_are_not_cached() {
    let (dash, provider) = dashboard(ScriptedProvider::default());
    dash.stock_data("ZZZZ", PeriodSelection::Max);
    dash.stock_data("ZZZZ", PeriodSelection::Max);
    assert_eq!(provider.history_calls(), 2);
}

// ── 2. Forecast unavailable ──────────────────────────────────────────

#[test]
fn short_series_omits_forecast_but_keeps_axis() {
    let (dash, _) = dashboard(ScriptedProvider::default().with_series("MSFT", Ok(walk(10))));
    let view = dash.stock_data("MSFT", PeriodSelection::FiveDays);

    assert!(view.has_data());
    assert!(view.forecast.is_none());
    assert!(view.forecast_trace.is_empty());
    assert!(view.axis.is_some());
    assert_eq!(
        view.issues,
        vec![Issue::ForecastUnavailable(ForecastError::InsufficientData {
            len: 10,
            min: 16
        })]
    );
}

// ── 3. Data unavailable ──────────────────────────────────────────────

#[test]
fn empty_series_is_data_unavailable() {
    let (dash, _) = dashboard(ScriptedProvider::default().with_series("NVDA", Ok(PriceSeries::empty())));
    let view = dash.stock_data("NVDA", PeriodSelection::Day);

    assert!(!view.has_data());
    assert!(view.axis.is_none());
    assert!(view.forecast.is_none());
    assert_eq!(view.issues.len(), 1);
    assert!(matches!(view.issues[0], Issue::DataUnavailable { .. }));
    assert_eq!(view.interval, Interval::FiveMinutes);
}

#[test]
fn provider_error_is_data_unavailable() {
    let (dash, _) = dashboard(
        ScriptedProvider::default().with_series("TSLA", Err(DataError::CircuitBreakerTripped)),
    );
    let view = dash.stock_data("TSLA", PeriodSelection::Max);
    assert!(!view.has_data());
    match &view.issues[0] {
        Issue::DataUnavailable { reason } => assert!(reason.contains("circuit breaker")),
        other => panic!("unexpected issue {other:?}"),
    }
}

// ── 4. Fundamentals fallback ─────────────────────────────────────────

#[test]
fn failed_snapshot_renders_all_not_available() {
    let (dash, _) = dashboard(
        ScriptedProvider::default()
            .with_series("AMZN", Ok(walk(130)))
            .with_snapshot(
                "AMZN",
                Err(DataError::NetworkUnreachable("timed out".into())),
            ),
    );
    let view = dash.stock_info("AMZN");
    assert!(view.panel.rows().all(|r| r.value == NOT_AVAILABLE));
    assert_eq!(view.panel.recommendation, Recommendation::NotAvailable);
    assert!(view
        .issues
        .iter()
        .any(|i| matches!(i, Issue::SnapshotUnavailable { .. })));
    assert_eq!(view.history.len(), 130);
    assert_eq!(view.history_title(), "AMZN Stock Price History (Last 6 months)");
}

#[test]
fn snapshot_is_memoized_per_ticker() {
    let mut snap = Snapshot::new();
    snap.insert("recommendationMean", 2.4);
    let (dash, provider) = dashboard(
        ScriptedProvider::default()
            .with_series("META", Ok(walk(40)))
            .with_snapshot("META", Ok(snap)),
    );
    let a = dash.stock_info("META");
    let b = dash.stock_info("META");
    assert_eq!(provider.snapshot_calls(), 1);
    assert_eq!(a.panel.recommendation, Recommendation::Buy);
    assert_eq!(a.panel, b.panel);
}

// ── 5. Cache clearing ────────────────────────────────────────────────

#[test]
fn clear_caches_forces_refetch() {
    let (dash, provider) = dashboard(ScriptedProvider::default().with_series("AAPL", Ok(walk(60))));
    dash.stock_data("AAPL", PeriodSelection::Max);
    dash.stock_info("AAPL");
    assert_eq!(provider.history_calls(), 2);

    dash.clear_caches();
    assert_eq!(dash.cache_sizes(), (0, 0, 0));

    dash.stock_data("AAPL", PeriodSelection::Max);
    assert_eq!(provider.history_calls(), 3);
}

// ── 6. Trace alignment ───────────────────────────────────────────────

#[test]
fn forecast_trace_matches_axis_tail() {
    let (dash, _) = dashboard(ScriptedProvider::default().with_series("AAPL", Ok(walk(200))));
    let view = dash.stock_data("AAPL", PeriodSelection::Max);

    let forecast = view.forecast.as_ref().expect("forecast");
    let axis = view.axis.as_ref().expect("axis");
    assert_eq!(forecast.len(), 30);
    assert_eq!(view.forecast_trace.len(), 30);
    let trace_ts: Vec<_> = view.forecast_trace.iter().map(|(t, _)| *t).collect();
    assert_eq!(trace_ts, axis.forecast_days().to_vec());
    assert!(view.issues.is_empty());
    assert_eq!(view.candle_title(), "Candlestick Chart for AAPL (Last max)");
}

#[test]
fn candle_title_uses_the_selected_label() {
    let provider = Arc::new(SyntheticProvider::new(
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
    ));
    let dash = Dashboard::new(provider);
    let day = dash.stock_data("AAPL", PeriodSelection::Day);
    assert_eq!(day.candle_title(), "Candlestick Chart for AAPL (Last 24h)");
    let month = dash.stock_data("AAPL", PeriodSelection::Month);
    assert_eq!(month.candle_title(), "Candlestick Chart for AAPL (Last 1mo)");
}

// ── 7. Config wiring + export ────────────────────────────────────────

#[test]
fn configured_dashboard_uses_horizon_and_exports_csv() {
    let cfg = DashboardConfig::from_toml("[forecast]\nhorizon = 7\nbands = false\n").unwrap();
    let provider = Arc::new(SyntheticProvider::new(
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
    ));
    let dash = cfg.dashboard(provider);
    let view = dash.stock_data("AAPL", PeriodSelection::Month);

    let forecast = view.forecast.as_ref().expect("forecast");
    assert_eq!(forecast.len(), 7);
    assert!(forecast.points.iter().all(|p| p.band.is_none()));

    let csv = export_view_csv(&view).unwrap();
    assert_eq!(csv.lines().count(), 1 + view.series.len() + 7);
}
