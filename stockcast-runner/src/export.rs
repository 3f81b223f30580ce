//! Export: JSON views and CSV history + forecast tables.
//!
//! - **JSON**: any view, pretty-printed
//! - **CSV**: one row per bar (`kind = history`) followed by one row per
//!   forecast day (`kind = forecast`), sharing a single column layout

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use stockcast_core::domain::{ForecastSeries, PriceSeries};

use crate::pipeline::StockDataView;

/// Timestamp format used in every exported table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize view to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// History bars then forecast points.
///
/// Columns: timestamp, kind, open, high, low, close, volume, lower, upper.
/// Forecast rows leave OHLV empty and put the prediction in `close`; history
/// rows leave the band empty.
pub fn export_csv(series: &PriceSeries, forecast: Option<&ForecastSeries>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "timestamp", "kind", "open", "high", "low", "close", "volume", "lower", "upper",
    ])?;

    for b in series.bars() {
        wtr.write_record([
            b.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            "history".to_string(),
            format!("{:.4}", b.open),
            format!("{:.4}", b.high),
            format!("{:.4}", b.low),
            format!("{:.4}", b.close),
            b.volume.to_string(),
            String::new(),
            String::new(),
        ])?;
    }

    for p in forecast.into_iter().flat_map(|f| f.points.iter()) {
        let (lower, upper) = match p.band {
            Some(band) => (format!("{:.4}", band.lower), format!("{:.4}", band.upper)),
            None => (String::new(), String::new()),
        };
        wtr.write_record([
            p.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            "forecast".to_string(),
            String::new(),
            String::new(),
            String::new(),
            format!("{:.4}", p.predicted_close),
            String::new(),
            lower,
            upper,
        ])?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// CSV for a Stock Data view.
pub fn export_view_csv(view: &StockDataView) -> Result<String> {
    export_csv(&view.series, view.forecast.as_ref())
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
