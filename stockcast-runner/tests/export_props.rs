//! Property tests for CSV export and config round-trips.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use stockcast_core::domain::{PriceBar, PriceSeries};
use stockcast_core::forecast::ArimaOrder;
use stockcast_runner::{export_csv, DashboardConfig};

fn series_from(closes: &[f64]) -> PriceSeries {
    let t0 = NaiveDate::from_ymd_opt(2023, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar {
            timestamp: t0 + Duration::days(i as i64),
            open: c,
            high: c + 1.0,
            low: c - 1.0,
            close: c,
            volume: 10,
        })
        .collect();
    PriceSeries::new(bars).unwrap()
}

proptest! {
    #[test]
    fn history_csv_has_one_row_per_bar(closes in prop::collection::vec(1.0f64..500.0, 0..60)) {
        let series = series_from(&closes);
        let csv = export_csv(&series, None).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        prop_assert_eq!(lines.len(), 1 + closes.len());
        prop_assert!(lines[1..].iter().all(|l| l.contains(",history,") && l.ends_with(",,")));
    }

    #[test]
    fn config_toml_roundtrips(horizon in 1usize..120, months in 1u32..24, p in 1usize..8, confidence in 0.5f64..0.99) {
        let mut cfg = DashboardConfig::default();
        cfg.forecast.horizon = horizon;
        cfg.forecast.trailing_months = months;
        cfg.forecast.order = ArimaOrder::new(p, 1, 0);
        cfg.forecast.confidence = confidence;
        let text = cfg.to_toml().unwrap();
        prop_assert_eq!(DashboardConfig::from_toml(&text).unwrap(), cfg);
    }
}
