//! Stockcast Runner: configuration, the cached dashboard pipeline, export.
//!
//! This crate builds on `stockcast-core` to provide:
//! - TOML configuration with defaults and validation
//! - The per-request pipeline (fetch → forecast → align) behind memo caches
//! - Stock Data / Stock Info views with explicit degradation issues
//! - JSON and CSV export of views

pub mod config;
pub mod export;
pub mod pipeline;

pub use config::{ConfigError, DashboardConfig};
pub use export::{export_csv, export_json, export_view_csv};
pub use pipeline::{Dashboard, HistoryKey, Issue, StockDataView, StockInfoView};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn dashboard_is_send_sync() {
        assert_send::<Dashboard>();
        assert_sync::<Dashboard>();
    }

    #[test]
    fn views_are_send_sync() {
        assert_send::<StockDataView>();
        assert_sync::<StockDataView>();
        assert_send::<StockInfoView>();
        assert_sync::<StockInfoView>();
        assert_send::<Issue>();
        assert_sync::<Issue>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<DashboardConfig>();
        assert_sync::<DashboardConfig>();
    }
}
