//! Stockcast Core: price series, period selection, forecasting, display-axis
//! alignment, and the fundamentals panel model.
//!
//! This crate has no UI dependencies:
//! - Domain types (bars, price series, forecast series)
//! - Period selector mapping UI labels to provider (period, interval) pairs
//! - ARIMA forecast engine with explicit "forecast unavailable" outcomes
//! - Display-axis alignment (trailing month-start anchors + forecast days)
//! - Market data providers (Yahoo Finance, deterministic synthetic), memo caches
//! - Fundamentals snapshot and its labelled, "N/A"-safe presentation

pub mod align;
pub mod data;
pub mod domain;
pub mod forecast;
pub mod fundamentals;
pub mod period;

pub use align::{build_display_axis, DisplayAxis};
pub use domain::{ForecastSeries, PriceBar, PriceSeries};
pub use forecast::{forecast, ForecastEngine, ForecastError};
pub use period::{resolve, Interval, Period, PeriodSelection};
