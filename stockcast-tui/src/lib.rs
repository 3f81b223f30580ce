//! Stockcast TUI: terminal stock dashboard.
//!
//! Pages:
//! 1. Stock Data: candlesticks plus the ARIMA forecast overlay
//! 2. Stock Info: fundamentals, six-month history, valuation and ratings
//! 3. Help: keyboard shortcuts

pub mod app;
pub mod input;
pub mod persistence;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::AppState;
pub use input::handle_key;
pub use theme::Theme;
