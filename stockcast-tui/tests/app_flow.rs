//! Key-driven flows rendered through a `TestBackend`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use stockcast_core::data::{SyntheticProvider, Universe};
use stockcast_core::period::PeriodSelection;
use stockcast_runner::Dashboard;
use stockcast_tui::app::{AppState, Overlay, Page};
use stockcast_tui::{handle_key, ui};

fn universe() -> Universe {
    let mut sectors = BTreeMap::new();
    sectors.insert(
        "Technology".to_string(),
        vec!["AAPL".to_string(), "MSFT".to_string()],
    );
    sectors.insert("ETFs".to_string(), vec!["SPY".to_string()]);
    Universe::new(sectors).unwrap()
}

fn dashboard() -> Dashboard {
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
    Dashboard::new(Arc::new(SyntheticProvider::new(as_of)))
}

fn press(app: &mut AppState, code: KeyCode) {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
}

fn screen(app: &AppState) -> String {
    let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
    terminal.draw(|f| ui::draw(f, app)).unwrap();
    let buf = terminal.backend().buffer();
    let area = buf.area;
    let mut out = String::new();
    for y in 0..area.height {
        for x in 0..area.width {
            out.push_str(buf.cell((x, y)).unwrap().symbol());
        }
        out.push('\n');
    }
    out
}

#[test]
fn stock_data_page_loads_candles_and_forecast() {
    let dashboard = dashboard();
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    app.request_load();

    let loading = screen(&app);
    assert!(loading.contains("Loading"));
    assert!(loading.contains("Fetching"));

    app.run_pending(&dashboard);
    assert!(!app.is_loading());
    let view = app.data_view.as_ref().unwrap();
    assert!(view.forecast.is_some(), "issues: {:?}", view.issues);

    let text = screen(&app);
    assert!(text.contains("Candlestick Chart for AAPL (Last max)"));
    assert!(text.contains("Stock Price Forecast (ARIMA)"));
    assert!(text.contains("[max]"));
    assert!(text.contains("AAPL loaded (max)"));
    assert!(!text.contains("forecast unavailable"));
}

#[test]
fn period_key_reloads_with_new_title() {
    let dashboard = dashboard();
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    press(&mut app, KeyCode::Char('['));
    assert_eq!(app.period, PeriodSelection::Month);
    app.run_pending(&dashboard);

    let text = screen(&app);
    assert!(text.contains("Candlestick Chart for AAPL (Last 1mo)"));
}

#[test]
fn stock_info_page_shows_fundamentals_and_charts() {
    let dashboard = dashboard();
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.page, Page::StockInfo);
    assert!(app.is_loading());
    app.run_pending(&dashboard);

    let text = screen(&app);
    assert!(text.contains("Basic Information"));
    assert!(text.contains("AAPL Holdings (synthetic)"));
    assert!(text.contains("Current Recommendation"));
    assert!(text.contains("AAPL Stock Price History (Last 6 months)"));
    assert!(text.contains("AAPL Valuation Metrics"));
    assert!(text.contains("AAPL Analyst Ratings Distribution"));
    assert!(text.contains("35.0%"));
}

#[test]
fn selecting_another_ticker_from_the_tree() {
    let dashboard = dashboard();
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    // Rows: ETFs, SPY, Technology, AAPL, MSFT. Cursor starts on AAPL.
    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.ticker, "MSFT");
    app.run_pending(&dashboard);

    let text = screen(&app);
    assert!(text.contains("Candlestick Chart for MSFT (Last max)"));
    assert!(text.contains("● MSFT"));
}

#[test]
fn help_page_has_no_tree_and_never_loads() {
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    press(&mut app, KeyCode::Char('3'));
    assert!(!app.is_loading());

    let text = screen(&app);
    assert!(text.contains("Global Navigation"));
    assert!(!text.contains(" Tickers "));
}

#[test]
fn welcome_and_error_overlays() {
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    app.overlay = Overlay::Welcome;
    assert!(screen(&app).contains("Welcome to Stockcast"));
    press(&mut app, KeyCode::Char('x'));
    assert_eq!(app.overlay, Overlay::None);

    press(&mut app, KeyCode::Char('e'));
    assert!(screen(&app).contains("No errors recorded."));
}

#[test]
fn intraday_on_a_weekend_uses_the_last_session() {
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(); // Saturday
    let dashboard = Dashboard::new(Arc::new(SyntheticProvider::new(as_of)));
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    app.select_period(PeriodSelection::Day);
    app.run_pending(&dashboard);

    assert!(app.data_view.as_ref().unwrap().has_data());
    assert!(screen(&app).contains("Candlestick Chart for AAPL (Last 24h)"));
}

#[test]
fn provider_failure_lands_in_error_history() {
    use stockcast_core::data::{DataError, DataSource, MarketDataProvider};
    use stockcast_core::domain::PriceSeries;
    use stockcast_core::fundamentals::Snapshot;
    use stockcast_core::period::{Interval, Period};

    struct Down;
    impl MarketDataProvider for Down {
        fn name(&self) -> &str {
            "down"
        }
        fn source(&self) -> DataSource {
            DataSource::YahooFinance
        }
        fn history(&self, _: &str, _: Period, _: Interval) -> Result<PriceSeries, DataError> {
            Err(DataError::CircuitBreakerTripped)
        }
        fn snapshot(&self, _: &str) -> Result<Snapshot, DataError> {
            Err(DataError::CircuitBreakerTripped)
        }
    }

    let dashboard = Dashboard::new(Arc::new(Down));
    let mut app = AppState::new(universe(), PathBuf::from("state.json"));
    app.request_load();
    app.run_pending(&dashboard);

    assert_eq!(app.error_history.len(), 1);
    let text = screen(&app);
    assert!(text.contains("[No Data]"));
    assert!(text.contains("no price data"));

    press(&mut app, KeyCode::Char('e'));
    let text = screen(&app);
    assert!(text.contains("Error History (1)"));
    assert!(text.contains("[DATA]"));
}
