//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. Loads are synchronous: a key press queues a
//! [`LoadRequest`], the next frame draws the loading indicator, and then the
//! event loop runs the pipeline via [`AppState::run_pending`].

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use stockcast_core::data::Universe;
use stockcast_core::period::PeriodSelection;
use stockcast_runner::{Dashboard, Issue, StockDataView, StockInfoView};

/// Maximum number of records kept in the error history.
pub const ERROR_HISTORY_CAP: usize = 50;

/// Which page is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    StockData,
    StockInfo,
    Help,
}

impl Page {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Page::StockData => 0,
            Page::StockInfo => 1,
            Page::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Page::StockData),
            1 => Some(Page::StockInfo),
            2 => Some(Page::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::StockData => "Stock Data",
            Page::StockInfo => "Stock Info",
            Page::Help => "Help",
        }
    }

    pub fn next(self) -> Page {
        Page::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Page::StockData)
    }

    pub fn prev(self) -> Page {
        Page::from_index((self.index() + Self::COUNT - 1) % Self::COUNT)
            .unwrap_or(Page::StockData)
    }

    /// Pages backed by a pipeline call.
    pub fn loads_data(self) -> bool {
        !matches!(self, Page::Help)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Forecast,
    Fundamentals,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Data => "DATA",
            ErrorCategory::Forecast => "FCST",
            ErrorCategory::Fundamentals => "INFO",
        }
    }

    pub fn of(issue: &Issue) -> Self {
        match issue {
            Issue::DataUnavailable { .. } => ErrorCategory::Data,
            Issue::ForecastUnavailable(_) => ErrorCategory::Forecast,
            Issue::SnapshotUnavailable { .. } => ErrorCategory::Fundamentals,
        }
    }
}

/// An entry in the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// A row of the sector/ticker tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeItem {
    Sector(String),
    /// (sector, ticker)
    Ticker(String, String),
}

/// Ticker picker state.
#[derive(Debug)]
pub struct TickerTree {
    pub universe: Universe,
    pub expanded_sectors: HashSet<String>,
    /// Flat index into the visible rows.
    pub cursor: usize,
}

impl TickerTree {
    pub fn new(universe: Universe) -> Self {
        let expanded_sectors = universe.sector_names().into_iter().map(String::from).collect();
        Self {
            universe,
            expanded_sectors,
            cursor: 0,
        }
    }

    /// Visible rows in display order.
    pub fn rows(&self) -> Vec<TreeItem> {
        let mut rows = Vec::new();
        for sector in self.universe.sector_names() {
            rows.push(TreeItem::Sector(sector.to_string()));
            if self.expanded_sectors.contains(sector) {
                if let Some(tickers) = self.universe.sector_tickers(sector) {
                    rows.extend(
                        tickers
                            .iter()
                            .map(|t| TreeItem::Ticker(sector.to_string(), t.clone())),
                    );
                }
            }
        }
        rows
    }

    pub fn visible_row_count(&self) -> usize {
        self.rows().len()
    }

    pub fn cursor_item(&self) -> Option<TreeItem> {
        self.rows().into_iter().nth(self.cursor)
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.visible_row_count() {
            self.cursor += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn expand(&mut self, sector: &str) {
        self.expanded_sectors.insert(sector.to_string());
    }

    /// Collapse `sector` and park the cursor on its header row.
    pub fn collapse(&mut self, sector: &str) {
        self.expanded_sectors.remove(sector);
        if let Some(pos) = self
            .rows()
            .iter()
            .position(|r| matches!(r, TreeItem::Sector(s) if s == sector))
        {
            self.cursor = pos;
        }
    }

    /// Put the cursor on `ticker`, expanding its sector.
    pub fn focus(&mut self, ticker: &str) {
        let Some(sector) = self.universe.sector_of(ticker).map(String::from) else {
            return;
        };
        self.expand(&sector);
        if let Some(pos) = self
            .rows()
            .iter()
            .position(|r| matches!(r, TreeItem::Ticker(_, t) if t == ticker))
        {
            self.cursor = pos;
        }
    }
}

/// A pipeline call waiting for the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticker: String,
    pub page: Page,
    pub period: PeriodSelection,
    /// Clear the pipeline caches first.
    pub refresh: bool,
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    ErrorHistory,
}

/// Top-level application state.
pub struct AppState {
    pub page: Page,
    pub running: bool,

    pub tree: TickerTree,
    pub ticker: String,
    pub period: PeriodSelection,

    pub data_view: Option<StockDataView>,
    pub info_view: Option<StockInfoView>,
    pub pending: Option<LoadRequest>,

    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,

    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(universe: Universe, state_path: PathBuf) -> Self {
        let ticker = universe
            .default_ticker()
            .unwrap_or(stockcast_core::data::DEFAULT_TICKER)
            .to_string();
        let mut tree = TickerTree::new(universe);
        tree.focus(&ticker);
        Self {
            page: Page::StockData,
            running: true,
            tree,
            ticker,
            period: PeriodSelection::default(),
            data_view: None,
            info_view: None,
            pending: None,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::None,
            state_path,
        }
    }

    /// Queue a load for the current ticker, page, and period.
    ///
    /// The Help page has nothing to load.
    pub fn request_load(&mut self) {
        self.queue(false);
    }

    /// Queue a load that clears every pipeline cache first.
    pub fn request_refresh(&mut self) {
        self.data_view = None;
        self.info_view = None;
        self.queue(true);
    }

    fn queue(&mut self, refresh: bool) {
        if !self.page.loads_data() {
            return;
        }
        self.pending = Some(LoadRequest {
            ticker: self.ticker.clone(),
            page: self.page,
            period: self.period,
            refresh,
        });
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Switch ticker and queue a load when it changed.
    pub fn select_ticker(&mut self, ticker: &str) {
        if ticker != self.ticker {
            self.ticker = ticker.to_string();
            self.data_view = None;
            self.info_view = None;
        }
        self.request_load();
    }

    pub fn select_period(&mut self, period: PeriodSelection) {
        if period != self.period {
            self.period = period;
            self.data_view = None;
        }
        if self.page == Page::StockData {
            self.request_load();
        }
    }

    /// Switch page and queue a load when its view is missing.
    pub fn select_page(&mut self, page: Page) {
        self.page = page;
        let missing = match page {
            Page::StockData => self.data_view.is_none(),
            Page::StockInfo => self.info_view.is_none(),
            Page::Help => false,
        };
        if missing {
            self.request_load();
        }
    }

    /// Run the queued load, if any.
    pub fn run_pending(&mut self, dashboard: &Dashboard) {
        let Some(req) = self.pending.take() else {
            return;
        };
        tracing::debug!(ticker = %req.ticker, page = req.page.label(), period = %req.period, "loading");
        if req.refresh {
            dashboard.clear_caches();
        }

        let issues = match req.page {
            Page::StockData => {
                let view = dashboard.stock_data(&req.ticker, req.period);
                let issues = view.issues.clone();
                self.data_view = Some(view);
                issues
            }
            Page::StockInfo => {
                let view = dashboard.stock_info(&req.ticker);
                let issues = view.issues.clone();
                self.info_view = Some(view);
                issues
            }
            Page::Help => Vec::new(),
        };

        if issues.is_empty() {
            self.set_status(format!("{} loaded ({})", req.ticker, req.period));
            return;
        }
        let context = format!("{} {} {}", req.ticker, req.page.label(), req.period);
        for issue in &issues {
            self.push_issue(issue, &context);
        }
        // The chart is still usable when only the forecast is missing.
        if issues
            .iter()
            .all(|i| matches!(i, Issue::ForecastUnavailable(_)))
        {
            self.set_warning(format!("{}: forecast unavailable", req.ticker));
        }
    }

    fn push_issue(&mut self, issue: &Issue, context: &str) {
        self.push_error(ErrorCategory::of(issue), issue.to_string(), context.to_string());
    }

    /// Push an error to the history, capping at [`ERROR_HISTORY_CAP`].
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn small_universe() -> Universe {
        let mut sectors = BTreeMap::new();
        sectors.insert("Energy".to_string(), vec!["XOM".to_string(), "CVX".to_string()]);
        sectors.insert(
            "Technology".to_string(),
            vec!["AAPL".to_string(), "MSFT".to_string()],
        );
        Universe::new(sectors).unwrap()
    }

    fn app() -> AppState {
        AppState::new(small_universe(), PathBuf::from("."))
    }

    #[test]
    fn page_cycle() {
        assert_eq!(Page::StockData.next(), Page::StockInfo);
        assert_eq!(Page::Help.next(), Page::StockData);
        assert_eq!(Page::StockData.prev(), Page::Help);
        for i in 0..Page::COUNT {
            assert_eq!(Page::from_index(i).unwrap().index(), i);
        }
        assert!(Page::from_index(3).is_none());
    }

    #[test]
    fn starts_on_default_ticker_and_max() {
        let app = app();
        assert_eq!(app.ticker, "AAPL");
        assert_eq!(app.period, PeriodSelection::Max);
        assert_eq!(
            app.tree.cursor_item(),
            Some(TreeItem::Ticker("Technology".into(), "AAPL".into()))
        );
    }

    #[test]
    fn error_history_caps_at_50() {
        let mut app = app();
        for i in 0..60 {
            app.push_error(ErrorCategory::Data, format!("error {i}"), String::new());
        }
        assert_eq!(app.error_history.len(), ERROR_HISTORY_CAP);
        assert!(app.error_history[0].message.contains("59"));
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Error);
    }

    #[test]
    fn tree_rows_and_collapse() {
        let mut app = app();
        // Energy, XOM, CVX, Technology, AAPL, MSFT
        assert_eq!(app.tree.visible_row_count(), 6);
        app.tree.collapse("Energy");
        assert_eq!(app.tree.visible_row_count(), 4);
        assert_eq!(app.tree.cursor, 0);
        app.tree.move_up();
        assert_eq!(app.tree.cursor, 0);
        app.tree.focus("XOM");
        assert_eq!(app.tree.cursor, 1);
    }

    #[test]
    fn period_change_queues_load_on_stock_data() {
        let mut app = app();
        app.select_period(PeriodSelection::Day);
        assert_eq!(
            app.pending,
            Some(LoadRequest {
                ticker: "AAPL".into(),
                page: Page::StockData,
                period: PeriodSelection::Day,
                refresh: false,
            })
        );
    }

    #[test]
    fn help_page_never_loads() {
        let mut app = app();
        app.select_page(Page::Help);
        assert!(!app.is_loading());
    }
}
