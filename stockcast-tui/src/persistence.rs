//! UI state persistence: JSON save/load across restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use stockcast_core::period::PeriodSelection;

use crate::app::{AppState, Overlay, Page};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub ticker: Option<String>,
    pub page: Page,
    pub period: PeriodSelection,
    pub collapsed_sectors: Vec<String>,
    pub welcome_dismissed: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            ticker: None,
            page: Page::StockData,
            period: PeriodSelection::default(),
            collapsed_sectors: Vec::new(),
            welcome_dismissed: false,
        }
    }
}

/// `<state_dir>/stockcast/state.json`, falling back to the config dir and
/// then the working directory.
pub fn default_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockcast")
        .join("state.json")
}

/// Load persisted state. Missing or corrupt files yield defaults.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt UI state");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state, creating parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn extract(app: &AppState) -> PersistedState {
    let mut collapsed_sectors: Vec<String> = app
        .tree
        .universe
        .sector_names()
        .into_iter()
        .filter(|s| !app.tree.expanded_sectors.contains(*s))
        .map(String::from)
        .collect();
    collapsed_sectors.sort();
    PersistedState {
        ticker: Some(app.ticker.clone()),
        page: app.page,
        period: app.period,
        collapsed_sectors,
        welcome_dismissed: app.overlay != Overlay::Welcome,
    }
}

/// Apply persisted state. Tickers no longer in the universe are ignored.
pub fn apply(app: &mut AppState, state: PersistedState) {
    for sector in &state.collapsed_sectors {
        app.tree.expanded_sectors.remove(sector);
    }
    if let Some(ticker) = state.ticker.filter(|t| app.tree.universe.contains(t)) {
        app.ticker = ticker;
    }
    app.tree.focus(&app.ticker.clone());
    app.page = state.page;
    app.period = state.period;
    if !state.welcome_dismissed {
        app.overlay = Overlay::Welcome;
    }
}
