//! Ticker universe: the allow-list of selectable symbols, grouped by sector.
//!
//! The built-in list covers large US names, a few popular growth stocks and
//! two ETFs. A `[universe]` table in the config file replaces it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Ticker selected when nothing else is.
pub const DEFAULT_TICKER: &str = "AAPL";

#[derive(Debug, Error, PartialEq)]
pub enum UniverseError {
    #[error("parse universe TOML: {0}")]
    Parse(String),

    #[error("universe has no tickers")]
    Empty,
}

/// Sector name to member tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Build from a sector table, normalizing as it goes (see [`Universe::normalized`]).
    pub fn new(sectors: BTreeMap<String, Vec<String>>) -> Result<Self, UniverseError> {
        let u = Self { sectors }.normalized();
        if u.ticker_count() == 0 {
            return Err(UniverseError::Empty);
        }
        Ok(u)
    }

    /// Parse a universe from a TOML string of `Sector = ["TICK", ...]` pairs.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let sectors: BTreeMap<String, Vec<String>> =
            parse_sectors(content).map_err(UniverseError::Parse)?;
        Self::new(sectors)
    }

    /// Uppercase and trim every ticker, drop blanks, keep only the first
    /// occurrence of a ticker across all sectors, and drop empty sectors.
    pub fn normalized(self) -> Self {
        let mut seen = HashSet::new();
        let sectors = self
            .sectors
            .into_iter()
            .filter_map(|(name, tickers)| {
                let kept: Vec<String> = tickers
                    .into_iter()
                    .map(|t| t.trim().to_ascii_uppercase())
                    .filter(|t| !t.is_empty() && seen.insert(t.clone()))
                    .collect();
                (!kept.is_empty()).then_some((name, kept))
            })
            .collect();
        Self { sectors }
    }

    /// Every ticker, sector by sector.
    pub fn all_tickers(&self) -> Vec<&str> {
        self.sectors
            .values()
            .flat_map(|tickers| tickers.iter().map(|t| t.as_str()))
            .collect()
    }

    pub fn sector_tickers(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(|s| s.as_str()).collect()
    }

    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.sectors
            .iter()
            .find(|(_, tickers)| tickers.iter().any(|t| t == ticker))
            .map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.sector_of(ticker).is_some()
    }

    pub fn ticker_count(&self) -> usize {
        self.sectors.values().map(|v| v.len()).sum()
    }

    /// [`DEFAULT_TICKER`] when listed, otherwise the first ticker.
    pub fn default_ticker(&self) -> Option<&str> {
        if self.contains(DEFAULT_TICKER) {
            return Some(DEFAULT_TICKER);
        }
        self.all_tickers().into_iter().next()
    }

    /// The built-in dashboard allow-list.
    pub fn builtin() -> Self {
        let table: [(&str, &[&str]); 9] = [
            (
                "Technology",
                &[
                    "AAPL", "MSFT", "NVDA", "AMD", "IBM", "ORCL", "INTC", "CSCO", "INTU", "ADBE",
                    "CRWD", "PLTR", "DOCU", "RNG", "DDOG", "ZM", "SHOP",
                ],
            ),
            (
                "Communication",
                &[
                    "GOOGL", "GOOG", "META", "NFLX", "DIS", "T", "VZ", "SNAP", "PINS", "TWTR",
                    "BIDU", "RBLX",
                ],
            ),
            (
                "Consumer",
                &[
                    "AMZN", "TSLA", "BABA", "WMT", "MCD", "KO", "PEP", "COST", "NKE", "TGT", "HD",
                    "LOW", "GM", "F", "ETSY", "SE", "BYND", "CZR", "LULU",
                ],
            ),
            (
                "Financials",
                &[
                    "V", "MA", "PYPL", "SQ", "AIG", "USB", "C", "JPM", "WFC", "MS", "GS", "SOFI",
                ],
            ),
            ("Healthcare", &["JNJ", "PFE", "MRK"]),
            ("Energy", &["XOM", "CVX"]),
            ("Industrials", &["BA", "GE", "LUV", "SPCE", "UBER", "LYFT"]),
            ("Real Estate", &["Z"]),
            ("ETFs", &["SPY", "SMH"]),
        ];

        let sectors = table
            .into_iter()
            .map(|(name, tickers)| {
                (
                    name.to_string(),
                    tickers.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self { sectors }
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_sectors(content: &str) -> Result<BTreeMap<String, Vec<String>>, String> {
    // Accepts either a bare table or one nested under `[sectors]`.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Nested { sectors: BTreeMap<String, Vec<String>> },
        Flat(BTreeMap<String, Vec<String>>),
    }
    match toml::from_str::<Shape>(content).map_err(|e| e.to_string())? {
        Shape::Nested { sectors } => Ok(sectors),
        Shape::Flat(sectors) => Ok(sectors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_is_deduplicated() {
        let u = Universe::builtin();
        let all = u.all_tickers();
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(u.ticker_count(), 74);
    }

    #[test]
    fn default_ticker_is_aapl() {
        assert_eq!(Universe::builtin().default_ticker(), Some("AAPL"));
    }

    #[test]
    fn sector_lookup() {
        let u = Universe::builtin();
        assert_eq!(u.sector_of("SPY"), Some("ETFs"));
        assert!(u.sector_tickers("Energy").unwrap().contains(&"XOM".to_string()));
        assert!(!u.contains("NOPE"));
    }

    #[test]
    fn normalization_drops_cross_sector_duplicates() {
        let mut sectors = BTreeMap::new();
        sectors.insert("A".to_string(), vec![" spy ".to_string(), "SPY".to_string()]);
        sectors.insert("B".to_string(), vec!["spy".to_string()]);
        let u = Universe::new(sectors).unwrap();
        assert_eq!(u.all_tickers(), vec!["SPY"]);
        assert_eq!(u.sector_names(), vec!["A"]);
    }

    #[test]
    fn from_toml_accepts_flat_and_nested() {
        let flat = Universe::from_toml("Tech = [\"MSFT\", \"aapl\"]\n").unwrap();
        assert_eq!(flat.default_ticker(), Some("AAPL"));
        let nested = Universe::from_toml("[sectors]\nEnergy = [\"XOM\"]\n").unwrap();
        assert_eq!(nested.default_ticker(), Some("XOM"));
    }

    #[test]
    fn empty_universe_is_rejected() {
        assert_eq!(Universe::from_toml("Tech = []\n"), Err(UniverseError::Empty));
    }
}
