//! Dashboard configuration (TOML).
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Example:
//!
//! ```toml
//! [forecast]
//! horizon = 30
//! trailing_months = 4
//! order = { p = 5, d = 1, q = 0 }
//! confidence = 0.95
//!
//! [provider]
//! timeout_secs = 30
//! max_retries = 3
//! synthetic = false
//!
//! [cache]
//! ttl_secs = 900
//!
//! [universe]
//! Technology = ["AAPL", "MSFT"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use stockcast_core::align::{DEFAULT_HORIZON, DEFAULT_TRAILING_MONTHS};
use stockcast_core::data::{
    CircuitBreaker, DataError, MarketDataProvider, SyntheticProvider, Universe, UniverseError,
    YahooProvider, YahooSettings,
};
use stockcast_core::forecast::{ArimaOrder, ForecastEngine};

use crate::pipeline::Dashboard;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid universe: {0}")]
    Universe(#[from] UniverseError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Forecast days appended after the last bar.
    pub horizon: usize,
    /// Months of month-start anchors before the last bar.
    pub trailing_months: u32,
    pub order: ArimaOrder,
    /// Prediction band coverage.
    pub confidence: f64,
    /// Compute prediction bands at all.
    pub bands: bool,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            trailing_months: DEFAULT_TRAILING_MONTHS,
            order: ArimaOrder::default(),
            confidence: 0.95,
            bands: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Circuit breaker cooldown after a ban or repeated rate limiting.
    pub cooldown_secs: u64,
    /// Serve deterministic synthetic data instead of calling Yahoo.
    pub synthetic: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            cooldown_secs: 30 * 60,
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry lifetime; absent means entries live for the whole process.
    pub ttl_secs: Option<u64>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub forecast: ForecastSettings,
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    /// Sector → tickers, replacing the built-in allow-list.
    pub universe: Option<BTreeMap<String, Vec<String>>>,
}

impl DashboardConfig {
    /// `<config_dir>/stockcast/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("stockcast").join("config.toml"))
    }

    /// Load from `path`, or from [`default_path`](Self::default_path) when
    /// `path` is `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_toml(&content)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.forecast;
        if f.horizon == 0 {
            return Err(ConfigError::Invalid("forecast.horizon must be at least 1".into()));
        }
        if f.trailing_months == 0 {
            return Err(ConfigError::Invalid(
                "forecast.trailing_months must be at least 1".into(),
            ));
        }
        if f.order.p == 0 {
            return Err(ConfigError::Invalid("forecast.order.p must be at least 1".into()));
        }
        if f.order.q != 0 {
            return Err(ConfigError::Invalid(
                "forecast.order.q must be 0 (moving-average terms are not supported)".into(),
            ));
        }
        if !(f.confidence > 0.0 && f.confidence < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.confidence must lie strictly between 0 and 1, got {}",
                f.confidence
            )));
        }
        if let Some(sectors) = &self.universe {
            Universe::new(sectors.clone())?;
        }
        Ok(())
    }

    /// Configured universe, or the built-in list.
    pub fn universe(&self) -> Result<Universe, ConfigError> {
        match &self.universe {
            Some(sectors) => Ok(Universe::new(sectors.clone())?),
            None => Ok(Universe::builtin()),
        }
    }

    pub fn engine(&self) -> ForecastEngine {
        let engine = ForecastEngine::new(self.forecast.order);
        if self.forecast.bands {
            engine.with_confidence(self.forecast.confidence)
        } else {
            engine
        }
    }

    pub fn yahoo_settings(&self) -> YahooSettings {
        YahooSettings {
            timeout: Duration::from_secs(self.provider.timeout_secs),
            max_retries: self.provider.max_retries,
            base_delay: Duration::from_millis(self.provider.base_delay_ms),
        }
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache.ttl_secs.map(Duration::from_secs)
    }

    /// The configured provider: synthetic, or Yahoo behind a circuit breaker.
    pub fn build_provider(&self) -> Result<Arc<dyn MarketDataProvider>, DataError> {
        if self.provider.synthetic {
            return Ok(Arc::new(SyntheticProvider::today()));
        }
        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(
            self.provider.cooldown_secs,
        )));
        Ok(Arc::new(YahooProvider::new(breaker, self.yahoo_settings())?))
    }

    /// Dashboard wired to `provider` with these forecast and cache settings.
    pub fn dashboard(&self, provider: Arc<dyn MarketDataProvider>) -> Dashboard {
        Dashboard::with_settings(
            provider,
            self.engine(),
            self.forecast.horizon,
            self.forecast.trailing_months,
            self.cache_ttl(),
        )
    }
}
