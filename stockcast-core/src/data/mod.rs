//! Market data: providers, caching, and the ticker universe.

pub mod cache;
pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod universe;
pub mod yahoo;

pub use cache::MemoCache;
pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, DataSource, MarketDataProvider};
pub use synthetic::SyntheticProvider;
pub use universe::{Universe, UniverseError, DEFAULT_TICKER};
pub use yahoo::{YahooProvider, YahooSettings};
