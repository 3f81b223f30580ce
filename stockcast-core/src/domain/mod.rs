//! Domain types: bars, price series, forecast series.

pub mod bar;
pub mod series;

pub use bar::PriceBar;
pub use series::{ForecastPoint, ForecastSeries, PredictionBand, PriceSeries, SeriesError};
