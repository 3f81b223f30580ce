//! Custom widgets rendered straight into a `Buffer`.

pub mod bar_list;
pub mod candle_chart;
pub mod price_chart;

pub use bar_list::BarList;
pub use candle_chart::CandleChart;
pub use price_chart::PriceChart;
