//! Deterministic offline provider.
//!
//! Prices are a seeded random walk: the seed is the BLAKE3 hash of the symbol,
//! so a symbol always produces the same bars for the same `as_of` date.
//! Weekends are skipped; intraday sessions run 09:30 to 16:00 in 5-minute bars.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{PriceBar, PriceSeries};
use crate::fundamentals::Snapshot;
use crate::period::{Interval, Period};

const SESSION_BARS: u32 = 78;

/// Synthetic provider anchored at a fixed "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticProvider {
    as_of: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    /// Anchored at the local calendar date.
    pub fn today() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    fn trading_days(&self, period: Period) -> Vec<NaiveDate> {
        let end = self.as_of;
        let lookback = |months: u32| end.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN);
        let (start, keep_last) = match period {
            Period::OneDay => (end - Duration::days(7), Some(1)),
            Period::FiveDays => (end - Duration::days(14), Some(5)),
            Period::OneMonth => (lookback(1), None),
            Period::SixMonths => (lookback(6), None),
            Period::Max => (lookback(120), None),
        };

        let mut days: Vec<NaiveDate> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();
        if let Some(n) = keep_last {
            let skip = days.len().saturating_sub(n);
            days.drain(..skip);
        }
        days
    }
}

fn rng_for(key: &str) -> StdRng {
    StdRng::from_seed(*blake3::hash(key.as_bytes()).as_bytes())
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries, DataError> {
        let mut rng = rng_for(symbol);
        let mut price = 20.0 + rng.gen_range(0.0..280.0_f64);
        let open_time = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN);

        let mut bars = Vec::new();
        for day in self.trading_days(period) {
            let (steps, spread) = if interval.is_intraday() {
                (SESSION_BARS, 0.003)
            } else {
                (1, 0.03)
            };
            for k in 0..steps {
                let timestamp = if interval.is_intraday() {
                    day.and_time(open_time) + Duration::minutes(5 * i64::from(k))
                } else {
                    day.and_time(NaiveTime::MIN)
                };
                let change: f64 = rng.gen_range(-spread..spread);
                let open = price;
                let close = price * (1.0 + change);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..spread / 3.0));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..spread / 3.0));
                let volume = rng.gen_range(500_000..5_000_000u64) / u64::from(steps);
                bars.push(PriceBar {
                    timestamp,
                    open,
                    high,
                    low,
                    close,
                    volume,
                });
                price = close;
            }
        }

        PriceSeries::new(bars).map_err(|e| DataError::Other(e.to_string()))
    }

    fn snapshot(&self, symbol: &str) -> Result<Snapshot, DataError> {
        let mut rng = rng_for(&format!("{symbol}/snapshot"));
        let price = ((20.0 + rng.gen_range(0.0..280.0_f64)) * 100.0).round() / 100.0;
        let shares = rng.gen_range(1.0e8..1.5e10_f64).round();

        let mut s = Snapshot::new();
        s.insert("longName", format!("{symbol} Holdings (synthetic)"));
        s.insert("sector", "Synthetic");
        s.insert("industry", "Simulated Equities");
        s.insert("country", "Nowhere");
        s.insert("currentPrice", price);
        s.insert("marketCap", (price * shares).round());
        s.insert("fiftyTwoWeekHigh", (price * 1.25 * 100.0).round() / 100.0);
        s.insert("fiftyTwoWeekLow", (price * 0.7 * 100.0).round() / 100.0);
        s.insert("trailingPE", (rng.gen_range(8.0..45.0_f64) * 100.0).round() / 100.0);
        s.insert("priceToBook", (rng.gen_range(0.8..20.0_f64) * 100.0).round() / 100.0);
        // Roughly a third of synthetic names pay no dividend.
        if rng.gen_bool(0.66) {
            let yield_pct = (rng.gen_range(0.2..4.0_f64) * 100.0).round() / 10_000.0;
            s.insert("dividendYield", yield_pct);
            s.insert("dividendRate", (price * yield_pct * 100.0).round() / 100.0);
        }
        let revenue = (price * shares * rng.gen_range(0.05..0.5)).round();
        s.insert("totalRevenue", revenue);
        s.insert("grossProfits", (revenue * rng.gen_range(0.2..0.7)).round());
        s.insert("freeCashflow", (revenue * rng.gen_range(-0.05..0.3)).round());
        s.insert("recommendationMean", (rng.gen_range(1.0..5.0_f64) * 10.0).round() / 10.0);
        Ok(s)
    }
}
