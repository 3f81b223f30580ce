//! Yahoo Finance data provider.
//!
//! History comes from the v8 chart API (`range` + `interval` query), the
//! fundamentals snapshot from the v10 quoteSummary API. quoteSummary needs a
//! session cookie and a crumb token; both are fetched lazily and the crumb is
//! refreshed once on a 401.
//!
//! Timestamps are converted to the exchange's local wall-clock time. Daily
//! bars are normalized to local midnight.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{PriceBar, PriceSeries};
use crate::fundamentals::Snapshot;
use crate::period::{Interval, Period};

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// quoteSummary modules requested for a snapshot. Earlier modules win when
/// two carry the same key.
pub const SUMMARY_MODULES: [&str; 5] = [
    "price",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "assetProfile",
];

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<serde_json::Map<String, Value>>>,
    error: Option<ApiError>,
}

/// HTTP behaviour of the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YahooSettings {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    settings: YahooSettings,
    crumb: Mutex<Option<String>>,
}

impl YahooProvider {
    pub fn new(
        circuit_breaker: Arc<CircuitBreaker>,
        settings: YahooSettings,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            settings,
            crumb: Mutex::new(None),
        })
    }

    /// Chart API URL for a symbol, range, and interval.
    pub fn chart_url(symbol: &str, period: Period, interval: Interval) -> String {
        format!(
            "{CHART_BASE}/{symbol}?range={}&interval={}&includePrePost=false&events=div%2Csplits",
            period.as_range(),
            interval.as_query()
        )
    }

    pub fn summary_url(symbol: &str, crumb: &str) -> String {
        format!(
            "{SUMMARY_BASE}/{symbol}?modules={}&crumb={crumb}",
            SUMMARY_MODULES.join("%2C")
        )
    }

    fn crumb(&self, refresh: bool) -> Result<String, DataError> {
        let mut slot = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        if !refresh {
            if let Some(c) = slot.as_ref() {
                return Ok(c.clone());
            }
        }

        // Sets the session cookie; the status of this response is irrelevant.
        let _ = self.client.get(COOKIE_URL).send();

        let resp = self
            .client
            .get(CRUMB_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            return Err(DataError::AuthenticationRequired(format!(
                "crumb request returned HTTP {status}"
            )));
        }
        let crumb = resp
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(format!("crumb body: {e}")))?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(DataError::AuthenticationRequired("empty crumb".into()));
        }
        debug!("obtained Yahoo crumb");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    /// GET `url` with retry, backoff, and circuit breaker logic.
    fn get_with_retry(&self, symbol: &str, url: &str) -> Result<reqwest::blocking::Response, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = self.settings.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(symbol, retry_after, "rate limited");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(format!(
                            "Yahoo Finance rejected the request for {symbol}"
                        )));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    self.circuit_breaker.record_success();
                    return Ok(resp);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn fetch_summary(&self, symbol: &str) -> Result<Snapshot, DataError> {
        let mut crumb = self.crumb(false)?;
        for refreshed in [false, true] {
            let url = Self::summary_url(symbol, &crumb);
            match self.get_with_retry(symbol, &url) {
                Ok(resp) => {
                    let body: SummaryResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse quoteSummary for {symbol}: {e}"
                        ))
                    })?;
                    return parse_summary(symbol, body);
                }
                Err(DataError::AuthenticationRequired(_)) if !refreshed => {
                    debug!(symbol, "crumb rejected, refreshing");
                    crumb = self.crumb(true)?;
                }
                Err(e) => return Err(e),
            }
        }
        Err(DataError::AuthenticationRequired(
            "crumb refresh did not help".into(),
        ))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<PriceSeries, DataError> {
        let url = Self::chart_url(symbol, period, interval);
        debug!(symbol, %period, %interval, "fetching chart");
        let resp = self.get_with_retry(symbol, &url)?;
        let body: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;
        let series = parse_chart(symbol, body, interval)?;
        debug!(symbol, bars = series.len(), "chart parsed");
        Ok(series)
    }

    fn snapshot(&self, symbol: &str) -> Result<Snapshot, DataError> {
        self.fetch_summary(symbol)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Parse a chart response body.
pub fn parse_chart_json(
    symbol: &str,
    body: &str,
    interval: Interval,
) -> Result<PriceSeries, DataError> {
    let resp: ChartResponse = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("chart JSON: {e}")))?;
    parse_chart(symbol, resp, interval)
}

fn parse_chart(symbol: &str, resp: ChartResponse, interval: Interval) -> Result<PriceSeries, DataError> {
    let result = resp.chart.result.ok_or_else(|| api_error(symbol, resp.chart.error))?;

    let Some(data) = result.into_iter().next() else {
        return Ok(PriceSeries::empty());
    };

    let tz: Tz = data
        .meta
        .and_then(|m| m.exchange_timezone_name)
        .and_then(|name| name.parse().ok())
        .unwrap_or(Tz::UTC);

    // A symbol with no trades in the range comes back without timestamps.
    let Some(timestamps) = data.timestamp else {
        return Ok(PriceSeries::empty());
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        // Holidays and halted intervals come back all-null.
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }

        bars.push(PriceBar {
            timestamp: local_timestamp(ts, tz, interval)?,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: volume.unwrap_or(0),
        });
    }

    Ok(PriceSeries::from_unsorted(bars))
}

fn local_timestamp(ts: i64, tz: Tz, interval: Interval) -> Result<NaiveDateTime, DataError> {
    let utc = DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
    let local = utc.with_timezone(&tz).naive_local();
    if interval.is_intraday() {
        Ok(local)
    } else {
        Ok(local.date().and_time(chrono::NaiveTime::MIN))
    }
}

fn api_error(symbol: &str, err: Option<ApiError>) -> DataError {
    match err {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    }
}

/// Parse a quoteSummary response body.
pub fn parse_summary_json(symbol: &str, body: &str) -> Result<Snapshot, DataError> {
    let resp: SummaryResponse = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("quoteSummary JSON: {e}")))?;
    parse_summary(symbol, resp)
}

fn parse_summary(symbol: &str, resp: SummaryResponse) -> Result<Snapshot, DataError> {
    let result = resp
        .quote_summary
        .result
        .ok_or_else(|| api_error(symbol, resp.quote_summary.error))?;
    let Some(modules) = result.into_iter().next() else {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    };

    let mut snapshot = Snapshot::new();
    for module in SUMMARY_MODULES {
        let Some(Value::Object(fields)) = modules.get(module) else {
            continue;
        };
        for (key, value) in fields {
            match value {
                Value::Number(n) => {
                    if let Some(v) = n.as_f64() {
                        snapshot.insert_if_absent(key.as_str(), v);
                    }
                }
                Value::String(s) if !s.is_empty() => snapshot.insert_if_absent(key.as_str(), s.as_str()),
                Value::Bool(b) => snapshot.insert_if_absent(key.as_str(), *b),
                // `{"raw": 1.2, "fmt": "1.20"}`; `{}` means missing.
                Value::Object(inner) => {
                    if let Some(raw) = inner.get("raw").and_then(Value::as_f64) {
                        snapshot.insert_if_absent(key.as_str(), raw);
                    }
                }
                _ => {}
            }
        }
    }
    Ok(snapshot)
}
