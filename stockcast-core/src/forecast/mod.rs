//! Forecast engine: ARIMA fit on closing prices, one point per calendar day.
//!
//! Any failure to produce a forecast surfaces as a [`ForecastError`]. Callers
//! treat every variant the same way (the forecast overlay is omitted), the
//! variants exist for logging and diagnostics.

pub mod arima;

pub use arima::{ArimaFit, ArimaOrder};

use thiserror::Error;
use tracing::{debug, warn};

use crate::align::forecast_timestamps;
use crate::domain::{ForecastPoint, ForecastSeries, PredictionBand, PriceSeries};

/// Why no forecast could be produced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ForecastError {
    #[error("insufficient data: {len} observations, need at least {min}")]
    InsufficientData { len: usize, min: usize },

    #[error("non-finite close at index {index}")]
    NonFiniteInput { index: usize },

    #[error("series is constant")]
    ConstantSeries,

    #[error("design matrix is singular")]
    SingularDesign,

    #[error("fit produced non-finite forecast values")]
    NonFiniteForecast,

    #[error("{0} is not supported (moving-average terms must be zero)")]
    UnsupportedOrder(ArimaOrder),

    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
}

/// Fits a fixed-order model and projects it forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastEngine {
    pub order: ArimaOrder,
    /// Coverage of the prediction bands; `None` skips them.
    pub confidence: Option<f64>,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            confidence: Some(0.95),
        }
    }
}

impl ForecastEngine {
    pub fn new(order: ArimaOrder) -> Self {
        Self {
            order,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Fit on `series` closes and forecast `horizon` calendar days.
    ///
    /// Deterministic: the same series always yields the same output.
    pub fn forecast(
        &self,
        series: &PriceSeries,
        horizon: usize,
    ) -> Result<ForecastSeries, ForecastError> {
        let result = self.run(series, horizon);
        if let Err(e) = &result {
            warn!(order = %self.order, len = series.len(), error = %e, "forecast unavailable");
        }
        result
    }

    fn run(&self, series: &PriceSeries, horizon: usize) -> Result<ForecastSeries, ForecastError> {
        let z = match self.confidence {
            Some(c) if c > 0.0 && c < 1.0 => Some(normal_quantile(0.5 + c / 2.0)),
            Some(c) => return Err(ForecastError::InvalidConfidence(c)),
            None => None,
        };

        let closes = series.closes();
        let fit = ArimaFit::fit(&closes, self.order)?;
        let values = fit.predict(horizon);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NonFiniteForecast);
        }
        debug!(order = %self.order, nobs = fit.nobs, sigma2 = fit.sigma2, "model fit");

        let Some(last) = series.last_timestamp() else {
            return Err(ForecastError::InsufficientData {
                len: 0,
                min: self.order.minimum_observations(),
            });
        };
        let errors = z.map(|_| fit.standard_errors(horizon));

        let points = forecast_timestamps(last, horizon)
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(i, (timestamp, predicted_close))| {
                let band = match (z, errors.as_ref()) {
                    (Some(z), Some(se)) => Some(PredictionBand {
                        lower: predicted_close - z * se[i],
                        upper: predicted_close + z * se[i],
                    }),
                    _ => None,
                };
                ForecastPoint {
                    timestamp,
                    predicted_close,
                    band,
                }
            })
            .collect();

        Ok(ForecastSeries {
            points,
            confidence: z.and(self.confidence),
        })
    }
}

/// ARIMA(5,1,0) forecast with 95% bands.
pub fn forecast(series: &PriceSeries, horizon: usize) -> Result<ForecastSeries, ForecastError> {
    ForecastEngine::default().forecast(series, horizon)
}

/// Inverse standard normal CDF (Acklam's rational approximation).
///
/// Relative error below 1.2e-9 over the open unit interval.
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::{Duration, NaiveDate};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn walk(n: usize, seed: u64) -> PriceSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut close = 150.0;
        let bars = (0..n)
            .map(|i| {
                close += rng.gen_range(-2.0..2.0);
                PriceBar {
                    timestamp: start + Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000,
                }
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    #[test]
    fn quantile_matches_known_values() {
        assert!((normal_quantile(0.975) - 1.959_963_985).abs() < 1e-6);
        assert!((normal_quantile(0.5)).abs() < 1e-12);
        assert!((normal_quantile(0.005) + 2.575_829_304).abs() < 1e-6);
    }

    #[test]
    fn thirty_points_with_bands() {
        let series = walk(250, 3);
        let out = forecast(&series, 30).unwrap();
        assert_eq!(out.len(), 30);
        assert_eq!(out.confidence, Some(0.95));
        for p in &out.points {
            let band = p.band.unwrap();
            assert!(band.lower <= p.predicted_close && p.predicted_close <= band.upper);
        }
    }

    #[test]
    fn first_point_is_day_after_last() {
        let series = walk(40, 5);
        let out = forecast(&series, 30).unwrap();
        let last = series.last_timestamp().unwrap();
        assert_eq!(out.points[0].timestamp, last + Duration::days(1));
    }

    #[test]
    fn deterministic() {
        let series = walk(120, 9);
        assert_eq!(forecast(&series, 30).unwrap(), forecast(&series, 30).unwrap());
    }

    #[test]
    fn no_bands_without_confidence() {
        let series = walk(80, 11);
        let out = ForecastEngine::new(ArimaOrder::default())
            .forecast(&series, 5)
            .unwrap();
        assert!(out.points.iter().all(|p| p.band.is_none()));
        assert_eq!(out.confidence, None);
    }

    #[test]
    fn empty_series_is_unavailable() {
        let err = forecast(&PriceSeries::empty(), 30).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { len: 0, min: 16 });
    }

    #[test]
    fn fifteen_points_is_unavailable() {
        let err = forecast(&walk(15, 1), 30).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { len: 15, .. }));
    }

    #[test]
    fn bad_confidence_is_rejected() {
        let err = ForecastEngine::default()
            .with_confidence(1.5)
            .forecast(&walk(50, 2), 3)
            .unwrap_err();
        assert_eq!(err, ForecastError::InvalidConfidence(1.5));
    }
}
