//! ARIMA(p, d, 0) fit by conditional least squares.
//!
//! The series is differenced `d` times and an AR(p) model is fit to the result
//! with OLS on the normal equations. With `d >= 1` no constant term is fit (a
//! drift in an integrated model is opt-in elsewhere, and the dashboard never
//! opts in). Forecasts are produced on the differenced scale and integrated
//! back level by level.
//!
//! For a pure AR model, least squares conditioned on the first `p` values is
//! the conditional maximum-likelihood estimate under Gaussian errors. It is
//! not the exact state-space likelihood that statsmodels maximizes, so
//! coefficients and forecasts differ slightly from a statsmodels fit on the
//! same data, most visibly on short series.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ForecastError;

/// Reciprocal condition threshold below which `X'X` is treated as singular.
const MIN_RCOND: f64 = 1e-12;

/// Model order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Fewest observations accepted by [`ArimaFit::fit`]: `p + d + q + 10`.
    pub const fn minimum_observations(&self) -> usize {
        self.p + self.d + self.q + 10
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(5, 1, 0)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// A fitted model, holding the data it was fit on.
#[derive(Debug, Clone)]
pub struct ArimaFit {
    pub order: ArimaOrder,
    /// AR coefficients φ₁..φₚ on the differenced series.
    pub ar: Vec<f64>,
    /// Intercept. Always zero when `d >= 1`.
    pub constant: f64,
    /// Residual variance.
    pub sigma2: f64,
    pub aic: f64,
    pub bic: f64,
    /// Number of regression rows used in the fit.
    pub nobs: usize,
    /// Each differencing level, from the raw closes (`levels[0]`) to the
    /// `d`-times differenced series.
    levels: Vec<Vec<f64>>,
}

impl ArimaFit {
    /// Fit `order` to `data`.
    pub fn fit(data: &[f64], order: ArimaOrder) -> Result<Self, ForecastError> {
        if order.q != 0 {
            return Err(ForecastError::UnsupportedOrder(order));
        }
        let min = order.minimum_observations();
        if data.len() < min {
            return Err(ForecastError::InsufficientData {
                len: data.len(),
                min,
            });
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::NonFiniteInput { index });
        }
        if data.iter().all(|&v| v == data[0]) {
            return Err(ForecastError::ConstantSeries);
        }

        let mut levels = Vec::with_capacity(order.d + 1);
        levels.push(data.to_vec());
        for _ in 0..order.d {
            let next = difference(levels.last().map(Vec::as_slice).unwrap_or(&[]));
            levels.push(next);
        }
        let diffed = levels.last().map(Vec::as_slice).unwrap_or(&[]);

        let with_constant = order.d == 0;
        let (ar, constant, residuals) = estimate_ar(diffed, order.p, with_constant)?;

        let n = residuals.len() as f64;
        let sigma2 = residuals.iter().map(|r| r * r).sum::<f64>() / n;
        if !sigma2.is_finite() {
            return Err(ForecastError::NonFiniteForecast);
        }
        let k = (order.p + usize::from(with_constant) + 1) as f64;
        let log_likelihood = -0.5 * n * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n.ln();

        Ok(Self {
            order,
            ar,
            constant,
            sigma2,
            aic,
            bic,
            nobs: residuals.len(),
            levels,
        })
    }

    /// Point forecasts `1..=horizon` steps past the end of the data.
    pub fn predict(&self, horizon: usize) -> Vec<f64> {
        let p = self.order.p;
        let mut extended = self
            .levels
            .last()
            .cloned()
            .unwrap_or_default();
        let mut steps = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let n = extended.len();
            let mut next = self.constant;
            for (i, phi) in self.ar.iter().enumerate().take(p) {
                next += phi * extended[n - 1 - i];
            }
            extended.push(next);
            steps.push(next);
        }

        // Undo each differencing, innermost first.
        for level in self.levels.iter().rev().skip(1) {
            let start = level.last().copied().unwrap_or(0.0);
            steps = integrate(&steps, start);
        }
        steps
    }

    /// Psi weights ψ₀..ψ_{horizon-1} of the integrated AR polynomial
    /// `(1 - Σ φᵢBⁱ)(1 - B)^d`.
    pub fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let mut poly = Vec::with_capacity(self.ar.len() + 1);
        poly.push(1.0);
        poly.extend(self.ar.iter().map(|phi| -phi));
        for _ in 0..self.order.d {
            poly = multiply(&poly, &[1.0, -1.0]);
        }
        let a: Vec<f64> = poly.iter().skip(1).map(|c| -c).collect();

        let mut psi = Vec::with_capacity(horizon);
        for j in 0..horizon {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let value = (1..=j.min(a.len()))
                .map(|i| a[i - 1] * psi[j - i])
                .sum::<f64>();
            psi.push(value);
        }
        psi
    }

    /// Forecast standard errors for steps `1..=horizon`.
    pub fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        let mut acc = 0.0;
        self.psi_weights(horizon)
            .into_iter()
            .map(|w| {
                acc += w * w;
                (self.sigma2 * acc).sqrt()
            })
            .collect()
    }

    /// Short multi-line description of the fit.
    pub fn summary(&self) -> String {
        let mut s = format!("{} fit on {} rows\n", self.order, self.nobs);
        for (i, phi) in self.ar.iter().enumerate() {
            s.push_str(&format!("  phi{} = {:+.6}\n", i + 1, phi));
        }
        if self.order.d == 0 {
            s.push_str(&format!("  const = {:+.6}\n", self.constant));
        }
        s.push_str(&format!("  sigma2 = {:.6}\n", self.sigma2));
        s.push_str(&format!("  AIC = {:.2}  BIC = {:.2}\n", self.aic, self.bic));
        s
    }
}

/// First difference of a series.
pub fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Cumulative sum starting from `start` (inverse of [`difference`]).
pub fn integrate(diff: &[f64], start: f64) -> Vec<f64> {
    let mut acc = start;
    diff.iter()
        .map(|d| {
            acc += d;
            acc
        })
        .collect()
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// OLS AR(p): returns (coefficients, constant, residuals).
fn estimate_ar(
    data: &[f64],
    p: usize,
    with_constant: bool,
) -> Result<(Vec<f64>, f64, Vec<f64>), ForecastError> {
    let n = data.len();
    let cols = p + usize::from(with_constant);
    if cols == 0 || n <= p + cols {
        return Err(ForecastError::SingularDesign);
    }
    let rows = n - p;

    let mut x_data = Vec::with_capacity(rows * cols);
    for t in p..n {
        if with_constant {
            x_data.push(1.0);
        }
        for i in 1..=p {
            x_data.push(data[t - i]);
        }
    }
    let x = DMatrix::from_row_slice(rows, cols, &x_data);
    let y = DVector::from_column_slice(&data[p..]);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;

    let sv = xtx.singular_values();
    let max_sv = sv.max();
    if max_sv <= 0.0 || sv.min() / max_sv < MIN_RCOND {
        return Err(ForecastError::SingularDesign);
    }
    let xtx_inv = xtx.try_inverse().ok_or(ForecastError::SingularDesign)?;
    let beta = xtx_inv * xty;
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(ForecastError::SingularDesign);
    }

    let residuals: Vec<f64> = (&y - &x * &beta).iter().copied().collect();
    let (constant, ar) = if with_constant {
        (beta[0], beta.iter().skip(1).copied().collect())
    } else {
        (0.0, beta.iter().copied().collect())
    };
    Ok((ar, constant, residuals))
}
