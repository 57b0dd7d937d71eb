//! Classical ARIMA(p, d, q) forecaster evaluated from its fitted state.
//!
//! The fitted state carries everything a one-step forecast needs: AR and MA
//! coefficients, the constant of the differenced process, the tail of the
//! original series (for differencing and integration) and the tail of the
//! in-sample residuals (for the MA terms).

use super::predictor::BaseForecaster;
use crate::domain::errors::{BaseForecastError, ModelLoadError};
use crate::domain::ml::types::ModelKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Fitted ARIMA parameters, as exported by the training job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaState {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// AR coefficients, lag 1 first
    pub ar: Vec<f64>,
    /// MA coefficients, lag 1 first
    pub ma: Vec<f64>,
    #[serde(default)]
    pub constant: f64,
    /// Most recent observations of the original series, oldest first
    pub history: Vec<f64>,
    /// Most recent in-sample residuals, oldest first
    #[serde(default)]
    pub residuals: Vec<f64>,
}

impl ArimaState {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let state: ArimaState =
            serde_json::from_str(&raw).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            "Loaded ARIMA({}, {}, {}) state from {:?} ({} history points)",
            state.p,
            state.d,
            state.q,
            path,
            state.history.len()
        );
        Ok(state)
    }

    /// History points needed to difference `d` times and still feed `p` AR lags.
    fn required_history(&self) -> usize {
        (self.p + self.d).max(self.d + 1)
    }

    fn validate(&self) -> Result<(), BaseForecastError> {
        if self.ar.len() != self.p || self.ma.len() != self.q {
            return Err(BaseForecastError::FitMismatch {
                reason: format!(
                    "order ({}, {}, {}) with {} AR and {} MA coefficients",
                    self.p,
                    self.d,
                    self.q,
                    self.ar.len(),
                    self.ma.len()
                ),
            });
        }
        if self.history.len() < self.required_history() {
            return Err(BaseForecastError::InsufficientState {
                reason: format!(
                    "{} history points, need {}",
                    self.history.len(),
                    self.required_history()
                ),
            });
        }
        if self.residuals.len() < self.q {
            return Err(BaseForecastError::InsufficientState {
                reason: format!("{} residuals, need {}", self.residuals.len(), self.q),
            });
        }

        let non_finite = self
            .ar
            .iter()
            .chain(&self.ma)
            .chain(&self.history)
            .chain(&self.residuals)
            .chain(std::iter::once(&self.constant))
            .any(|v| !v.is_finite());
        if non_finite {
            return Err(BaseForecastError::NumericalInstability {
                reason: "fitted state contains non-finite values".to_string(),
            });
        }
        Ok(())
    }
}

/// Successive differences: `levels[k]` is the series differenced `k` times.
fn difference_levels(data: &[f64], order: usize) -> Vec<Vec<f64>> {
    let mut levels = vec![data.to_vec()];
    for k in 0..order {
        let next: Vec<f64> = levels[k].windows(2).map(|w| w[1] - w[0]).collect();
        levels.push(next);
    }
    levels
}

pub struct StatisticalForecaster {
    state: ArimaState,
}

impl StatisticalForecaster {
    pub fn new(state: ArimaState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ArimaState {
        &self.state
    }

    /// Forecast `steps` values past the end of the stored history.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, BaseForecastError> {
        if steps == 0 {
            return Err(BaseForecastError::DegenerateHorizon {
                reason: "zero-step horizon".to_string(),
            });
        }
        self.state.validate()?;

        let state = &self.state;
        let mut levels = difference_levels(&state.history, state.d);
        let mut residuals = state.residuals.clone();
        let mut forecasts = Vec::with_capacity(steps);

        for _ in 0..steps {
            let stationary = &levels[state.d];

            let ar_term: f64 = state
                .ar
                .iter()
                .enumerate()
                .map(|(lag, coeff)| coeff * stationary[stationary.len() - lag - 1])
                .sum();
            let ma_term: f64 = state
                .ma
                .iter()
                .enumerate()
                .map(|(lag, coeff)| coeff * residuals[residuals.len() - lag - 1])
                .sum();
            let mut next = state.constant + ar_term + ma_term;

            // Integrate back one level at a time
            levels[state.d].push(next);
            for k in (0..state.d).rev() {
                let last = levels[k].last().copied().unwrap_or_default();
                next += last;
                levels[k].push(next);
            }

            if !next.is_finite() {
                return Err(BaseForecastError::NumericalInstability {
                    reason: format!("ARIMA forecast produced {}", next),
                });
            }
            forecasts.push(next);
            // Future shocks have zero expectation
            residuals.push(0.0);
        }

        Ok(forecasts)
    }
}

impl BaseForecaster for StatisticalForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Statistical
    }

    fn predict_next(&self) -> Result<f64, BaseForecastError> {
        let forecasts = self.forecast(1)?;
        forecasts
            .first()
            .copied()
            .ok_or_else(|| BaseForecastError::DegenerateHorizon {
                reason: "empty forecast".to_string(),
            })
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
