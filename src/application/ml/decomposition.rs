//! Additive trend + seasonality forecaster.
//!
//! The fitted model is a piecewise-linear trend with rate changes at fixed
//! changepoints plus Fourier-series seasonal terms, all in scaled units:
//! `t = (ts - t_start) / t_scale` for the trend, days since the unix epoch
//! for the seasonal terms, and `y / y_scale` for the target.

use super::predictor::BaseForecaster;
use crate::domain::errors::{BaseForecastError, ModelLoadError};
use crate::domain::ml::types::ModelKind;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;
use tracing::info;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn default_frequency() -> i64 {
    86_400
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// One Fourier seasonal component, coefficients ordered `[sin1, cos1, sin2, cos2, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
    pub coefficients: Vec<f64>,
}

impl Seasonality {
    fn value_at(&self, days: f64) -> f64 {
        (1..=self.fourier_order)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 * days / self.period_days;
                self.coefficients[2 * (i - 1)] * angle.sin()
                    + self.coefficients[2 * (i - 1) + 1] * angle.cos()
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionState {
    /// Fitted timestamps (unix seconds), strictly increasing
    pub time_index: Vec<i64>,
    #[serde(default = "default_frequency")]
    pub frequency_secs: i64,
    pub t_start: i64,
    pub t_scale: f64,
    pub y_scale: f64,
    /// Base growth rate
    pub k: f64,
    /// Base offset
    pub m: f64,
    /// Changepoint locations in scaled time
    #[serde(default)]
    pub changepoints: Vec<f64>,
    /// Rate adjustments, one per changepoint
    #[serde(default)]
    pub deltas: Vec<f64>,
    #[serde(default)]
    pub seasonalities: Vec<Seasonality>,
}

impl DecompositionState {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let state: DecompositionState =
            serde_json::from_str(&raw).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            "Loaded decomposition state from {:?} ({} points, {} seasonalities)",
            path,
            state.time_index.len(),
            state.seasonalities.len()
        );
        Ok(state)
    }

    fn validate(&self) -> Result<(), BaseForecastError> {
        if self.time_index.is_empty() {
            return Err(BaseForecastError::MisalignedHorizon {
                reason: "empty fitted time index".to_string(),
            });
        }
        if self.time_index.windows(2).any(|w| w[1] <= w[0]) {
            return Err(BaseForecastError::MisalignedHorizon {
                reason: "fitted time index is not strictly increasing".to_string(),
            });
        }
        if self.frequency_secs <= 0 {
            return Err(BaseForecastError::DegenerateHorizon {
                reason: format!("frequency of {}s", self.frequency_secs),
            });
        }
        if self.changepoints.len() != self.deltas.len() {
            return Err(BaseForecastError::FitMismatch {
                reason: format!(
                    "{} changepoints with {} deltas",
                    self.changepoints.len(),
                    self.deltas.len()
                ),
            });
        }
        for seasonality in &self.seasonalities {
            if seasonality.coefficients.len() != 2 * seasonality.fourier_order {
                return Err(BaseForecastError::FitMismatch {
                    reason: format!(
                        "seasonality '{}' of order {} has {} coefficients",
                        seasonality.name,
                        seasonality.fourier_order,
                        seasonality.coefficients.len()
                    ),
                });
            }
            if !is_positive(seasonality.period_days) {
                return Err(BaseForecastError::NumericalInstability {
                    reason: format!("seasonality '{}' has non-positive period", seasonality.name),
                });
            }
        }
        if !is_positive(self.t_scale) || !is_positive(self.y_scale) {
            return Err(BaseForecastError::NumericalInstability {
                reason: format!("scales t={} y={}", self.t_scale, self.y_scale),
            });
        }
        Ok(())
    }

    fn trend_at(&self, t: f64) -> f64 {
        let (rate, offset) = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .filter(|(cp, _)| **cp <= t)
            .fold((self.k, self.m), |(rate, offset), (cp, delta)| {
                (rate + delta, offset - cp * delta)
            });
        rate * t + offset
    }

    fn value_at(&self, ts: i64) -> Result<f64, BaseForecastError> {
        let elapsed = ts.checked_sub(self.t_start).ok_or_else(|| {
            BaseForecastError::MisalignedHorizon {
                reason: format!("timestamp {} overflows against t_start {}", ts, self.t_start),
            }
        })?;
        let t = elapsed as f64 / self.t_scale;
        let days = ts as f64 / SECONDS_PER_DAY;
        let seasonal: f64 = self.seasonalities.iter().map(|s| s.value_at(days)).sum();
        Ok((self.trend_at(t) + seasonal) * self.y_scale)
    }
}

pub struct DecompositionForecaster {
    state: DecompositionState,
}

impl DecompositionForecaster {
    pub fn new(state: DecompositionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &DecompositionState {
        &self.state
    }

    /// Fitted index extended by `periods` steps of the model frequency.
    pub fn future_index(&self, periods: usize) -> Result<Vec<i64>, BaseForecastError> {
        self.state.validate()?;
        let mut index = self.state.time_index.clone();
        let mut last = index.last().copied().unwrap_or(self.state.t_start);
        for _ in 0..periods {
            last = last.checked_add(self.state.frequency_secs).ok_or_else(|| {
                BaseForecastError::MisalignedHorizon {
                    reason: "timestamp overflow extending index".to_string(),
                }
            })?;
            index.push(last);
        }
        Ok(index)
    }

    /// Predictions over the extended horizon, one per index entry.
    pub fn forecast(&self, periods: usize) -> Result<Vec<(i64, f64)>, BaseForecastError> {
        let index = self.future_index(periods)?;
        index
            .into_iter()
            .map(|ts| {
                let value = self.state.value_at(ts)?;
                if value.is_finite() {
                    Ok((ts, value))
                } else {
                    Err(BaseForecastError::NumericalInstability {
                        reason: format!("decomposition produced {} at {}", value, ts),
                    })
                }
            })
            .collect()
    }
}

impl BaseForecaster for DecompositionForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Decomposition
    }

    fn predict_next(&self) -> Result<f64, BaseForecastError> {
        let horizon = self.forecast(1)?;
        horizon
            .last()
            .map(|(_, value)| *value)
            .ok_or_else(|| BaseForecastError::DegenerateHorizon {
                reason: "empty forecast horizon".to_string(),
            })
    }

    fn name(&self) -> &str {
        "Additive Decomposition"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    fn linear_state() -> DecompositionState {
        DecompositionState {
            time_index: vec![0, DAY, 2 * DAY],
            frequency_secs: DAY,
            t_start: 0,
            t_scale: (2 * DAY) as f64,
            y_scale: 10.0,
            k: 1.0,
            m: 0.5,
            changepoints: vec![],
            deltas: vec![],
            seasonalities: vec![],
        }
    }

    #[test]
    fn test_linear_trend_extends_one_period() {
        let forecaster = DecompositionForecaster::new(linear_state());

        // t = 3 days / 2 days = 1.5 -> (1.0 * 1.5 + 0.5) * 10
        let value = forecaster.predict_next().unwrap();
        assert!((value - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_forecast_covers_history_and_next_step() {
        let forecaster = DecompositionForecaster::new(linear_state());
        let horizon = forecaster.forecast(1).unwrap();

        assert_eq!(horizon.len(), 4);
        assert_eq!(horizon.last().unwrap().0, 3 * DAY);
        assert!((horizon[0].1 - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_changepoint_bends_trend() {
        let mut state = linear_state();
        state.changepoints = vec![1.0];
        state.deltas = vec![-1.0];
        let forecaster = DecompositionForecaster::new(state);

        // Past t=1 the rate is 0 and the trend stays continuous at 1.5
        let value = forecaster.predict_next().unwrap();
        assert!((value - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_seasonality_adds_sine() {
        let mut state = linear_state();
        state.k = 0.0;
        state.m = 0.0;
        state.seasonalities = vec![Seasonality {
            name: "cycle".to_string(),
            period_days: 12.0,
            fourier_order: 1,
            coefficients: vec![1.0, 0.0],
        }];
        let forecaster = DecompositionForecaster::new(state);

        // Day 3 of a 12-day cycle is a quarter period: sin = 1
        let value = forecaster.predict_next().unwrap();
        assert!((value - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_increasing_index_is_misaligned() {
        let mut state = linear_state();
        state.time_index = vec![DAY, DAY];
        let forecaster = DecompositionForecaster::new(state);
        assert!(matches!(
            forecaster.predict_next(),
            Err(BaseForecastError::MisalignedHorizon { .. })
        ));
    }

    #[test]
    fn test_empty_index_is_misaligned() {
        let mut state = linear_state();
        state.time_index.clear();
        let forecaster = DecompositionForecaster::new(state);
        assert!(matches!(
            forecaster.predict_next(),
            Err(BaseForecastError::MisalignedHorizon { .. })
        ));
    }

    #[test]
    fn test_zero_frequency_is_degenerate() {
        let mut state = linear_state();
        state.frequency_secs = 0;
        let forecaster = DecompositionForecaster::new(state);
        assert!(matches!(
            forecaster.predict_next(),
            Err(BaseForecastError::DegenerateHorizon { .. })
        ));
    }

    #[test]
    fn test_coefficient_length_mismatch() {
        let mut state = linear_state();
        state.seasonalities = vec![Seasonality {
            name: "yearly".to_string(),
            period_days: 365.25,
            fourier_order: 2,
            coefficients: vec![0.1, 0.2, 0.3],
        }];
        let forecaster = DecompositionForecaster::new(state);
        assert!(matches!(
            forecaster.predict_next(),
            Err(BaseForecastError::FitMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_scale_is_unstable() {
        let mut state = linear_state();
        state.y_scale = 0.0;
        let forecaster = DecompositionForecaster::new(state);
        assert!(matches!(
            forecaster.predict_next(),
            Err(BaseForecastError::NumericalInstability { .. })
        ));
    }

    #[test]
    fn test_extreme_t_start_is_misaligned() {
        let mut state = linear_state();
        state.t_start = i64::MIN;
        let forecaster = DecompositionForecaster::new(state);
        assert!(matches!(
            forecaster.predict_next(),
            Err(BaseForecastError::MisalignedHorizon { .. })
        ));
    }
}
