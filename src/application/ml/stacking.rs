use super::predictor::StackingModel;
use crate::domain::errors::{CombinerError, ModelLoadError};
use crate::domain::ml::types::StackVector;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct LinearStackerFile {
    columns: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Linear meta-regressor: `intercept + Σ coefficient_i · x_i` over
/// (gbt, stat, decomp).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearStacker {
    coefficients: [f64; 3],
    intercept: f64,
}

impl LinearStacker {
    pub fn new(coefficients: [f64; 3], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Equal-weight average of the three base predictions.
    pub fn mean() -> Self {
        Self::new([1.0 / 3.0; 3], 0.0)
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stacker = Self::parse(&raw, path)?;
        info!("Loaded linear stacker from {:?}", path);
        Ok(stacker)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, ModelLoadError> {
        let file: LinearStackerFile =
            serde_json::from_str(raw).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if file.columns != StackVector::COLUMNS {
            return Err(ModelLoadError::SchemaMismatch {
                reason: format!(
                    "stacker columns {:?} differ from {:?}",
                    file.columns,
                    StackVector::COLUMNS
                ),
            });
        }

        let coefficients: [f64; 3] =
            file.coefficients
                .as_slice()
                .try_into()
                .map_err(|_| ModelLoadError::Invalid {
                    path: path.to_path_buf(),
                    reason: format!("expected 3 coefficients, got {}", file.coefficients.len()),
                })?;

        if coefficients.iter().any(|c| !c.is_finite()) || !file.intercept.is_finite() {
            return Err(ModelLoadError::Invalid {
                path: path.to_path_buf(),
                reason: "non-finite coefficient".to_string(),
            });
        }

        Ok(Self::new(coefficients, file.intercept))
    }

    pub fn coefficients(&self) -> [f64; 3] {
        self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl StackingModel for LinearStacker {
    fn combine(&self, input: &StackVector) -> Result<f64, CombinerError> {
        let value = self
            .coefficients
            .iter()
            .zip(input.as_array())
            .fold(self.intercept, |acc, (c, x)| acc + c * x);

        if !value.is_finite() {
            return Err(CombinerError::NonFinite { value });
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "Linear Stacker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<LinearStacker, ModelLoadError> {
        LinearStacker::parse(raw, Path::new("meta.json"))
    }

    #[test]
    fn test_mean_combiner() {
        let value = LinearStacker::mean()
            .combine(&StackVector::new(100.0, 100.0, 105.0))
            .unwrap();
        assert!((value - 101.666_666).abs() < 1e-4);
    }

    #[test]
    fn test_parse_and_combine() {
        let stacker = parse(
            r#"{"columns": ["gbt", "stat", "decomp"], "coefficients": [0.5, 0.25, 0.25], "intercept": 1.0}"#,
        )
        .unwrap();

        let value = stacker.combine(&StackVector::new(2.0, 4.0, 8.0)).unwrap();
        assert_eq!(value, 1.0 + 1.0 + 1.0 + 2.0);
    }

    #[test]
    fn test_column_order_is_enforced() {
        let err = parse(
            r#"{"columns": ["stat", "gbt", "decomp"], "coefficients": [0.5, 0.25, 0.25], "intercept": 0.0}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ModelLoadError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_wrong_coefficient_count() {
        let err = parse(r#"{"columns": ["gbt", "stat", "decomp"], "coefficients": [1.0], "intercept": 0.0}"#)
            .unwrap_err();
        assert!(matches!(err, ModelLoadError::Invalid { .. }));
    }

    #[test]
    fn test_non_finite_output_is_error() {
        let err = LinearStacker::mean()
            .combine(&StackVector::new(f64::INFINITY, 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, CombinerError::NonFinite { .. }));
    }
}
