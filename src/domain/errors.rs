use crate::domain::ml::types::ModelKind;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single base forecaster.
///
/// Raised by the statistical and decomposition forecasters these are
/// degradable: the fallback controller substitutes the gradient-boosted-tree
/// value. Raised by the gradient-boosted-tree forecaster they are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BaseForecastError {
    #[error("Missing feature '{name}' in feature row")]
    MissingFeature { name: String },

    #[error("Feature row has {actual} values, model expects {expected}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Numerical instability: {reason}")]
    NumericalInstability { reason: String },

    #[error("Degenerate forecast horizon: {reason}")]
    DegenerateHorizon { reason: String },

    #[error("Horizon extension misaligned with fitted index: {reason}")]
    MisalignedHorizon { reason: String },

    #[error("Insufficient fitted state: {reason}")]
    InsufficientState { reason: String },

    #[error("Fitted parameters inconsistent: {reason}")]
    FitMismatch { reason: String },

    #[error("Model inference failed: {reason}")]
    Inference { reason: String },

    #[error("{model} forecaster timed out after {after_ms}ms")]
    Timeout { model: ModelKind, after_ms: u64 },

    #[error("{model} forecaster panicked: {reason}")]
    Panicked { model: ModelKind, reason: String },
}

impl BaseForecastError {
    /// Short label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            BaseForecastError::MissingFeature { .. } => "missing_feature",
            BaseForecastError::FeatureCountMismatch { .. } => "feature_count",
            BaseForecastError::NumericalInstability { .. } => "numerical",
            BaseForecastError::DegenerateHorizon { .. } => "degenerate_horizon",
            BaseForecastError::MisalignedHorizon { .. } => "misaligned_horizon",
            BaseForecastError::InsufficientState { .. } => "insufficient_state",
            BaseForecastError::FitMismatch { .. } => "fit_mismatch",
            BaseForecastError::Inference { .. } => "inference",
            BaseForecastError::Timeout { .. } => "timeout",
            BaseForecastError::Panicked { .. } => "panic",
        }
    }
}

/// Failure of the stacking combiner. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombinerError {
    #[error("Combiner inference failed: {reason}")]
    Inference { reason: String },

    #[error("Combiner produced a non-finite prediction: {value}")]
    NonFinite { value: f64 },
}

/// Failure of a series augmenter (indicator or pattern generator).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureGenerationError {
    #[error("Required column '{name}' not found in series")]
    MissingColumn { name: String },

    #[error("Column '{name}' has {actual} rows, series has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid indicator parameter: {reason}")]
    InvalidParameter { reason: String },
}

/// Errors surfaced to the caller of a forecast request.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Market data retrieval failed: {reason}")]
    DataSource { reason: String },

    #[error("Input series is empty")]
    EmptySeries,

    #[error("No complete feature row remains after dropping incomplete rows")]
    NoCompleteRow,

    #[error("Required feature '{name}' is absent from the augmented series")]
    MissingFeature { name: String },

    #[error("Feature '{name}' maps to more than one column")]
    DuplicateFeature { name: String },

    #[error("{stage} generator failed: {source}")]
    Generator {
        stage: String,
        #[source]
        source: FeatureGenerationError,
    },

    #[error("Gradient-boosted-tree forecast failed: {0}")]
    PrimaryForecast(#[source] BaseForecastError),

    #[error("Stacking combiner failed: {0}")]
    Combiner(#[from] CombinerError),
}

impl ForecastError {
    /// True for the fatal-precondition family: bad or missing input data.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ForecastError::DataSource { .. }
                | ForecastError::EmptySeries
                | ForecastError::NoCompleteRow
                | ForecastError::MissingFeature { .. }
                | ForecastError::DuplicateFeature { .. }
                | ForecastError::Generator { .. }
        )
    }

    /// Metrics label for the failed outcome.
    pub fn label(&self) -> &'static str {
        match self {
            ForecastError::PrimaryForecast(_) => "primary_failure",
            ForecastError::Combiner(_) => "combiner_failure",
            _ => "precondition",
        }
    }
}

/// Errors raised while loading model artifacts at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read model file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Feature schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    #[error("ONNX runtime error for {path:?}: {reason}")]
    Onnx { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_error_formatting() {
        let err = BaseForecastError::Timeout {
            model: ModelKind::Statistical,
            after_ms: 2000,
        };

        let msg = err.to_string();
        assert!(msg.contains("stat"));
        assert!(msg.contains("2000ms"));
        assert_eq!(err.label(), "timeout");
    }

    #[test]
    fn test_forecast_error_classification() {
        assert!(ForecastError::EmptySeries.is_precondition());
        assert!(
            ForecastError::MissingFeature {
                name: "RSI".to_string()
            }
            .is_precondition()
        );

        let primary = ForecastError::PrimaryForecast(BaseForecastError::MissingFeature {
            name: "RSI".to_string(),
        });
        assert!(!primary.is_precondition());
        assert_eq!(primary.label(), "primary_failure");

        let combiner: ForecastError = CombinerError::NonFinite { value: f64::NAN }.into();
        assert_eq!(combiner.label(), "combiner_failure");
    }
}
