use crate::domain::errors::{BaseForecastError, CombinerError};
use crate::domain::ml::types::{ModelKind, StackVector};

/// Uniform "predict next value" contract of the three base forecasters.
///
/// Everything a variant needs (feature row, fitted state, horizon) is fixed
/// when it is constructed, so callers never inspect model types.
pub trait BaseForecaster: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// One-step-ahead prediction.
    fn predict_next(&self) -> Result<f64, BaseForecastError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// A pretrained tree ensemble evaluated on one feature vector.
pub trait TreeEnsembleModel: Send + Sync {
    /// Feature names in input order, when the model file declares them.
    fn feature_names(&self) -> Option<&[String]>;

    fn num_features(&self) -> usize;

    fn predict_row(&self, features: &[f64]) -> Result<f64, BaseForecastError>;

    fn name(&self) -> &str;
}

/// The meta-model that turns the three base predictions into the final one.
pub trait StackingModel: Send + Sync {
    fn combine(&self, input: &StackVector) -> Result<f64, CombinerError>;

    fn name(&self) -> &str;
}
