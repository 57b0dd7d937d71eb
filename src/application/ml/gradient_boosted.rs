use super::predictor::{BaseForecaster, TreeEnsembleModel};
use crate::domain::errors::BaseForecastError;
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::types::{FeatureRow, ModelKind};
use std::sync::Arc;

/// Gradient-boosted-tree forecaster bound to one request's feature row.
///
/// Its prediction seeds every fallback, so its errors are never suppressed.
pub struct GradientBoostedForecaster {
    model: Arc<dyn TreeEnsembleModel>,
    schema: Arc<FeatureSchema>,
    row: FeatureRow,
}

impl GradientBoostedForecaster {
    pub fn new(model: Arc<dyn TreeEnsembleModel>, schema: Arc<FeatureSchema>, row: FeatureRow) -> Self {
        Self { model, schema, row }
    }

    /// Model input in model order: the model's declared names when present,
    /// otherwise the schema order.
    fn input_vector(&self) -> Result<Vec<f64>, BaseForecastError> {
        let names = self
            .model
            .feature_names()
            .unwrap_or_else(|| self.schema.names());
        names
            .iter()
            .map(|name| {
                self.row
                    .get(name)
                    .ok_or_else(|| BaseForecastError::MissingFeature { name: name.clone() })
            })
            .collect()
    }
}

impl BaseForecaster for GradientBoostedForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoosted
    }

    fn predict_next(&self) -> Result<f64, BaseForecastError> {
        let input = self.input_vector()?;
        self.model.predict_row(&input)
    }

    fn name(&self) -> &str {
        self.model.name()
    }
}
