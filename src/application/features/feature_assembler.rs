use crate::domain::errors::ForecastError;
use crate::domain::market::AugmentedSeries;
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::types::FeatureRow;
use std::sync::Arc;
use tracing::debug;

/// Projects the most recent complete bar of an augmented series onto the
/// fixed feature schema.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    schema: Arc<FeatureSchema>,
}

impl FeatureAssembler {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn assemble(&self, series: &AugmentedSeries) -> Result<FeatureRow, ForecastError> {
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }

        // Rows with any missing column are incomplete lookback windows
        let row = series
            .latest_complete_row()
            .ok_or(ForecastError::NoCompleteRow)?;
        let dropped = series.len() - 1 - row;
        if dropped > 0 {
            debug!("Skipped {} trailing incomplete rows", dropped);
        }

        let normalized: Vec<String> = series
            .columns()
            .iter()
            .map(|c| c.label.normalized())
            .collect();

        let mut entries = Vec::with_capacity(self.schema.len());
        for name in self.schema.names() {
            let mut matches = normalized
                .iter()
                .zip(series.columns())
                .filter(|(n, _)| *n == name);
            let (_, column) = matches.next().ok_or_else(|| ForecastError::MissingFeature {
                name: name.clone(),
            })?;
            if matches.next().is_some() {
                return Err(ForecastError::DuplicateFeature { name: name.clone() });
            }
            let value = column
                .value(row)
                .ok_or_else(|| ForecastError::MissingFeature { name: name.clone() })?;
            entries.push((name.clone(), value));
        }

        Ok(FeatureRow::new(series.timestamps()[row], entries))
    }
}
