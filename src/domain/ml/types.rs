use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a base forecaster. The order of variants is the stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    GradientBoosted,
    Statistical,
    Decomposition,
}

impl ModelKind {
    pub const STACK_ORDER: [ModelKind; 3] = [
        ModelKind::GradientBoosted,
        ModelKind::Statistical,
        ModelKind::Decomposition,
    ];

    /// Column name the stacking combiner was trained on.
    pub fn column(&self) -> &'static str {
        match self {
            ModelKind::GradientBoosted => "gbt",
            ModelKind::Statistical => "stat",
            ModelKind::Decomposition => "decomp",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            ModelKind::GradientBoosted => "Gradient Boosted Trees",
            ModelKind::Statistical => "Statistical",
            ModelKind::Decomposition => "Decomposition",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One bar's worth of model inputs, in feature-schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    timestamp: i64,
    entries: Vec<(String, f64)>,
}

impl FeatureRow {
    pub fn new(timestamp: i64, entries: Vec<(String, f64)>) -> Self {
        Self { timestamp, entries }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    Fallback { reason: String },
}

/// A base model's scalar for one request. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePrediction {
    kind: ModelKind,
    value: f64,
    source: PredictionSource,
}

impl BasePrediction {
    pub fn from_model(kind: ModelKind, value: f64) -> Self {
        Self {
            kind,
            value,
            source: PredictionSource::Model,
        }
    }

    pub fn fallback(kind: ModelKind, value: f64, reason: impl Into<String>) -> Self {
        Self {
            kind,
            value,
            source: PredictionSource::Fallback {
                reason: reason.into(),
            },
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn source(&self) -> &PredictionSource {
        &self.source
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PredictionSource::Fallback { .. })
    }
}

/// The three base predictions of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePredictions {
    pub gbt: BasePrediction,
    pub stat: BasePrediction,
    pub decomp: BasePrediction,
}

impl BasePredictions {
    pub fn stack_vector(&self) -> StackVector {
        StackVector::new(self.gbt.value(), self.stat.value(), self.decomp.value())
    }

    pub fn degraded(&self) -> Vec<ModelKind> {
        [&self.stat, &self.decomp]
            .into_iter()
            .filter(|p| p.is_fallback())
            .map(|p| p.kind())
            .collect()
    }
}

/// Ordered (gbt, stat, decomp) input of the stacking combiner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackVector([f64; 3]);

impl StackVector {
    pub const COLUMNS: [&'static str; 3] = ["gbt", "stat", "decomp"];

    pub fn new(gbt: f64, stat: f64, decomp: f64) -> Self {
        Self([gbt, stat, decomp])
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    pub fn gbt(&self) -> f64 {
        self.0[0]
    }

    pub fn stat(&self) -> f64 {
        self.0[1]
    }

    pub fn decomp(&self) -> f64 {
        self.0[2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalPrediction(f64);

impl FinalPrediction {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Per-request pipeline state, recorded in visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Init,
    FeaturesBuilt,
    BasePredicted { model: ModelKind, fallback: bool },
    Stacked,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_order_matches_columns() {
        let columns: Vec<&str> = ModelKind::STACK_ORDER.iter().map(|k| k.column()).collect();
        assert_eq!(columns, StackVector::COLUMNS);
    }

    #[test]
    fn test_stack_vector_from_predictions() {
        let predictions = BasePredictions {
            gbt: BasePrediction::from_model(ModelKind::GradientBoosted, 1.0),
            stat: BasePrediction::fallback(ModelKind::Statistical, 1.0, "timeout"),
            decomp: BasePrediction::from_model(ModelKind::Decomposition, 3.0),
        };

        assert_eq!(predictions.stack_vector().as_array(), [1.0, 1.0, 3.0]);
        assert_eq!(predictions.degraded(), vec![ModelKind::Statistical]);
    }

    #[test]
    fn test_feature_row_lookup() {
        let row = FeatureRow::new(
            10,
            vec![("f1".to_string(), 1.0), ("f2".to_string(), 2.0)],
        );
        assert_eq!(row.get("f2"), Some(2.0));
        assert_eq!(row.get("f3"), None);
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["f1", "f2"]);
    }
}
