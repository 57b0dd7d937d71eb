use crate::domain::errors::ModelLoadError;
use std::path::Path;

/// Ordered list of feature names the tree model is trained on.
/// This order MUST match the column order used when the model was trained.
/// Any change here is a breaking change for the gradient-boosted-tree model.
pub const FEATURE_NAMES: &[&str] = &[
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "RSI",
    "MACD",
    "MACD_Signal",
    "MACD_Hist",
    "SMA_20",
    "SMA_50",
    "EMA_12",
    "EMA_26",
    "BB_Upper",
    "BB_Middle",
    "BB_Lower",
    "ATR",
    "Return_1",
    "Doji",
    "Hammer",
    "Shooting_Star",
    "Bullish_Engulfing",
    "Bearish_Engulfing",
];

/// Fixed ordered feature list shared by the assembler and the tree model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::new(FEATURE_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Loads a JSON array of feature names.
    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let names: Vec<String> =
            serde_json::from_str(&raw).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if names.is_empty() {
            return Err(ModelLoadError::Invalid {
                path: path.to_path_buf(),
                reason: "feature list is empty".to_string(),
            });
        }
        Ok(Self::new(names))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Checks the schema against the feature names a model declares.
    pub fn ensure_matches(&self, model_names: &[String]) -> Result<(), ModelLoadError> {
        if model_names.len() != self.names.len() {
            return Err(ModelLoadError::SchemaMismatch {
                reason: format!(
                    "model expects {} features, schema has {}",
                    model_names.len(),
                    self.names.len()
                ),
            });
        }
        if let Some((i, (expected, actual))) = model_names
            .iter()
            .zip(self.names.iter())
            .enumerate()
            .find(|(_, (m, s))| m != s)
        {
            return Err(ModelLoadError::SchemaMismatch {
                reason: format!(
                    "position {}: model expects '{}', schema has '{}'",
                    i, expected, actual
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_has_no_duplicates() {
        let schema = FeatureSchema::default();
        let mut names = schema.names().to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_schema_mismatch_reports_position() {
        let schema = FeatureSchema::new(vec!["a".to_string(), "b".to_string()]);
        assert!(schema.ensure_matches(&["a".to_string(), "b".to_string()]).is_ok());

        let err = schema
            .ensure_matches(&["a".to_string(), "c".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("position 1"));

        assert!(schema.ensure_matches(&["a".to_string()]).is_err());
    }
}
