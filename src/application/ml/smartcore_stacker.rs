use super::predictor::StackingModel;
use crate::domain::errors::{CombinerError, ModelLoadError};
use crate::domain::ml::types::StackVector;
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random-forest meta-regressor trained on the (gbt, stat, decomp) columns.
pub struct ForestStacker {
    model: Forest,
    model_path: PathBuf,
}

impl ForestStacker {
    pub fn load(model_path: &Path) -> Result<Self, ModelLoadError> {
        let mut file = File::open(model_path).map_err(|source| ModelLoadError::Io {
            path: model_path.to_path_buf(),
            source,
        })?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)
            .map_err(|source| ModelLoadError::Io {
                path: model_path.to_path_buf(),
                source,
            })?;

        // Smartcore deserialization (serde_json)
        let model: Forest = serde_json::from_reader(std::io::Cursor::new(&buffer)).map_err(
            |source| ModelLoadError::Parse {
                path: model_path.to_path_buf(),
                source,
            },
        )?;
        info!("Successfully loaded stacking forest from {:?}", model_path);

        Ok(Self {
            model,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl StackingModel for ForestStacker {
    fn combine(&self, input: &StackVector) -> Result<f64, CombinerError> {
        let input_matrix = DenseMatrix::from_2d_vec(&vec![input.as_array().to_vec()]).map_err(
            |e| CombinerError::Inference {
                reason: format!("Matrix creation failed: {}", e),
            },
        )?;

        let predictions = self
            .model
            .predict(&input_matrix)
            .map_err(|e| CombinerError::Inference {
                reason: format!("Prediction failed: {}", e),
            })?;

        let value = *predictions.first().ok_or_else(|| CombinerError::Inference {
            reason: "No prediction returned".to_string(),
        })?;
        if !value.is_finite() {
            return Err(CombinerError::NonFinite { value });
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }
}
