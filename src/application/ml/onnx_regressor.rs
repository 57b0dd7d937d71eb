use super::predictor::TreeEnsembleModel;
use crate::domain::errors::{BaseForecastError, ModelLoadError};
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Tree regressor exported to ONNX, input `[1, n_features]` of f32.
pub struct OnnxRegressor {
    session: Mutex<Session>,
    model_path: PathBuf,
    num_features: usize,
}

impl OnnxRegressor {
    pub fn load(model_path: &Path, num_features: usize) -> Result<Self, ModelLoadError> {
        std::fs::metadata(model_path).map_err(|source| ModelLoadError::Io {
            path: model_path.to_path_buf(),
            source,
        })?;

        let session = Session::builder()
            .and_then(|mut builder| builder.commit_from_file(model_path))
            .map_err(|e| ModelLoadError::Onnx {
                path: model_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!("Successfully loaded ONNX model from {:?}", model_path);

        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
            num_features,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl TreeEnsembleModel for OnnxRegressor {
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict_row(&self, features: &[f64]) -> Result<f64, BaseForecastError> {
        if features.len() != self.num_features {
            return Err(BaseForecastError::FeatureCountMismatch {
                expected: self.num_features,
                actual: features.len(),
            });
        }
        let inference = |reason: String| BaseForecastError::Inference { reason };

        let mut session = self
            .session
            .lock()
            .map_err(|e| inference(format!("Mutex lock failed: {}", e)))?;

        let data: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let shape = vec![1, self.num_features];
        let input_value = ort::value::Value::from_array((shape.as_slice(), data))
            .map_err(|e| inference(format!("Input value creation failed: {}", e)))?;

        let inputs = ort::inputs![input_value];

        let outputs = session.run(inputs).map_err(|e| inference(e.to_string()))?;
        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| inference("No output found".to_string()))?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| inference(e.to_string()))?;
        let value = *data
            .1
            .iter()
            .next()
            .ok_or_else(|| inference("Empty output".to_string()))? as f64;

        if !value.is_finite() {
            return Err(BaseForecastError::NumericalInstability {
                reason: format!("ONNX model produced {}", value),
            });
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "ONNX Runtime (tree regressor)"
    }
}
