use crate::application::ml::{
    ArimaState, BaseForecaster, DecompositionForecaster, DecompositionState, ForestStacker,
    LinearStacker, OnnxRegressor, StackingModel, StatisticalForecaster, TreeEnsembleModel,
    XgbJsonModel,
};
use crate::config::{CombinerKind, GbtBackend, ModelEnvConfig};
use crate::domain::errors::ModelLoadError;
use crate::domain::ml::feature_registry::FeatureSchema;
use std::sync::Arc;
use tracing::info;

/// Pretrained models shared read-only by every forecast request.
///
/// Loaded once at startup and never reloaded. Construction enforces that the
/// tree model and the feature schema agree.
#[derive(Clone)]
pub struct ModelArtifacts {
    pub schema: Arc<FeatureSchema>,
    pub gbt: Arc<dyn TreeEnsembleModel>,
    pub stat: Arc<dyn BaseForecaster>,
    pub decomp: Arc<dyn BaseForecaster>,
    pub combiner: Arc<dyn StackingModel>,
}

impl ModelArtifacts {
    pub fn new(
        schema: Arc<FeatureSchema>,
        gbt: Arc<dyn TreeEnsembleModel>,
        stat: Arc<dyn BaseForecaster>,
        decomp: Arc<dyn BaseForecaster>,
        combiner: Arc<dyn StackingModel>,
    ) -> Result<Self, ModelLoadError> {
        match gbt.feature_names() {
            Some(names) => schema.ensure_matches(names)?,
            None if gbt.num_features() != schema.len() => {
                return Err(ModelLoadError::SchemaMismatch {
                    reason: format!(
                        "tree model expects {} features, schema has {}",
                        gbt.num_features(),
                        schema.len()
                    ),
                });
            }
            None => {}
        }

        Ok(Self {
            schema,
            gbt,
            stat,
            decomp,
            combiner,
        })
    }

    /// Load every artifact named by the model configuration.
    pub fn load(config: &ModelEnvConfig) -> Result<Self, ModelLoadError> {
        let schema = match &config.features_path {
            Some(path) => FeatureSchema::from_file(path)?,
            None => FeatureSchema::default(),
        };

        let gbt: Arc<dyn TreeEnsembleModel> = match config.gbt_backend() {
            GbtBackend::XgboostJson => Arc::new(XgbJsonModel::load(&config.gbt_model_path)?),
            GbtBackend::Onnx => Arc::new(OnnxRegressor::load(&config.gbt_model_path, schema.len())?),
        };

        let stat = StatisticalForecaster::new(ArimaState::load(&config.stat_model_path)?);
        let decomp =
            DecompositionForecaster::new(DecompositionState::load(&config.decomp_model_path)?);

        let combiner: Arc<dyn StackingModel> = match config.combiner_kind {
            CombinerKind::Linear => Arc::new(LinearStacker::load(&config.combiner_model_path)?),
            CombinerKind::RandomForest => {
                Arc::new(ForestStacker::load(&config.combiner_model_path)?)
            }
        };

        info!(
            "Model artifacts ready: gbt={}, stat={}, decomp={}, combiner={}, {} features",
            gbt.name(),
            stat.name(),
            decomp.name(),
            combiner.name(),
            schema.len()
        );

        Self::new(
            Arc::new(schema),
            gbt,
            Arc::new(stat),
            Arc::new(decomp),
            combiner,
        )
    }
}
