pub mod decomposition;
pub mod gradient_boosted;
pub mod onnx_regressor;
pub mod predictor;
pub mod smartcore_stacker;
pub mod stacking;
pub mod statistical;
pub mod xgboost_model;

pub use decomposition::{DecompositionForecaster, DecompositionState, Seasonality};
pub use gradient_boosted::GradientBoostedForecaster;
pub use onnx_regressor::OnnxRegressor;
pub use predictor::{BaseForecaster, StackingModel, TreeEnsembleModel};
pub use smartcore_stacker::ForestStacker;
pub use stacking::LinearStacker;
pub use statistical::{ArimaState, StatisticalForecaster};
pub use xgboost_model::XgbJsonModel;
