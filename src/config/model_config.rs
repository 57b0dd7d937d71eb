//! Model artifact configuration parsing from environment variables.
//!
//! Every path defaults to a file under `MODELS_DIR`.

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which meta-model format the combiner artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinerKind {
    Linear,
    RandomForest,
}

impl FromStr for CombinerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(CombinerKind::Linear),
            "random_forest" | "forest" => Ok(CombinerKind::RandomForest),
            _ => anyhow::bail!(
                "Invalid COMBINER_KIND: {}. Must be 'linear' or 'random_forest'",
                s
            ),
        }
    }
}

/// Tree model runtime, selected by the artifact's file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GbtBackend {
    XgboostJson,
    Onnx,
}

impl GbtBackend {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => GbtBackend::Onnx,
            _ => GbtBackend::XgboostJson,
        }
    }
}

/// Model environment configuration
#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub models_dir: PathBuf,
    pub gbt_model_path: PathBuf,
    pub stat_model_path: PathBuf,
    pub decomp_model_path: PathBuf,
    pub combiner_model_path: PathBuf,
    pub combiner_kind: CombinerKind,
    /// Optional JSON array of feature names overriding the built-in list
    pub features_path: Option<PathBuf>,
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let models_dir = PathBuf::from(env::var("MODELS_DIR").unwrap_or_else(|_| "models".to_string()));

        let combiner_kind_str = env::var("COMBINER_KIND").unwrap_or_else(|_| "linear".to_string());
        let combiner_kind = CombinerKind::from_str(&combiner_kind_str)?;

        Ok(Self {
            gbt_model_path: Self::path_or("GBT_MODEL_PATH", &models_dir, "gbt_model.json"),
            stat_model_path: Self::path_or("STAT_MODEL_PATH", &models_dir, "arima_model.json"),
            decomp_model_path: Self::path_or(
                "DECOMP_MODEL_PATH",
                &models_dir,
                "decomposition_model.json",
            ),
            combiner_model_path: Self::path_or("COMBINER_MODEL_PATH", &models_dir, "meta_model.json"),
            combiner_kind,
            features_path: env::var("FEATURES_PATH").ok().map(PathBuf::from),
            models_dir,
        })
    }

    pub fn gbt_backend(&self) -> GbtBackend {
        GbtBackend::for_path(&self.gbt_model_path)
    }

    fn path_or(key: &str, dir: &Path, file_name: &str) -> PathBuf {
        env::var(key)
            .map(PathBuf::from)
            .unwrap_or_else(|_| dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_lock;

    #[test]
    fn test_model_paths_follow_models_dir() {
        let _guard = env_lock();
        unsafe {
            env::set_var("MODELS_DIR", "/opt/stackcast");
            env::remove_var("GBT_MODEL_PATH");
            env::remove_var("COMBINER_KIND");
        }

        let config = ModelEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.gbt_model_path, PathBuf::from("/opt/stackcast/gbt_model.json"));
        assert_eq!(config.gbt_backend(), GbtBackend::XgboostJson);
        assert_eq!(config.combiner_kind, CombinerKind::Linear);

        unsafe {
            env::remove_var("MODELS_DIR");
        }
    }

    #[test]
    fn test_onnx_extension_selects_onnx_backend() {
        assert_eq!(GbtBackend::for_path(Path::new("m/gbt.ONNX")), GbtBackend::Onnx);
        assert_eq!(GbtBackend::for_path(Path::new("m/gbt.json")), GbtBackend::XgboostJson);
    }

    #[test]
    fn test_combiner_kind_parsing() {
        assert_eq!(CombinerKind::from_str("LINEAR").unwrap(), CombinerKind::Linear);
        assert_eq!(
            CombinerKind::from_str("random_forest").unwrap(),
            CombinerKind::RandomForest
        );
        assert!(CombinerKind::from_str("xgboost").is_err());
    }
}
