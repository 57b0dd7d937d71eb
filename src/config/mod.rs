//! Configuration module for stackcast.
//!
//! Structured configuration loaded from environment variables, organized by
//! concern: Models, Data, Pipeline and Observability.

mod data_config;
mod model_config;
mod observability_config;
mod pipeline_config;

pub use data_config::{DEFAULT_YAHOO_BASE_URL, DataEnvConfig, DataSourceKind};
pub use model_config::{CombinerKind, GbtBackend, ModelEnvConfig};
pub use observability_config::ObservabilityEnvConfig;
pub use pipeline_config::PipelineEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub models: ModelEnvConfig,
    pub data: DataEnvConfig,
    pub pipeline: PipelineEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let models = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let data = DataEnvConfig::from_env().context("Failed to load data config")?;
        let pipeline = PipelineEnvConfig::from_env().context("Failed to load pipeline config")?;
        let observability = ObservabilityEnvConfig::from_env();

        Ok(Self {
            models,
            data,
            pipeline,
            observability,
        })
    }
}

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
