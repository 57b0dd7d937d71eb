//! Forecast pipeline configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Pipeline environment configuration
#[derive(Debug, Clone)]
pub struct PipelineEnvConfig {
    /// Upper bound on each base forecaster call
    pub forecast_timeout_ms: u64,
    /// Run the statistical and decomposition forecasters concurrently
    pub concurrent: bool,
}

impl Default for PipelineEnvConfig {
    fn default() -> Self {
        Self {
            forecast_timeout_ms: 2000,
            concurrent: true,
        }
    }
}

impl PipelineEnvConfig {
    pub fn from_env() -> Result<Self> {
        let forecast_timeout_ms = env::var("FORECAST_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .context("Failed to parse FORECAST_TIMEOUT_MS")?;
        if forecast_timeout_ms == 0 {
            anyhow::bail!("FORECAST_TIMEOUT_MS must be greater than 0");
        }

        Ok(Self {
            forecast_timeout_ms,
            concurrent: env::var("FORECAST_CONCURRENT")
                .unwrap_or_else(|_| "true".to_string())
                .parse::<bool>()
                .unwrap_or(true),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.forecast_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_lock;

    #[test]
    fn test_pipeline_config_defaults() {
        let _guard = env_lock();
        unsafe {
            env::remove_var("FORECAST_TIMEOUT_MS");
            env::remove_var("FORECAST_CONCURRENT");
        }

        let config = PipelineEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.timeout(), Duration::from_millis(2000));
        assert!(config.concurrent);
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let _guard = env_lock();
        unsafe {
            env::set_var("FORECAST_TIMEOUT_MS", "soon");
        }
        assert!(PipelineEnvConfig::from_env().is_err());

        unsafe {
            env::set_var("FORECAST_TIMEOUT_MS", "0");
        }
        assert!(PipelineEnvConfig::from_env().is_err());

        unsafe {
            env::remove_var("FORECAST_TIMEOUT_MS");
        }
    }
}
