//! Market data configuration parsing from environment variables.

use crate::domain::market::types::BarRequest;
use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Where raw bars come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Yahoo,
    Csv,
}

impl FromStr for DataSourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yahoo" => Ok(DataSourceKind::Yahoo),
            "csv" => Ok(DataSourceKind::Csv),
            _ => anyhow::bail!("Invalid DATA_SOURCE: {}. Must be 'yahoo' or 'csv'", s),
        }
    }
}

/// Data environment configuration
#[derive(Debug, Clone)]
pub struct DataEnvConfig {
    pub source: DataSourceKind,
    pub symbol: String,
    pub interval: String,
    pub range: String,
    pub bars_csv_path: Option<PathBuf>,
    pub yahoo_base_url: String,
}

impl DataEnvConfig {
    pub fn from_env() -> Result<Self> {
        let source_str = env::var("DATA_SOURCE").unwrap_or_else(|_| "yahoo".to_string());
        let source = DataSourceKind::from_str(&source_str)?;
        let defaults = BarRequest::default();

        let bars_csv_path = env::var("BARS_CSV_PATH").ok().map(PathBuf::from);
        if source == DataSourceKind::Csv && bars_csv_path.is_none() {
            anyhow::bail!("DATA_SOURCE=csv requires BARS_CSV_PATH");
        }

        Ok(Self {
            source,
            symbol: env::var("SYMBOL").unwrap_or(defaults.symbol),
            interval: env::var("INTERVAL").unwrap_or(defaults.interval),
            range: env::var("RANGE").unwrap_or(defaults.range),
            bars_csv_path,
            yahoo_base_url: env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_YAHOO_BASE_URL.to_string()),
        })
    }

    pub fn bar_request(&self) -> BarRequest {
        BarRequest::new(&self.symbol, &self.interval, &self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_lock;

    #[test]
    fn test_data_config_defaults() {
        let _guard = env_lock();
        unsafe {
            env::remove_var("DATA_SOURCE");
            env::remove_var("SYMBOL");
            env::remove_var("INTERVAL");
            env::remove_var("RANGE");
        }

        let config = DataEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.source, DataSourceKind::Yahoo);
        assert_eq!(config.symbol, "EURUSD=X");
        assert_eq!(config.interval, "1d");
        assert_eq!(config.range, "5y");
        assert_eq!(config.yahoo_base_url, DEFAULT_YAHOO_BASE_URL);
    }

    #[test]
    fn test_csv_source_requires_path() {
        let _guard = env_lock();
        unsafe {
            env::set_var("DATA_SOURCE", "csv");
            env::remove_var("BARS_CSV_PATH");
        }

        assert!(DataEnvConfig::from_env().is_err());

        unsafe {
            env::set_var("BARS_CSV_PATH", "bars.csv");
        }
        let config = DataEnvConfig::from_env().expect("csv source with path");
        assert_eq!(config.bars_csv_path, Some(PathBuf::from("bars.csv")));

        unsafe {
            env::remove_var("DATA_SOURCE");
            env::remove_var("BARS_CSV_PATH");
        }
    }
}
