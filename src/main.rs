//! stackcast - one-step price forecast from a stacked model ensemble
//!
//! Fetches bars, builds the feature row, runs the three base forecasters and
//! prints the stacked prediction.
//!
//! # Usage
//! ```sh
//! cargo run -- --symbol EURUSD=X
//! cargo run -- --csv data/eurusd.csv --plot
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use stackcast::application::forecast::{ForecastPipeline, ModelArtifacts};
use stackcast::config::{Config, DataSourceKind};
use stackcast::domain::ports::{MarketDataSource, ResultPresenter};
use stackcast::infrastructure::market_data::{CsvBarSource, YahooChartSource};
use stackcast::infrastructure::observability::ForecastMetrics;
use stackcast::interfaces::{JsonPresenter, TextChartPresenter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stacked ensemble price forecaster", long_about = None)]
struct Cli {
    /// Render a bar chart comparing the four values instead of the JSON record
    #[arg(long)]
    plot: bool,

    /// Read bars from this CSV file instead of the configured source
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Instrument symbol (overrides SYMBOL)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Bar interval (overrides INTERVAL)
    #[arg(long)]
    interval: Option<String>,

    /// Lookback range (overrides RANGE)
    #[arg(long)]
    range: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Print Prometheus metrics after the forecast
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the forecast
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    info!("stackcast {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(path) = cli.csv.clone() {
        config.data.source = DataSourceKind::Csv;
        config.data.bars_csv_path = Some(path);
    }
    if let Some(symbol) = cli.symbol.clone() {
        config.data.symbol = symbol;
    }
    if let Some(interval) = cli.interval.clone() {
        config.data.interval = interval;
    }
    if let Some(range) = cli.range.clone() {
        config.data.range = range;
    }
    info!(
        "Configuration loaded: Source={:?}, Symbol={}, Models={:?}",
        config.data.source, config.data.symbol, config.models.models_dir
    );

    let artifacts = ModelArtifacts::load(&config.models).context("Failed to load model artifacts")?;
    let mut pipeline = ForecastPipeline::new(Arc::new(artifacts), &config.pipeline);

    let metrics = if config.observability.enabled || cli.metrics {
        let metrics = ForecastMetrics::new()?;
        pipeline = pipeline.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };

    let source: Box<dyn MarketDataSource> = match config.data.source {
        DataSourceKind::Yahoo => Box::new(YahooChartSource::new(config.data.yahoo_base_url.clone())),
        DataSourceKind::Csv => {
            let path = config
                .data
                .bars_csv_path
                .clone()
                .context("CSV data source selected without a file path")?;
            Box::new(CsvBarSource::new(path))
        }
    };

    let outcome = pipeline
        .run(source.as_ref(), &config.data.bar_request())
        .await?;
    info!(
        "Forecast {} for {} as of {}",
        outcome.request_id,
        outcome.symbol,
        outcome
            .as_of_datetime()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| outcome.as_of.to_string())
    );

    let presentation = outcome.presentation(cli.plot);
    let rendered = if cli.plot {
        TextChartPresenter::default().render(&presentation)?
    } else {
        JsonPresenter { pretty: cli.pretty }.render(&presentation)?
    };
    println!("{}", rendered);

    if cli.metrics
        && let Some(metrics) = &metrics
    {
        println!("{}", metrics.render());
    }

    Ok(())
}
