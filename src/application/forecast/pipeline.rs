use super::artifacts::ModelArtifacts;
use super::fallback::FallbackController;
use crate::application::features::{CandlePatterns, FeatureAssembler, TechnicalIndicators};
use crate::application::ml::{BaseForecaster, GradientBoostedForecaster};
use crate::config::PipelineEnvConfig;
use crate::domain::errors::ForecastError;
use crate::domain::market::{AugmentedSeries, BarRequest, Candle};
use crate::domain::ml::presentation::{ComparisonChart, ForecastReport, Presentation};
use crate::domain::ml::types::{BasePredictions, FinalPrediction, ModelKind, PipelineStage};
use crate::domain::ports::{MarketDataSource, SeriesAugmenter};
use crate::infrastructure::observability::ForecastMetrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

/// Result of one successful forecast request.
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub request_id: Uuid,
    pub symbol: String,
    /// Timestamp of the bar the features were taken from
    pub as_of: i64,
    pub predictions: BasePredictions,
    pub final_prediction: FinalPrediction,
    /// Stages in visiting order
    pub stages: Vec<PipelineStage>,
}

impl ForecastOutcome {
    pub fn as_of_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.as_of, 0)
    }

    pub fn report(&self) -> ForecastReport {
        ForecastReport::new(&self.predictions, self.final_prediction)
    }

    pub fn presentation(&self, plot: bool) -> Presentation {
        let report = self.report();
        if plot {
            Presentation::Chart(ComparisonChart::from(&report))
        } else {
            Presentation::Report(report)
        }
    }
}

/// raw bars → generators → feature row → base forecasts → stacked prediction
pub struct ForecastPipeline {
    artifacts: Arc<ModelArtifacts>,
    augmenters: Vec<Arc<dyn SeriesAugmenter>>,
    assembler: FeatureAssembler,
    controller: FallbackController,
    metrics: Option<ForecastMetrics>,
}

impl ForecastPipeline {
    pub fn new(artifacts: Arc<ModelArtifacts>, config: &PipelineEnvConfig) -> Self {
        let assembler = FeatureAssembler::new(artifacts.schema.clone());
        let indicators: Arc<dyn SeriesAugmenter> = Arc::new(TechnicalIndicators::default());
        let patterns: Arc<dyn SeriesAugmenter> = Arc::new(CandlePatterns::default());
        Self {
            artifacts,
            augmenters: vec![indicators, patterns],
            assembler,
            controller: FallbackController::new(config.timeout(), config.concurrent),
            metrics: None,
        }
    }

    /// Replace the feature generators, applied in order.
    pub fn with_augmenters(mut self, augmenters: Vec<Arc<dyn SeriesAugmenter>>) -> Self {
        self.augmenters = augmenters;
        self
    }

    pub fn with_metrics(mut self, metrics: ForecastMetrics) -> Self {
        self.controller = self.controller.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Fetch bars from `source` and forecast the next value.
    pub async fn run(
        &self,
        source: &dyn MarketDataSource,
        request: &BarRequest,
    ) -> Result<ForecastOutcome, ForecastError> {
        info!(
            "Fetching {} bars ({}, {}) from {}",
            request.symbol,
            request.interval,
            request.range,
            source.name()
        );
        let candles = match source.fetch_candles(request).await {
            Ok(candles) => candles,
            Err(e) => {
                let result: Result<ForecastOutcome, ForecastError> =
                    Err(ForecastError::DataSource {
                        reason: format!("{:#}", e),
                    });
                self.record_outcome(&result);
                return result;
            }
        };
        self.forecast(&request.symbol, &candles).await
    }

    /// Forecast the value following the last of `candles`.
    pub async fn forecast(
        &self,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<ForecastOutcome, ForecastError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("forecast", %request_id, symbol);
        let result = self
            .forecast_inner(request_id, symbol, candles)
            .instrument(span)
            .await;
        self.record_outcome(&result);
        result
    }

    async fn forecast_inner(
        &self,
        request_id: Uuid,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<ForecastOutcome, ForecastError> {
        if candles.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        let mut stages = vec![PipelineStage::Init];

        let mut series = AugmentedSeries::from_candles(symbol, candles);
        for augmenter in &self.augmenters {
            series = augmenter
                .augment(series)
                .map_err(|source| ForecastError::Generator {
                    stage: augmenter.name().to_string(),
                    source,
                })?;
        }

        let row = self.assembler.assemble(&series)?;
        let as_of = row.timestamp();
        stages.push(PipelineStage::FeaturesBuilt);
        debug!(as_of, features = row.len(), "feature row assembled");

        let gbt: Arc<dyn BaseForecaster> = Arc::new(GradientBoostedForecaster::new(
            self.artifacts.gbt.clone(),
            self.artifacts.schema.clone(),
            row,
        ));
        let predictions = self
            .controller
            .run(
                gbt,
                self.artifacts.stat.clone(),
                self.artifacts.decomp.clone(),
            )
            .await
            .map_err(ForecastError::PrimaryForecast)?;
        for prediction in [&predictions.gbt, &predictions.stat, &predictions.decomp] {
            let stage = PipelineStage::BasePredicted {
                model: prediction.kind(),
                fallback: prediction.is_fallback(),
            };
            debug!(?stage, value = prediction.value(), "base prediction");
            stages.push(stage);
        }

        let stack = predictions.stack_vector();
        let value = {
            let _timer = self.metrics.as_ref().map(|m| m.time_model("combiner"));
            self.artifacts.combiner.combine(&stack)?
        };
        let final_prediction = FinalPrediction::new(value);
        stages.push(PipelineStage::Stacked);

        let degraded: Vec<&str> = predictions.degraded().iter().map(ModelKind::column).collect();
        info!(
            gbt = stack.gbt(),
            stat = stack.stat(),
            decomp = stack.decomp(),
            final_prediction = value,
            ?degraded,
            "Forecast complete"
        );
        stages.push(PipelineStage::Done);

        Ok(ForecastOutcome {
            request_id,
            symbol: symbol.to_string(),
            as_of,
            predictions,
            final_prediction,
            stages,
        })
    }

    fn record_outcome(&self, result: &Result<ForecastOutcome, ForecastError>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        match result {
            Ok(outcome) => {
                metrics.inc_forecasts("success");
                metrics.set_final_prediction(outcome.final_prediction.value());
            }
            Err(e) => metrics.inc_forecasts(e.label()),
        }
    }
}
