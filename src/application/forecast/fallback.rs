use crate::application::ml::BaseForecaster;
use crate::domain::errors::BaseForecastError;
use crate::domain::ml::types::{BasePrediction, BasePredictions, ModelKind};
use crate::infrastructure::observability::ForecastMetrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Runs the three base forecasters and guarantees three predictions.
///
/// The gradient-boosted-tree forecaster runs first and exactly once; its
/// failure is returned. The statistical and decomposition forecasters never
/// fail the request: any error, timeout or panic is replaced by the
/// gradient-boosted-tree value.
#[derive(Clone)]
pub struct FallbackController {
    timeout: Duration,
    concurrent: bool,
    metrics: Option<ForecastMetrics>,
}

impl FallbackController {
    pub fn new(timeout: Duration, concurrent: bool) -> Self {
        Self {
            timeout,
            concurrent,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ForecastMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(
        &self,
        gbt: Arc<dyn BaseForecaster>,
        stat: Arc<dyn BaseForecaster>,
        decomp: Arc<dyn BaseForecaster>,
    ) -> Result<BasePredictions, BaseForecastError> {
        let gbt_value = self.invoke(gbt).await?;
        debug!(value = gbt_value, "gbt forecast captured");

        let (stat_result, decomp_result) = if self.concurrent {
            tokio::join!(self.invoke(stat), self.invoke(decomp))
        } else {
            let stat_result = self.invoke(stat).await;
            (stat_result, self.invoke(decomp).await)
        };

        Ok(BasePredictions {
            gbt: BasePrediction::from_model(ModelKind::GradientBoosted, gbt_value),
            stat: self.resolve(ModelKind::Statistical, stat_result, gbt_value),
            decomp: self.resolve(ModelKind::Decomposition, decomp_result, gbt_value),
        })
    }

    /// One bounded call on the blocking pool. Panics and timeouts come back as errors.
    async fn invoke(&self, forecaster: Arc<dyn BaseForecaster>) -> Result<f64, BaseForecastError> {
        let kind = forecaster.kind();
        let _timer = self.metrics.as_ref().map(|m| m.time_model(kind.column()));

        let handle = tokio::task::spawn_blocking(move || forecaster.predict_next());
        // A timed-out call keeps running on the blocking pool; its result is discarded.
        let value = match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(BaseForecastError::Panicked {
                    model: kind,
                    reason: join_error.to_string(),
                });
            }
            Err(_) => {
                return Err(BaseForecastError::Timeout {
                    model: kind,
                    after_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        if !value.is_finite() {
            return Err(BaseForecastError::NumericalInstability {
                reason: format!("{} forecaster returned {}", kind, value),
            });
        }
        Ok(value)
    }

    fn resolve(
        &self,
        kind: ModelKind,
        result: Result<f64, BaseForecastError>,
        gbt_value: f64,
    ) -> BasePrediction {
        match result {
            Ok(value) => BasePrediction::from_model(kind, value),
            Err(e) => {
                warn!(
                    model = %kind,
                    reason = e.label(),
                    "{} forecaster failed, substituting gbt value {}: {}",
                    kind.display_label(),
                    gbt_value,
                    e
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_fallbacks(kind, e.label());
                }
                BasePrediction::fallback(kind, gbt_value, e.to_string())
            }
        }
    }
}
