//! Prometheus metrics definitions for stackcast
//!
//! All metrics use the `stackcast_` prefix.

use crate::domain::ml::types::ModelKind;
use prometheus::{
    CounterVec, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;
use std::time::Instant;

/// Observes the elapsed seconds into its histogram when dropped.
pub struct LatencyGuard {
    start: Instant,
    histogram: Histogram,
}

impl LatencyGuard {
    fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }
}

impl Drop for LatencyGuard {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Prometheus metrics for the forecast pipeline
#[derive(Clone)]
pub struct ForecastMetrics {
    registry: Arc<Registry>,
    /// Forecast requests by outcome (success, precondition, primary_failure, combiner_failure)
    pub forecasts_total: CounterVec,
    /// Base forecasts replaced by the gradient-boosted-tree value
    pub fallbacks_total: CounterVec,
    /// Base forecaster and combiner latency
    pub model_latency_seconds: HistogramVec,
    /// Last final prediction
    pub final_prediction: GenericGauge<AtomicF64>,
}

impl ForecastMetrics {
    /// Create a new metrics instance with every collector registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let forecasts_total = CounterVec::new(
            Opts::new("stackcast_forecasts_total", "Forecast requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(forecasts_total.clone()))?;

        let fallbacks_total = CounterVec::new(
            Opts::new(
                "stackcast_fallbacks_total",
                "Base forecasts substituted with the gradient-boosted-tree value",
            ),
            &["model", "reason"],
        )?;
        registry.register(Box::new(fallbacks_total.clone()))?;

        let model_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "stackcast_model_latency_seconds",
                "Model invocation latency in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5]),
            &["model"],
        )?;
        registry.register(Box::new(model_latency_seconds.clone()))?;

        let final_prediction = Gauge::with_opts(Opts::new(
            "stackcast_final_prediction",
            "Most recent stacked prediction",
        ))?;
        registry.register(Box::new(final_prediction.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            forecasts_total,
            fallbacks_total,
            model_latency_seconds,
            final_prediction,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_forecasts(&self, outcome: &str) {
        self.forecasts_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_fallbacks(&self, model: ModelKind, reason: &str) {
        self.fallbacks_total
            .with_label_values(&[model.column(), reason])
            .inc();
    }

    /// Starts a latency measurement recorded when the guard drops.
    pub fn time_model(&self, label: &str) -> LatencyGuard {
        LatencyGuard::start(self.model_latency_seconds.with_label_values(&[label]))
    }

    pub fn set_final_prediction(&self, value: f64) {
        self.final_prediction.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ForecastMetrics::new().expect("Failed to create metrics");
        metrics.inc_forecasts("success");
        assert!(metrics.render().contains("stackcast_"));
    }

    #[test]
    fn test_fallback_counter_per_model() {
        let metrics = ForecastMetrics::new().expect("Failed to create metrics");
        metrics.inc_fallbacks(ModelKind::Statistical, "timeout");
        metrics.inc_fallbacks(ModelKind::Decomposition, "fit_mismatch");
        let output = metrics.render();
        assert!(output.contains("stackcast_fallbacks_total"));
        assert!(output.contains("model=\"stat\""));
        assert!(output.contains("model=\"decomp\""));
    }

    #[test]
    fn test_final_prediction_gauge() {
        let metrics = ForecastMetrics::new().expect("Failed to create metrics");
        metrics.set_final_prediction(1.25);
        assert!(metrics.render().contains("stackcast_final_prediction 1.25"));
    }

    #[test]
    fn test_model_latency_recorded_on_drop() {
        let metrics = ForecastMetrics::new().expect("Failed to create metrics");
        {
            let _guard = metrics.time_model("gbt");
        }
        let histogram = metrics.model_latency_seconds.with_label_values(&["gbt"]);
        assert_eq!(histogram.get_sample_count(), 1);
    }
}
