//! Forecast observability: Prometheus collectors rendered as text on demand.

pub mod metrics;

pub use metrics::{ForecastMetrics, LatencyGuard};
