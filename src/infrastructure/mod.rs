// HTTP plumbing shared by remote adapters
pub mod core;

// Market data sources
pub mod market_data;

// Prometheus metrics
pub mod observability;
