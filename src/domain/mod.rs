// Domain-specific error types
pub mod errors;

// Candles and augmented series
pub mod market;

// Feature schema, predictions and presentation records
pub mod ml;

// Port interfaces
pub mod ports;
