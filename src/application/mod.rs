// Series augmenters and feature-row assembly
pub mod features;

// Fallback control and the forecast pipeline
pub mod forecast;

// Base forecasters, tree backends and stacking combiners
pub mod ml;
