pub mod artifacts;
pub mod fallback;
pub mod pipeline;

pub use artifacts::ModelArtifacts;
pub use fallback::FallbackController;
pub use pipeline::{ForecastOutcome, ForecastPipeline};
