pub mod candle_patterns;
pub mod feature_assembler;
pub mod technical_indicators;

pub use candle_patterns::CandlePatterns;
pub use feature_assembler::FeatureAssembler;
pub use technical_indicators::{IndicatorConfig, TechnicalIndicators};
