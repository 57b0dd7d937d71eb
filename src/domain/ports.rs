use crate::domain::errors::FeatureGenerationError;
use crate::domain::market::{AugmentedSeries, BarRequest, Candle};
use crate::domain::ml::presentation::Presentation;
use anyhow::Result;
use async_trait::async_trait;

// Need async_trait for async functions in traits
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Time-ordered candles, oldest first.
    async fn fetch_candles(&self, request: &BarRequest) -> Result<Vec<Candle>>;

    fn name(&self) -> &str;
}

/// Adds feature columns to a series.
///
/// Implementations must not reorder rows and must leave rows without a full
/// lookback window as `None` so the assembler can drop them.
pub trait SeriesAugmenter: Send + Sync {
    fn augment(&self, series: AugmentedSeries) -> Result<AugmentedSeries, FeatureGenerationError>;

    fn name(&self) -> &str;
}

/// Renders a finished forecast for the caller.
pub trait ResultPresenter {
    fn render(&self, presentation: &Presentation) -> Result<String>;
}
