use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One raw OHLCV bar as delivered by a market data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    /// Bar open time, unix seconds
    pub timestamp: i64,
}

/// What to fetch from a market data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRequest {
    pub symbol: String,
    /// Bar interval, e.g. "1d" or "1h"
    pub interval: String,
    /// Lookback range, e.g. "5y"
    pub range: String,
}

impl BarRequest {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            range: range.into(),
        }
    }
}

impl Default for BarRequest {
    fn default() -> Self {
        Self::new("EURUSD=X", "1d", "5y")
    }
}
