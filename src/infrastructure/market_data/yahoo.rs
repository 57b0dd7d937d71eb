use crate::domain::market::{BarRequest, Candle};
use crate::domain::ports::MarketDataSource;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::{debug, info};

/// Daily (or intraday) bars from the Yahoo Finance chart API.
pub struct YahooChartSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Converts the column arrays of a chart response into candles. Bars with a
/// null price are skipped; a null volume counts as zero.
fn parse_chart(symbol: &str, body: ChartResponse) -> Result<Vec<Candle>> {
    if let Some(error) = body.chart.error {
        anyhow::bail!("Yahoo chart error {}: {}", error.code, error.description);
    }
    let result = body
        .chart
        .result
        .and_then(|mut results| results.pop())
        .context("Yahoo chart response has no result")?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default();

    let decimal = |v: Option<&Option<f64>>| v.copied().flatten().and_then(Decimal::from_f64);

    let mut skipped = 0usize;
    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &timestamp) in result.timestamp.iter().enumerate() {
        let prices = (
            decimal(quote.open.get(i)),
            decimal(quote.high.get(i)),
            decimal(quote.low.get(i)),
            decimal(quote.close.get(i)),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = prices else {
            skipped += 1;
            continue;
        };
        candles.push(Candle {
            symbol: symbol.to_string(),
            open,
            high,
            low,
            close,
            volume: decimal(quote.volume.get(i)).unwrap_or(Decimal::ZERO),
            timestamp,
        });
    }

    if skipped > 0 {
        debug!("Skipped {} Yahoo bars with missing prices", skipped);
    }
    Ok(candles)
}

#[async_trait]
impl MarketDataSource for YahooChartSource {
    async fn fetch_candles(&self, request: &BarRequest) -> Result<Vec<Candle>> {
        let url = build_url_with_query(
            &self.base_url,
            &format!("/v8/finance/chart/{}", request.symbol),
            &[
                ("interval", request.interval.as_str()),
                ("range", request.range.as_str()),
            ],
        )?;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .context("Failed to fetch Yahoo chart")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo chart fetch failed ({}): {}", status, error_text);
        }

        let body: ChartResponse = response
            .json()
            .await
            .context("Failed to parse Yahoo chart response")?;
        let candles = parse_chart(&request.symbol, body)?;
        if candles.is_empty() {
            anyhow::bail!("Yahoo returned no bars for {}", request.symbol);
        }

        info!("Fetched {} bars for {}", candles.len(), request.symbol);
        Ok(candles)
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_chart_skips_null_bars() {
        let body: ChartResponse = serde_json::from_str(
            r#"{
                "chart": {
                    "result": [{
                        "meta": {"symbol": "EURUSD=X"},
                        "timestamp": [1700000000, 1700086400, 1700172800],
                        "indicators": {"quote": [{
                            "open":   [1.05, null, 1.07],
                            "high":   [1.06, 1.08, 1.08],
                            "low":    [1.04, 1.05, 1.06],
                            "close":  [1.055, 1.07, 1.075],
                            "volume": [0, 0, null]
                        }]}
                    }],
                    "error": null
                }
            }"#,
        )
        .unwrap();

        let candles = parse_chart("EURUSD=X", body).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].timestamp, 1700172800);
        assert!((candles[1].close - dec!(1.075)).abs() < dec!(0.000001));
        assert_eq!(candles[1].volume, Decimal::ZERO);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();

        let err = parse_chart("NOPE", body).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }
}
