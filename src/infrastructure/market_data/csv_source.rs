use crate::domain::market::{BarRequest, Candle};
use crate::domain::ports::MarketDataSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// One CSV row. Header names follow the common OHLCV export layout.
#[derive(Debug, Deserialize)]
struct BarRecord {
    #[serde(alias = "Date", alias = "date", alias = "Datetime", alias = "Timestamp")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: String,
    #[serde(alias = "High")]
    high: String,
    #[serde(alias = "Low")]
    low: String,
    #[serde(alias = "Close")]
    close: String,
    #[serde(alias = "Volume", default)]
    volume: Option<String>,
}

/// Bars read from a local CSV file.
pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Unix seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare date (midnight UTC).
fn parse_timestamp(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Ok(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Unrecognized timestamp '{}'", raw))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .with_context(|| format!("Invalid date '{}'", raw))
}

/// `None` for empty or `null` cells, as written by some exporters for holidays.
fn parse_price(raw: &str) -> Result<Option<Decimal>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Some)
        .with_context(|| format!("Invalid number '{}'", raw))
}

fn read_candles<R: Read>(reader: R, symbol: &str) -> Result<Vec<Candle>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut candles = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in rdr.deserialize::<BarRecord>().enumerate() {
        let record = result.with_context(|| format!("Malformed CSV record {}", line + 1))?;
        let timestamp = parse_timestamp(&record.timestamp)?;

        let (Some(open), Some(high), Some(low), Some(close)) = (
            parse_price(&record.open)?,
            parse_price(&record.high)?,
            parse_price(&record.low)?,
            parse_price(&record.close)?,
        ) else {
            skipped += 1;
            continue;
        };
        let volume = match &record.volume {
            Some(raw) => parse_price(raw)?.unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        };

        candles.push(Candle {
            symbol: symbol.to_string(),
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        });
    }

    if skipped > 0 {
        debug!("Skipped {} CSV rows with missing prices", skipped);
    }
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

#[async_trait]
impl MarketDataSource for CsvBarSource {
    async fn fetch_candles(&self, request: &BarRequest) -> Result<Vec<Candle>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Failed to open bars file {:?}", self.path))?;
        let candles = read_candles(std::io::BufReader::new(file), &request.symbol)?;
        if candles.is_empty() {
            anyhow::bail!("Bars file {:?} contains no complete bars", self.path);
        }

        info!("Loaded {} bars for {} from {:?}", candles.len(), request.symbol, self.path);
        Ok(candles)
    }

    fn name(&self) -> &str {
        "CSV file"
    }
}
