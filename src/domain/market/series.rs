//! Column-oriented view of a candle sequence that feature generators extend.
//!
//! Base OHLCV columns carry composite labels `(field, symbol)` the way
//! multi-ticker downloads label them; generator columns are flat. Consumers
//! look columns up by their normalized name.

use super::types::Candle;
use crate::domain::errors::FeatureGenerationError;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

/// Label of a series column, either a plain name or a multi-level label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnLabel {
    Flat(String),
    Composite(Vec<String>),
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        ColumnLabel::Flat(name.into())
    }

    pub fn composite<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnLabel::Composite(parts.into_iter().map(Into::into).collect())
    }

    /// Flat key: whitespace trimmed, composite labels collapsed to their
    /// primary (first) component.
    pub fn normalized(&self) -> String {
        match self {
            ColumnLabel::Flat(name) => name.trim().to_string(),
            ColumnLabel::Composite(parts) => parts
                .first()
                .map(|p| p.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: ColumnLabel,
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// Value at `row`, `None` when missing or non-finite.
    pub fn value(&self, row: usize) -> Option<f64> {
        self.values
            .get(row)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedSeries {
    symbol: String,
    timestamps: Vec<i64>,
    columns: Vec<Column>,
}

impl AugmentedSeries {
    pub fn new(symbol: impl Into<String>, timestamps: Vec<i64>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamps,
            columns: Vec::new(),
        }
    }

    /// Builds the base OHLCV columns from raw candles, preserving their order.
    pub fn from_candles(symbol: &str, candles: &[Candle]) -> Self {
        let timestamps = candles.iter().map(|c| c.timestamp).collect();
        let mut series = Self::new(symbol, timestamps);

        let fields: [(&str, fn(&Candle) -> Option<f64>); 5] = [
            (OPEN, |c| c.open.to_f64()),
            (HIGH, |c| c.high.to_f64()),
            (LOW, |c| c.low.to_f64()),
            (CLOSE, |c| c.close.to_f64()),
            (VOLUME, |c| c.volume.to_f64()),
        ];
        for (name, extract) in fields {
            series.columns.push(Column {
                label: ColumnLabel::composite([name, symbol]),
                values: candles.iter().map(extract).collect(),
            });
        }
        series
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First column whose normalized label equals `name`.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label.normalized() == name)
    }

    /// Values of a required column, or `MissingColumn`.
    pub fn require(&self, name: &str) -> Result<&[Option<f64>], FeatureGenerationError> {
        self.column(name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| FeatureGenerationError::MissingColumn {
                name: name.to_string(),
            })
    }

    pub fn push_column(
        &mut self,
        label: ColumnLabel,
        values: Vec<Option<f64>>,
    ) -> Result<(), FeatureGenerationError> {
        if values.len() != self.len() {
            return Err(FeatureGenerationError::LengthMismatch {
                name: label.normalized(),
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column { label, values });
        Ok(())
    }

    /// A row is complete when every column holds a finite value.
    pub fn is_complete(&self, row: usize) -> bool {
        row < self.len() && self.columns.iter().all(|c| c.value(row).is_some())
    }

    /// Index of the most recent complete row.
    pub fn latest_complete_row(&self) -> Option<usize> {
        (0..self.len()).rev().find(|&row| self.is_complete(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(ts: i64, close: rust_decimal::Decimal) -> Candle {
        Candle {
            symbol: "EURUSD=X".to_string(),
            open: close,
            high: close + dec!(0.01),
            low: close - dec!(0.01),
            close,
            volume: dec!(0),
            timestamp: ts,
        }
    }

    #[test]
    fn test_label_normalization() {
        assert_eq!(ColumnLabel::flat("  RSI ").normalized(), "RSI");
        assert_eq!(
            ColumnLabel::composite([" Close ", "EURUSD=X"]).normalized(),
            "Close"
        );
        assert_eq!(ColumnLabel::Composite(vec![]).normalized(), "");
    }

    #[test]
    fn test_from_candles_builds_composite_columns() {
        let series = AugmentedSeries::from_candles(
            "EURUSD=X",
            &[candle(1, dec!(1.10)), candle(2, dec!(1.20))],
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.columns().len(), 5);
        let close = series.column("Close").unwrap();
        assert_eq!(
            close.label,
            ColumnLabel::composite(["Close", "EURUSD=X"])
        );
        assert_eq!(close.value(1), Some(1.2));
    }

    #[test]
    fn test_push_column_rejects_length_mismatch() {
        let mut series = AugmentedSeries::from_candles("X", &[candle(1, dec!(1))]);
        let err = series
            .push_column(ColumnLabel::flat("RSI"), vec![Some(1.0), Some(2.0)])
            .unwrap_err();
        assert!(matches!(err, FeatureGenerationError::LengthMismatch { .. }));
    }

    #[test]
    fn test_latest_complete_row_skips_missing_and_nan() {
        let mut series = AugmentedSeries::from_candles(
            "X",
            &[candle(1, dec!(1)), candle(2, dec!(2)), candle(3, dec!(3))],
        );
        series
            .push_column(
                ColumnLabel::flat("RSI"),
                vec![Some(40.0), Some(50.0), Some(f64::NAN)],
            )
            .unwrap();

        assert!(!series.is_complete(2));
        assert_eq!(series.latest_complete_row(), Some(1));
    }
}
