use crate::domain::errors::FeatureGenerationError;
use crate::domain::market::series::{CLOSE, HIGH, LOW, OPEN, VOLUME};
use crate::domain::market::{AugmentedSeries, ColumnLabel};
use crate::domain::ports::SeriesAugmenter;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage,
    MovingAverageConvergenceDivergence, RelativeStrengthIndex, SimpleMovingAverage,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub sma_fast_period: usize,
    pub sma_slow_period: usize,
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            sma_fast_period: 20,
            sma_slow_period: 50,
            ema_fast_period: 12,
            ema_slow_period: 26,
            bb_period: 20,
            bb_std_dev: 2.0,
            atr_period: 14,
        }
    }
}

/// Momentum, trend, volatility and return columns computed with `ta`.
///
/// Each indicator only reports a value once it has seen a full lookback
/// window of valid inputs; earlier rows stay `None`.
pub struct TechnicalIndicators {
    config: IndicatorConfig,
}

impl TechnicalIndicators {
    pub fn new(config: IndicatorConfig) -> Result<Self, FeatureGenerationError> {
        // Validate periods up front
        RelativeStrengthIndex::new(config.rsi_period).map_err(invalid)?;
        MovingAverageConvergenceDivergence::new(
            config.macd_fast_period,
            config.macd_slow_period,
            config.macd_signal_period,
        )
        .map_err(invalid)?;
        SimpleMovingAverage::new(config.sma_fast_period).map_err(invalid)?;
        SimpleMovingAverage::new(config.sma_slow_period).map_err(invalid)?;
        ExponentialMovingAverage::new(config.ema_fast_period).map_err(invalid)?;
        ExponentialMovingAverage::new(config.ema_slow_period).map_err(invalid)?;
        BollingerBands::new(config.bb_period, config.bb_std_dev).map_err(invalid)?;
        AverageTrueRange::new(config.atr_period).map_err(invalid)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }
}

impl Default for TechnicalIndicators {
    fn default() -> Self {
        Self {
            config: IndicatorConfig::default(),
        }
    }
}

fn invalid<E: std::fmt::Debug>(e: E) -> FeatureGenerationError {
    FeatureGenerationError::InvalidParameter {
        reason: format!("{:?}", e),
    }
}

/// Feeds every valid input to `step`; a row gets the step's output only once
/// `warmup` valid inputs have been seen.
fn warmed<X, T, F>(inputs: impl Iterator<Item = Option<X>>, warmup: usize, mut step: F) -> Vec<Option<T>>
where
    F: FnMut(X) -> T,
{
    let mut seen = 0usize;
    inputs
        .map(|input| {
            let x = input?;
            seen += 1;
            let out = step(x);
            (seen >= warmup).then_some(out)
        })
        .collect()
}

struct BarPoint {
    high: f64,
    low: f64,
    close: f64,
}

impl ta::High for BarPoint {
    fn high(&self) -> f64 {
        self.high
    }
}

impl ta::Low for BarPoint {
    fn low(&self) -> f64 {
        self.low
    }
}

impl ta::Close for BarPoint {
    fn close(&self) -> f64 {
        self.close
    }
}

fn finite(v: &Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

impl SeriesAugmenter for TechnicalIndicators {
    fn augment(
        &self,
        mut series: AugmentedSeries,
    ) -> Result<AugmentedSeries, FeatureGenerationError> {
        let cfg = &self.config;
        let close: Vec<Option<f64>> = series.require(CLOSE)?.iter().map(finite).collect();
        series.require(OPEN)?;
        let high: Vec<Option<f64>> = series.require(HIGH)?.iter().map(finite).collect();
        let low: Vec<Option<f64>> = series.require(LOW)?.iter().map(finite).collect();
        series.require(VOLUME)?;

        let mut rsi = RelativeStrengthIndex::new(cfg.rsi_period).map_err(invalid)?;
        let rsi_values = warmed(close.iter().copied(), cfg.rsi_period + 1, |p| rsi.next(p));

        let mut macd = MovingAverageConvergenceDivergence::new(
            cfg.macd_fast_period,
            cfg.macd_slow_period,
            cfg.macd_signal_period,
        )
        .map_err(invalid)?;
        let macd_out = warmed(
            close.iter().copied(),
            cfg.macd_slow_period + cfg.macd_signal_period - 1,
            |p| macd.next(p),
        );

        let mut sma_fast = SimpleMovingAverage::new(cfg.sma_fast_period).map_err(invalid)?;
        let mut sma_slow = SimpleMovingAverage::new(cfg.sma_slow_period).map_err(invalid)?;
        let mut ema_fast = ExponentialMovingAverage::new(cfg.ema_fast_period).map_err(invalid)?;
        let mut ema_slow = ExponentialMovingAverage::new(cfg.ema_slow_period).map_err(invalid)?;
        let sma_fast_values = warmed(close.iter().copied(), cfg.sma_fast_period, |p| {
            sma_fast.next(p)
        });
        let sma_slow_values = warmed(close.iter().copied(), cfg.sma_slow_period, |p| {
            sma_slow.next(p)
        });
        let ema_fast_values = warmed(close.iter().copied(), cfg.ema_fast_period, |p| {
            ema_fast.next(p)
        });
        let ema_slow_values = warmed(close.iter().copied(), cfg.ema_slow_period, |p| {
            ema_slow.next(p)
        });

        let mut bb = BollingerBands::new(cfg.bb_period, cfg.bb_std_dev).map_err(invalid)?;
        let bb_out = warmed(close.iter().copied(), cfg.bb_period, |p| bb.next(p));

        // ATR needs the full bar, rows with any missing OHLC are skipped
        let mut atr = AverageTrueRange::new(cfg.atr_period).map_err(invalid)?;
        let bars = (0..series.len()).map(|i| {
            Some(BarPoint {
                high: high[i]?,
                low: low[i]?,
                close: close[i]?,
            })
        });
        let atr_values = warmed(bars, cfg.atr_period + 1, |bar| atr.next(&bar));

        let returns: Vec<Option<f64>> = (0..series.len())
            .map(|i| {
                let prev = close[i.checked_sub(1)?]?;
                let curr = close[i]?;
                (prev != 0.0).then(|| curr / prev - 1.0)
            })
            .collect();

        let columns: Vec<(String, Vec<Option<f64>>)> = vec![
            ("RSI".to_string(), rsi_values),
            ("MACD".to_string(), macd_out.iter().map(|o| o.as_ref().map(|m| m.macd)).collect()),
            (
                "MACD_Signal".to_string(),
                macd_out.iter().map(|o| o.as_ref().map(|m| m.signal)).collect(),
            ),
            (
                "MACD_Hist".to_string(),
                macd_out.iter().map(|o| o.as_ref().map(|m| m.histogram)).collect(),
            ),
            (format!("SMA_{}", cfg.sma_fast_period), sma_fast_values),
            (format!("SMA_{}", cfg.sma_slow_period), sma_slow_values),
            (format!("EMA_{}", cfg.ema_fast_period), ema_fast_values),
            (format!("EMA_{}", cfg.ema_slow_period), ema_slow_values),
            ("BB_Upper".to_string(), bb_out.iter().map(|o| o.as_ref().map(|b| b.upper)).collect()),
            (
                "BB_Middle".to_string(),
                bb_out.iter().map(|o| o.as_ref().map(|b| b.average)).collect(),
            ),
            ("BB_Lower".to_string(), bb_out.iter().map(|o| o.as_ref().map(|b| b.lower)).collect()),
            ("ATR".to_string(), atr_values),
            ("Return_1".to_string(), returns),
        ];

        for (name, values) in columns {
            series.push_column(ColumnLabel::Flat(name), values)?;
        }
        Ok(series)
    }

    fn name(&self) -> &str {
        "technical_indicators"
    }
}
