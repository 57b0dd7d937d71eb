use crate::domain::errors::FeatureGenerationError;
use crate::domain::market::series::{CLOSE, HIGH, LOW, OPEN};
use crate::domain::market::{AugmentedSeries, ColumnLabel};
use crate::domain::ports::SeriesAugmenter;

#[derive(Debug, Clone, Copy)]
struct Body {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Body {
    fn size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    fn range(&self) -> f64 {
        self.high - self.low
    }

    fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Single and two-bar candlestick patterns as 0/1 flags.
pub struct CandlePatterns {
    /// Body-to-range ratio under which a bar counts as a doji
    pub doji_body_ratio: f64,
    /// Minimum shadow-to-body ratio for hammer and shooting star
    pub shadow_ratio: f64,
}

impl Default for CandlePatterns {
    fn default() -> Self {
        Self {
            doji_body_ratio: 0.1,
            shadow_ratio: 2.0,
        }
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl CandlePatterns {
    fn doji(&self, bar: &Body) -> f64 {
        flag(bar.range() > 0.0 && bar.size() <= self.doji_body_ratio * bar.range())
    }

    fn hammer(&self, bar: &Body) -> f64 {
        let body = bar.size();
        flag(
            bar.range() > 0.0
                && body > 0.0
                && bar.lower_shadow() >= self.shadow_ratio * body
                && bar.upper_shadow() <= body,
        )
    }

    fn shooting_star(&self, bar: &Body) -> f64 {
        let body = bar.size();
        flag(
            bar.range() > 0.0
                && body > 0.0
                && bar.upper_shadow() >= self.shadow_ratio * body
                && bar.lower_shadow() <= body,
        )
    }

    fn bullish_engulfing(prev: &Body, bar: &Body) -> f64 {
        flag(
            prev.is_bearish()
                && bar.is_bullish()
                && bar.open <= prev.close
                && bar.close >= prev.open,
        )
    }

    fn bearish_engulfing(prev: &Body, bar: &Body) -> f64 {
        flag(
            prev.is_bullish()
                && bar.is_bearish()
                && bar.open >= prev.close
                && bar.close <= prev.open,
        )
    }
}

impl SeriesAugmenter for CandlePatterns {
    fn augment(
        &self,
        mut series: AugmentedSeries,
    ) -> Result<AugmentedSeries, FeatureGenerationError> {
        let open = series.require(OPEN)?;
        let high = series.require(HIGH)?;
        let low = series.require(LOW)?;
        let close = series.require(CLOSE)?;

        let bodies: Vec<Option<Body>> = (0..series.len())
            .map(|i| {
                let bar = Body {
                    open: open[i]?,
                    high: high[i]?,
                    low: low[i]?,
                    close: close[i]?,
                };
                [bar.open, bar.high, bar.low, bar.close]
                    .iter()
                    .all(|v| v.is_finite())
                    .then_some(bar)
            })
            .collect();

        let single = |f: &dyn Fn(&Body) -> f64| -> Vec<Option<f64>> {
            bodies.iter().map(|b| b.as_ref().map(f)).collect()
        };
        let paired = |f: fn(&Body, &Body) -> f64| -> Vec<Option<f64>> {
            (0..bodies.len())
                .map(|i| {
                    let prev = bodies[i.checked_sub(1)?].as_ref()?;
                    let bar = bodies[i].as_ref()?;
                    Some(f(prev, bar))
                })
                .collect()
        };

        let columns = vec![
            ("Doji", single(&|b| self.doji(b))),
            ("Hammer", single(&|b| self.hammer(b))),
            ("Shooting_Star", single(&|b| self.shooting_star(b))),
            ("Bullish_Engulfing", paired(Self::bullish_engulfing)),
            ("Bearish_Engulfing", paired(Self::bearish_engulfing)),
        ];

        for (name, values) in columns {
            series.push_column(ColumnLabel::flat(name), values)?;
        }
        Ok(series)
    }

    fn name(&self) -> &str {
        "candle_patterns"
    }
}
