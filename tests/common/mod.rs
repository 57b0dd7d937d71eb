#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use stackcast::domain::market::Candle;

pub const DAY: i64 = 86_400;
pub const START: i64 = 1_700_006_400;

/// Seeded random walk of daily FX-like bars around 1.08.
pub fn random_walk(n: usize, seed: u64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 1.08_f64;

    (0..n)
        .map(|i| {
            let open = close;
            close = (open * (1.0 + rng.random_range(-0.006..0.006))).max(0.5);
            let high = open.max(close) * (1.0 + rng.random_range(0.0..0.003));
            let low = open.min(close) * (1.0 - rng.random_range(0.0..0.003));
            candle(START + i as i64 * DAY, open, high, low, close)
        })
        .collect()
}

pub fn candle(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    let price = |v: f64| Decimal::from_f64(v).unwrap_or(Decimal::ZERO).round_dp(5);
    Candle {
        symbol: "EURUSD=X".to_string(),
        open: price(open),
        high: price(high),
        low: price(low),
        close: price(close),
        volume: dec!(0),
        timestamp,
    }
}
