use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::coin::CoinRecord;

pub const SERIES_POINTS: usize = 24;

/// Synthetic 24h price series for the detail view. Starts from the implied
/// price 24h ago (current price backed out by the 24h change), jitters each
/// point by up to ±5% of that base, and trends linearly toward the current
/// price so the last point lands near it.
pub fn price_series(current_price: Decimal, change_percent: Decimal) -> Vec<f64> {
    let current = current_price.to_f64().unwrap_or(0.0);
    let change = change_percent.to_f64().unwrap_or(0.0);
    let base = current - current * change / 100.0;

    let mut rng = rand::rng();
    (0..SERIES_POINTS)
        .map(|i| {
            let variation: f64 = rng.random_range(-0.05..=0.05);
            let trend = (current - base) * (i as f64 / (SERIES_POINTS - 1) as f64);
            base + base * variation + trend
        })
        .collect()
}

pub fn coin_series(coin: &CoinRecord) -> Vec<f64> {
    price_series(coin.current_price, coin.price_change_percentage_24h)
}
