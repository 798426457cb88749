use thiserror::Error;

use crate::coin::CoinRecord;

pub mod coingecko;

/// Failure taxonomy for the market data provider. Every variant carries a
/// message fit for the error banner; the fetch controller decides what to do
/// with it, this layer never retries.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("API rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("API request failed with status {status}")]
    RequestFailed { status: u16 },

    #[error("Failed to fetch cryptocurrency data. Please check your internet connection.")]
    Network(String),

    #[error("Coin with id \"{0}\" not found.")]
    NotFound(String),
}

/// Seam between the fetch controller and the provider, so the controller can
/// be driven by a stub in tests.
pub trait MarketData {
    async fn market_data(&self, limit: usize) -> Result<Vec<CoinRecord>, MarketError>;
    async fn coin_data(&self, id: &str) -> Result<CoinRecord, MarketError>;
}
