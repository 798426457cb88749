use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::coin::CoinRecord;
use crate::market::{MarketData, MarketError};

const ENDPOINT: &str = "https://api.coingecko.com/api/v3";

/// Provider-shaped market record, mapped to [`CoinRecord`] by field rename
/// only. The numeric fields are nullable on the provider side for freshly
/// listed coins, so they deserialize through `Option`.
#[derive(Deserialize, Debug, Clone)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub price_change_percentage_24h: Option<Decimal>,
}

impl From<MarketCoin> for CoinRecord {
    fn from(coin: MarketCoin) -> Self {
        CoinRecord {
            id: coin.id,
            name: coin.name,
            symbol: coin.symbol,
            current_price: coin.current_price.unwrap_or_default(),
            market_cap: coin.market_cap.unwrap_or_default(),
            price_change_percentage_24h: coin.price_change_percentage_24h.unwrap_or_default(),
            image: coin.image,
        }
    }
}

/// CoinGecko REST client. The demo API key is optional; when configured it is
/// sent both as a query parameter and a header, matching what the provider
/// accepts for demo-tier keys. No retries or backoff here.
#[derive(Debug, Clone, Default)]
pub struct CoinGecko {
    client: Client,
    api_key: Option<String>,
}

impl CoinGecko {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    async fn get_markets(
        &self,
        mut params: Vec<(&str, String)>,
    ) -> Result<Vec<MarketCoin>, MarketError> {
        if let Some(key) = &self.api_key {
            params.push(("x_cg_demo_api_key", key.clone()));
        }
        let url = Url::parse_with_params(format!("{ENDPOINT}/coins/markets").as_str(), &params)
            .map_err(|err| MarketError::Network(err.to_string()))?;
        debug!("GET {}", url);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| MarketError::Network(err.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(MarketError::RateLimited);
        }
        if !status.is_success() {
            return Err(MarketError::RequestFailed {
                status: status.as_u16(),
            });
        }

        response
            .json::<Vec<MarketCoin>>()
            .await
            .map_err(|err| MarketError::Network(err.to_string()))
    }
}

impl MarketData for CoinGecko {
    /// Top `limit` coins by market cap, USD prices with 24h change.
    async fn market_data(&self, limit: usize) -> Result<Vec<CoinRecord>, MarketError> {
        let params = vec![
            ("vs_currency", "usd".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", limit.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        let coins = self.get_markets(params).await?;
        Ok(coins.into_iter().map(CoinRecord::from).collect())
    }

    /// One coin by provider id. An empty result array means the id is
    /// unknown, which is distinct from a request failure.
    async fn coin_data(&self, id: &str) -> Result<CoinRecord, MarketError> {
        let params = vec![
            ("vs_currency", "usd".to_string()),
            ("ids", id.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        let coins = self.get_markets(params).await?;
        first_coin(id, coins)
    }
}

fn first_coin(id: &str, coins: Vec<MarketCoin>) -> Result<CoinRecord, MarketError> {
    coins
        .into_iter()
        .next()
        .map(CoinRecord::from)
        .ok_or_else(|| MarketError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn provider_record() -> serde_json::Value {
        json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 45230.50,
            "market_cap": 887654321098_u64,
            "price_change_percentage_24h": 2.34
        })
    }

    #[test]
    fn test_market_coin_from_json() {
        let coin: MarketCoin = serde_json::from_value(provider_record()).unwrap();
        let record = CoinRecord::from(coin);
        assert_eq!(record.id, "bitcoin");
        assert_eq!(record.symbol, "btc");
        assert_eq!(record.current_price, dec!(45230.50));
        assert_eq!(record.market_cap, dec!(887654321098));
        assert_eq!(record.price_change_percentage_24h, dec!(2.34));
    }

    #[test]
    fn test_market_coin_with_null_fields() {
        let json = json!({
            "id": "newcoin",
            "symbol": "new",
            "name": "New Coin",
            "image": "https://example.com/new.png",
            "current_price": null,
            "market_cap": null,
            "price_change_percentage_24h": null
        });
        let coin: MarketCoin = serde_json::from_value(json).unwrap();
        let record = CoinRecord::from(coin);
        assert_eq!(record.current_price, Decimal::ZERO);
    }

    #[test]
    fn test_empty_result_is_not_found() {
        let err = first_coin("nocoin", vec![]).unwrap_err();
        assert!(matches!(err, MarketError::NotFound(id) if id == "nocoin"));
    }

    #[test]
    fn test_first_coin_maps_the_match() {
        let coin: MarketCoin = serde_json::from_value(provider_record()).unwrap();
        let record = first_coin("bitcoin", vec![coin]).unwrap();
        assert_eq!(record.name, "Bitcoin");
    }
}
