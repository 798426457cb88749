use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::coin::CoinRecord;
use crate::store::Store;

pub const PORTFOLIO_KEY: &str = "cryptoPortfolio";

/// A simulated owned quantity of a coin at a recorded purchase price. Not a
/// real trading position.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub coin_id: String,
    pub amount: Decimal,
    pub purchase_price: Decimal,
}

impl Holding {
    pub fn new(coin_id: &str, amount: Decimal, purchase_price: Decimal) -> Self {
        Self {
            coin_id: coin_id.to_string(),
            amount,
            purchase_price,
        }
    }
}

/// Example holdings written on first run so the portfolio view has
/// something to show.
pub fn sample_holdings() -> Vec<Holding> {
    vec![
        Holding::new("bitcoin", dec!(0.025), dec!(42000)),
        Holding::new("ethereum", dec!(0.5), dec!(2500)),
        Holding::new("cardano", dec!(1000), dec!(0.45)),
    ]
}

/// Persisted holdings, seeded with the sample data when the key is absent or
/// unreadable.
#[derive(Debug)]
pub struct Portfolio {
    holdings: Vec<Holding>,
    store: Store,
}

impl Portfolio {
    pub fn load(store: Store) -> Self {
        match store.load::<Vec<Holding>>(PORTFOLIO_KEY) {
            Some(holdings) => Self { holdings, store },
            None => {
                let holdings = sample_holdings();
                store.save(PORTFOLIO_KEY, &holdings);
                Self { holdings, store }
            }
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn add(&mut self, holding: Holding) {
        self.holdings.push(holding);
        self.store.save(PORTFOLIO_KEY, &self.holdings);
    }

    pub fn remove(&mut self, coin_id: &str) {
        self.holdings.retain(|h| h.coin_id != coin_id);
        self.store.save(PORTFOLIO_KEY, &self.holdings);
    }
}

/// One valuated holding.
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    pub holding: Holding,
    pub coin: CoinRecord,
    pub current_value: Decimal,
    pub purchase_value: Decimal,
    pub gain_loss: Decimal,
    /// `None` when the purchase value is zero, where a percentage is
    /// undefined.
    pub gain_loss_percent: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortfolioView {
    pub positions: Vec<Position>,
    pub total_value: Decimal,
    pub total_gain_loss: Decimal,
    pub overall_gain_loss_percent: Decimal,
}

/// Values holdings against current prices. Holdings without a matching coin
/// record are skipped entirely, not valued at zero. Pure.
pub fn valuate(holdings: &[Holding], coins: &[CoinRecord]) -> PortfolioView {
    let mut positions = Vec::new();
    for holding in holdings {
        let Some(coin) = coins.iter().find(|c| c.id == holding.coin_id) else {
            continue;
        };
        let current_value = holding.amount * coin.current_price;
        let purchase_value = holding.amount * holding.purchase_price;
        let gain_loss = current_value - purchase_value;
        let gain_loss_percent =
            (!purchase_value.is_zero()).then(|| gain_loss / purchase_value * dec!(100));
        positions.push(Position {
            holding: holding.clone(),
            coin: coin.clone(),
            current_value,
            purchase_value,
            gain_loss,
            gain_loss_percent,
        });
    }

    let total_value: Decimal = positions.iter().map(|p| p.current_value).sum();
    let total_gain_loss: Decimal = positions.iter().map(|p| p.gain_loss).sum();
    let invested = total_value - total_gain_loss;
    let overall_gain_loss_percent = if total_value.is_zero() || invested.is_zero() {
        Decimal::ZERO
    } else {
        total_gain_loss / invested * dec!(100)
    };

    PortfolioView {
        positions,
        total_value,
        total_gain_loss,
        overall_gain_loss_percent,
    }
}
