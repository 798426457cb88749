use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A single market record for a coin, USD denominated. Replaced wholesale on
/// every refetch; never mutated in place.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CoinRecord {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: Decimal,
    pub market_cap: Decimal,
    pub price_change_percentage_24h: Decimal,
    pub image: String,
}

impl CoinRecord {
    pub fn new(
        id: &str,
        name: &str,
        symbol: &str,
        current_price: Decimal,
        market_cap: Decimal,
        price_change_percentage_24h: Decimal,
        image: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            current_price,
            market_cap,
            price_change_percentage_24h,
            image: image.to_string(),
        }
    }
}

/// Fixed in-memory table used when the live fetch fails or is disabled.
/// Emoji placeholders stand in for image URLs.
pub fn fallback_coins() -> Vec<CoinRecord> {
    vec![
        CoinRecord::new(
            "bitcoin",
            "Bitcoin",
            "BTC",
            dec!(45230.50),
            dec!(887654321098),
            dec!(2.34),
            "🟡",
        ),
        CoinRecord::new(
            "ethereum",
            "Ethereum",
            "ETH",
            dec!(2890.75),
            dec!(347234567890),
            dec!(-1.23),
            "🔵",
        ),
        CoinRecord::new(
            "binancecoin",
            "BNB",
            "BNB",
            dec!(315.42),
            dec!(48765432109),
            dec!(0.87),
            "🟨",
        ),
        CoinRecord::new(
            "cardano",
            "Cardano",
            "ADA",
            dec!(0.52),
            dec!(18123456789),
            dec!(4.56),
            "🔷",
        ),
        CoinRecord::new(
            "solana",
            "Solana",
            "SOL",
            dec!(98.76),
            dec!(43987654321),
            dec!(-2.91),
            "🟣",
        ),
        CoinRecord::new(
            "xrp",
            "XRP",
            "XRP",
            dec!(0.63),
            dec!(34567891234),
            dec!(1.78),
            "⚪",
        ),
        CoinRecord::new(
            "polkadot",
            "Polkadot",
            "DOT",
            dec!(7.23),
            dec!(9876543210),
            dec!(-0.45),
            "⚫",
        ),
        CoinRecord::new(
            "dogecoin",
            "Dogecoin",
            "DOGE",
            dec!(0.082),
            dec!(12345678901),
            dec!(3.21),
            "🟠",
        ),
    ]
}

/// The first `limit` fallback records, in market-cap order.
pub fn fallback_slice(limit: usize) -> Vec<CoinRecord> {
    fallback_coins().into_iter().take(limit).collect()
}

pub fn format_price(price: Decimal) -> String {
    let rounded = price.round_dp(2);
    let s = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac_part}")
}

pub fn format_market_cap(market_cap: Decimal) -> String {
    if market_cap >= dec!(1000000000000) {
        format!("${:.2}T", market_cap / dec!(1000000000000))
    } else if market_cap >= dec!(1000000000) {
        format!("${:.2}B", market_cap / dec!(1000000000))
    } else if market_cap >= dec!(1000000) {
        format!("${:.2}M", market_cap / dec!(1000000))
    } else {
        format!("${}", market_cap)
    }
}

pub fn format_percentage(percentage: Decimal) -> String {
    let sign = if percentage >= Decimal::ZERO { "+" } else { "" };
    format!("{sign}{:.2}%", percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_table() {
        let coins = fallback_coins();
        assert_eq!(coins.len(), 8);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[0].current_price, dec!(45230.50));
        assert_eq!(coins[1].symbol, "ETH");
    }

    #[test]
    fn test_fallback_slice() {
        let coins = fallback_slice(3);
        assert_eq!(coins.len(), 3);
        assert_eq!(coins[2].id, "binancecoin");

        // limit larger than the table just returns everything
        assert_eq!(fallback_slice(100).len(), 8);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(dec!(45230.50)), "$45,230.50");
        assert_eq!(format_price(dec!(0.082)), "$0.08");
        assert_eq!(format_price(dec!(1000000)), "$1,000,000.00");
        assert_eq!(format_price(dec!(-12.5)), "-$12.50");
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(dec!(887654321098)), "$887.65B");
        assert_eq!(format_market_cap(dec!(1200000000000)), "$1.20T");
        assert_eq!(format_market_cap(dec!(9876543)), "$9.88M");
        assert_eq!(format_market_cap(dec!(5000)), "$5000");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(dec!(2.34)), "+2.34%");
        assert_eq!(format_percentage(dec!(-1.23)), "-1.23%");
        assert_eq!(format_percentage(dec!(0)), "+0.00%");
    }
}
