use crate::coin::CoinRecord;

/// Case-insensitive substring match on name or symbol. The empty query is
/// the identity; input order is always preserved.
pub fn filter_coins(coins: &[CoinRecord], query: &str) -> Vec<CoinRecord> {
    if query.is_empty() {
        return coins.to_vec();
    }
    let needle = query.to_lowercase();
    coins
        .iter()
        .filter(|coin| {
            coin.name.to_lowercase().contains(&needle)
                || coin.symbol.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::fallback_coins;

    #[test]
    fn test_empty_query_is_identity() {
        let coins = fallback_coins();
        assert_eq!(filter_coins(&coins, ""), coins);
    }

    #[test]
    fn test_matches_name_case_insensitively() {
        let coins = fallback_coins();
        let hits = filter_coins(&coins, "BITC");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "bitcoin");
    }

    #[test]
    fn test_matches_symbol() {
        let coins = fallback_coins();
        let hits = filter_coins(&coins, "doge");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol, "DOGE");
    }

    #[test]
    fn test_preserves_input_order() {
        let coins = fallback_coins();
        // "so" matches Solana by name and nothing else by symbol
        let hits = filter_coins(&coins, "o");
        let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
        let expected: Vec<&str> = coins
            .iter()
            .filter(|c| c.name.to_lowercase().contains('o') || c.symbol.to_lowercase().contains('o'))
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_no_match_is_empty() {
        let coins = fallback_coins();
        assert!(filter_coins(&coins, "zzz").is_empty());
    }
}
