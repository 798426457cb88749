use crate::coin::CoinRecord;
use crate::search;

/// Side-by-side comparison capacity.
pub const MAX_COMPARED: usize = 4;

/// Ordered selection of coins to compare, unique by id, scoped to one page
/// visit — never persisted. Append order is display order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    selected: Vec<CoinRecord>,
}

impl Comparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[CoinRecord] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.selected.len() >= MAX_COMPARED
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.iter().any(|coin| coin.id == id)
    }

    /// Appends the coin; a full selection or a duplicate id is a no-op.
    /// Returns whether the selection changed.
    pub fn add(&mut self, coin: CoinRecord) -> bool {
        if self.is_full() || self.contains(&coin.id) {
            return false;
        }
        self.selected.push(coin);
        true
    }

    /// Removes the entry with the given id, if present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|coin| coin.id != id);
        self.selected.len() != before
    }

    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.selected.len() {
            return false;
        }
        self.selected.remove(index);
        true
    }

    /// The "available to add" list: the filtered collection minus whatever is
    /// already selected. Recomputed on every call, never cached.
    pub fn available(&self, coins: &[CoinRecord], query: &str) -> Vec<CoinRecord> {
        search::filter_coins(coins, query)
            .into_iter()
            .filter(|coin| !self.contains(&coin.id))
            .collect()
    }
}
