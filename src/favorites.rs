use crate::store::Store;

pub const FAVORITES_KEY: &str = "cryptoFavorites";

/// User-marked coins of interest. Membership is a set, but insertion order is
/// kept for display. Every mutation writes through to the store; a failed
/// write keeps the in-memory set authoritative for the session.
#[derive(Debug)]
pub struct Favorites {
    ids: Vec<String>,
    store: Store,
}

impl Favorites {
    /// Reads the persisted set, falling back to empty when the key is absent
    /// or its content does not decode.
    pub fn load(store: Store) -> Self {
        let ids = store.load::<Vec<String>>(FAVORITES_KEY).unwrap_or_default();
        Self { ids, store }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    pub fn add(&mut self, id: &str) {
        if self.is_favorite(id) {
            return;
        }
        self.ids.push(id.to_string());
        self.persist();
    }

    pub fn remove(&mut self, id: &str) {
        if !self.is_favorite(id) {
            return;
        }
        self.ids.retain(|i| i != id);
        self.persist();
    }

    pub fn toggle(&mut self, id: &str) {
        if self.is_favorite(id) {
            self.remove(id);
        } else {
            self.add(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.persist();
    }

    fn persist(&self) {
        self.store.save(FAVORITES_KEY, &self.ids);
    }
}
