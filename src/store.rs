use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// JSON blob persistence, one file per key under the data directory. The
/// terminal equivalent of browser local storage: absent keys read as `None`,
/// malformed content reads as `None`, and writes are best-effort. A read-only
/// or missing data directory degrades to in-memory-only state for the
/// session; callers are never handed a storage error.
#[derive(Clone, Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::de::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Discarding malformed state for {} : {}", key, err);
                None
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!("Could not create data directory : {}", err);
            return;
        }
        let json = match serde_json::ser::to_string_pretty(value) {
            Ok(json) => json,
            Err(err) => {
                warn!("Could not serialize state for {} : {}", key, err);
                return;
            }
        };
        match fs::write(self.path(key), json) {
            Ok(()) => debug!("Persisted {}", key),
            Err(err) => warn!("Could not persist {} : {}", key, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        assert_eq!(store.load::<Vec<String>>("missing"), None);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.save("ids", &vec!["bitcoin".to_string(), "solana".to_string()]);
        let loaded: Vec<String> = store.load("ids").unwrap();
        assert_eq!(loaded, vec!["bitcoin", "solana"]);
    }

    #[test]
    fn test_malformed_json_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ids.json"), "{not json").unwrap();
        let store = Store::new(dir.path());
        assert_eq!(store.load::<Vec<String>>("ids"), None);
    }

    #[test]
    fn test_save_into_missing_directory_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("nested/data"));
        store.save("ids", &vec!["bitcoin".to_string()]);
        let loaded: Vec<String> = store.load("ids").unwrap();
        assert_eq!(loaded, vec!["bitcoin"]);
    }
}
