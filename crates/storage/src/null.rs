//! Storage that keeps nothing

use serde_json::Value;
use std::time::Duration;
use stowage_core::{FromParams, Result, Storage, StorageParams, KEY_PREFIX_PARAM};

/// Accepts every write and never returns a value.
///
/// Handy as the manager's default storage: callers keep working, they just
/// always miss.
#[derive(Debug, Default, Clone)]
pub struct NullStorage {
    key_prefix: String,
}

impl NullStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FromParams for NullStorage {
    fn from_params(params: StorageParams) -> Result<Self> {
        Ok(Self {
            key_prefix: params
                .get_str(KEY_PREFIX_PARAM)?
                .unwrap_or_default()
                .to_string(),
        })
    }
}

impl Storage for NullStorage {
    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn set_key_prefix(&mut self, prefix: String) {
        self.key_prefix = prefix;
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.prefixed_key(key)?;
        Ok(None)
    }

    fn set(&self, key: &str, _value: Value, _ttl: Option<Duration>) -> Result<()> {
        self.prefixed_key(key)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        self.prefixed_key(key)?;
        Ok(false)
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_always_misses() {
        let storage = NullStorage::new();
        storage.set("a", json!(1), None).unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert!(!storage.remove("a").unwrap());
        assert!(storage.get("").is_err());
    }
}
