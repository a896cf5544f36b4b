//! The storage capability contract
//!
//! Every backend the manager can hand out implements [`Storage`]. The manager
//! itself only relies on [`Storage::init`] and the key-prefix accessors; the
//! data-plane methods are for applications.

use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::params::StorageParams;

/// A cache storage backend
pub trait Storage: Send + Sync + Debug {
    /// One-time setup, run by the manager right after construction
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Namespace prepended to every key; empty when unset
    fn key_prefix(&self) -> &str;

    fn set_key_prefix(&mut self, prefix: String);

    /// Fetch a value, `None` when missing or expired
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value, optionally expiring after `ttl`
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    /// Remove a value, returning whether one was present
    fn remove(&self, key: &str) -> Result<bool>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Drop every entry in this storage's key namespace
    fn clear(&self) -> Result<()>;

    /// Validate `key` and prepend the key prefix
    fn prefixed_key(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        Ok(format!("{}{}", self.key_prefix(), key))
    }
}

/// Construction from a parameter bag, used for generic factory registration
pub trait FromParams: Sized {
    fn from_params(params: StorageParams) -> Result<Self>;
}

/// Reject keys that no backend can address
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_key(key, "key must not be empty"));
    }
    if key.chars().any(char::is_control) {
        return Err(Error::invalid_key(
            key.escape_debug().to_string(),
            "key must not contain control characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Prefixed {
        prefix: String,
    }

    impl Storage for Prefixed {
        fn key_prefix(&self) -> &str {
            &self.prefix
        }

        fn set_key_prefix(&mut self, prefix: String) {
            self.prefix = prefix;
        }

        fn get(&self, _key: &str) -> Result<Option<Value>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> Result<()> {
            Ok(())
        }

        fn remove(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }

        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user:42").is_ok());
        assert!(matches!(validate_key(""), Err(Error::InvalidKey { .. })));
        assert!(matches!(
            validate_key("bad\nkey"),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_prefixed_key() {
        let mut storage = Prefixed::default();
        assert_eq!(storage.prefixed_key("a").unwrap(), "a");

        storage.set_key_prefix("app:".to_string());
        assert_eq!(storage.prefixed_key("a").unwrap(), "app:a");
        assert!(storage.prefixed_key("").is_err());
        assert!(!storage.contains("a").unwrap());
    }
}
