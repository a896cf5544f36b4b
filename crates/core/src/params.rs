use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::CLASS_PARAM;
use crate::errors::{Error, Result};

/// Configuration bag handed to storage constructors
///
/// Keys are free-form. The manager consumes the `class` override key before
/// passing the bag on; every other key reaches the storage verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageParams(Map<String, Value>);

impl StorageParams {
    /// Create an empty parameter bag
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create from an existing JSON object
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Insert a parameter, returning the previous value if any
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Get a string parameter, failing if present with another type
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(type_mismatch(key, "a string", other)),
        }
    }

    /// Get an unsigned integer parameter, failing if present with another type
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| type_mismatch(key, "an unsigned integer", value)),
        }
    }

    /// Get a boolean parameter, failing if present with another type
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(type_mismatch(key, "a boolean", other)),
        }
    }

    /// Remove and return the `class` override.
    ///
    /// An empty string counts as an override naming no type; `null` counts
    /// as no override at all.
    pub fn take_class(&mut self) -> Result<Option<String>> {
        match self.0.remove(CLASS_PARAM) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(class)) => Ok(Some(class)),
            Some(other) => Err(type_mismatch(CLASS_PARAM, "a string", &other)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> Error {
    Error::configuration(format!(
        "parameter '{key}' must be {expected}, found {found}"
    ))
}

impl From<Map<String, Value>> for StorageParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for StorageParams
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_class_consumes_override() {
        let mut params: StorageParams = [("class", "CustomType"), ("host", "x")]
            .into_iter()
            .collect();

        assert_eq!(params.take_class().unwrap().as_deref(), Some("CustomType"));
        assert!(!params.contains("class"));
        assert_eq!(params.get_str("host").unwrap(), Some("x"));
        assert_eq!(params.len(), 1);

        // Second call finds nothing
        assert_eq!(params.take_class().unwrap(), None);
    }

    #[test]
    fn test_take_class_null_is_no_override() {
        let mut params = StorageParams::new()
            .with("class", Value::Null)
            .with("host", "x");
        assert_eq!(params.take_class().unwrap(), None);
        assert!(!params.contains("class"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_take_class_rejects_non_string() {
        let mut params = StorageParams::new().with("class", 42);
        assert!(matches!(
            params.take_class(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_typed_getters() {
        let params = StorageParams::new()
            .with("max_entries", 10)
            .with("enabled", true)
            .with("path", "/tmp/x");

        assert_eq!(params.get_u64("max_entries").unwrap(), Some(10));
        assert_eq!(params.get_bool("enabled").unwrap(), Some(true));
        assert_eq!(params.get_str("missing").unwrap(), None);
        assert!(params.get_u64("path").is_err());
        assert!(params.get_str("enabled").is_err());
    }

    #[test]
    fn test_transparent_serde() {
        let params: StorageParams =
            serde_json::from_value(json!({"host": "localhost", "port": 6379})).unwrap();
        assert_eq!(params.get_u64("port").unwrap(), Some(6379));
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"host": "localhost", "port": 6379})
        );
    }
}
