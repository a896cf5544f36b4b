//! Storage manager configuration with environment overrides and validation
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use stowage_core::{
    Error, Result, ResultExt, StorageParams, STOWAGE_DEFAULT_STORAGE_VAR, STOWAGE_KEY_PREFIX_VAR,
};

/// Configuration for a [`StorageManager`](crate::StorageManager)
///
/// ```json
/// {
///   "key_prefix": "app:",
///   "default_storage": "null",
///   "storages": {
///     "sessions": { "class": "Memory", "max_entries": 10000 },
///     "file": { "path": "/var/cache/app" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Prefix handed to storages that do not set their own
    pub key_prefix: String,
    /// Name of the storage to fall back on when resolution fails
    pub default_storage: Option<String>,
    /// Params for named storages, used by `StorageManager::storage`
    pub storages: BTreeMap<String, StorageParams>,
}

impl ManagerConfig {
    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse storage manager config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read config", e))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    /// Apply `STOWAGE_KEY_PREFIX` and `STOWAGE_DEFAULT_STORAGE` when set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(prefix) = std::env::var(STOWAGE_KEY_PREFIX_VAR) {
            tracing::debug!(prefix = %prefix, "Key prefix overridden from environment");
            self.key_prefix = prefix;
        }
        if let Ok(name) = std::env::var(STOWAGE_DEFAULT_STORAGE_VAR) {
            tracing::debug!(name = %name, "Default storage overridden from environment");
            self.default_storage = if name.is_empty() { None } else { Some(name) };
        }
    }

    /// Check for empty names and names that collide once case is ignored
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.default_storage {
            if name.trim().is_empty() {
                return Err(Error::configuration("default_storage must not be empty"));
            }
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for name in self.storages.keys() {
            if name.trim().is_empty() {
                return Err(Error::configuration("storage names must not be empty"));
            }
            if let Some(previous) = seen.insert(name.to_lowercase(), name) {
                return Err(Error::configuration(format!(
                    "storage names '{previous}' and '{name}' differ only in case"
                )));
            }
        }
        Ok(())
    }
}
