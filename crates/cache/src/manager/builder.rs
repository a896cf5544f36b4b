//! Storage manager builder

use super::factory::FactoryTable;
use super::StorageManager;
use crate::config::ManagerConfig;
use std::sync::Arc;
use stowage_core::{Result, Storage, StorageParams};

/// Builder for StorageManager
pub struct StorageManagerBuilder {
    config: ManagerConfig,
    factories: FactoryTable,
    default_storage: Option<Arc<dyn Storage>>,
}

impl StorageManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            factories: FactoryTable::with_builtin(),
            default_storage: None,
        }
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    /// Replace the registration table, dropping the bundled storage types
    pub fn with_factories(mut self, factories: FactoryTable) -> Self {
        self.factories = factories;
        self
    }

    pub fn with_factory<F>(mut self, type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(StorageParams) -> Result<Box<dyn Storage>> + Send + Sync + 'static,
    {
        self.factories.register(type_name, factory);
        self
    }

    /// Use an existing storage as the default. Takes precedence over
    /// `default_storage` in the config.
    pub fn with_default_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.default_storage = Some(storage);
        self
    }

    /// Build the manager.
    ///
    /// A default storage named in the config is resolved through the new
    /// manager, so it is also reachable under its own name.
    pub fn build(self) -> Result<StorageManager> {
        self.config.validate()?;

        let ManagerConfig {
            key_prefix,
            default_storage,
            storages,
        } = self.config;

        let mut manager = StorageManager::with_factories(self.factories);
        manager.set_key_prefix(key_prefix);
        manager.set_configured(storages.into_iter().collect());

        match (self.default_storage, default_storage) {
            (Some(storage), _) => manager.set_default_storage(storage),
            (None, Some(name)) => {
                let storage = manager.storage(&name)?;
                manager.set_default_storage(storage);
            }
            (None, None) => {}
        }

        tracing::debug!(?manager, "Storage manager built");
        Ok(manager)
    }
}

impl Default for StorageManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stowage_core::Error;
    use stowage_storage::NullStorage;

    #[test]
    fn test_builder_applies_config() -> Result<()> {
        let mut storages = BTreeMap::new();
        storages.insert(
            "Sessions".to_string(),
            StorageParams::new()
                .with("class", "Memory")
                .with("max_entries", 10),
        );
        let config = ManagerConfig {
            key_prefix: "app:".to_string(),
            default_storage: Some("null".to_string()),
            storages,
        };

        let manager = StorageManagerBuilder::new().with_config(config).build()?;
        assert_eq!(manager.key_prefix(), "app:");

        // Default storage resolved and memoized under its own name
        assert!(manager.is_resolved("null"));
        let fallback = manager.default_storage().unwrap();
        assert!(Arc::ptr_eq(&fallback, &manager.storage("NULL")?));

        let sessions = manager.storage("sessions")?;
        assert_eq!(sessions.key_prefix(), "app:");
        assert!(!Arc::ptr_eq(&sessions, &fallback));
        Ok(())
    }

    #[test]
    fn test_explicit_default_wins() -> Result<()> {
        let explicit: Arc<dyn Storage> = Arc::new(NullStorage::new());
        let config = ManagerConfig {
            default_storage: Some("memory".to_string()),
            ..ManagerConfig::default()
        };

        let manager = StorageManagerBuilder::new()
            .with_config(config)
            .with_default_storage(Arc::clone(&explicit))
            .build()?;

        assert!(Arc::ptr_eq(&manager.default_storage().unwrap(), &explicit));
        assert!(!manager.is_resolved("memory"));
        Ok(())
    }

    #[test]
    fn test_unknown_configured_default_fails() {
        let config = ManagerConfig {
            default_storage: Some("Redis".to_string()),
            ..ManagerConfig::default()
        };
        let err = StorageManagerBuilder::new()
            .with_config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BackendNotFound { ref type_name } if type_name == "Redis"));
    }

    #[test]
    fn test_with_factory() -> Result<()> {
        let manager = StorageManagerBuilder::new()
            .with_factories(FactoryTable::new())
            .with_factory("Blackhole", |_| Ok(Box::new(NullStorage::new()) as Box<dyn Storage>))
            .with_key_prefix("bh:")
            .build()?;

        assert!(manager.resolve("memory", StorageParams::new()).is_err());
        let storage = manager.resolve("blackhole", StorageParams::new())?;
        assert_eq!(storage.key_prefix(), "bh:");
        Ok(())
    }
}
