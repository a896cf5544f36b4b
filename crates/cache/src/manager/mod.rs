//! Storage manager: resolves storage names to lazily built, memoized backends

mod builder;
mod factory;

pub use builder::StorageManagerBuilder;
pub use factory::{derive_type_name, FactoryTable, StorageFactory};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use stowage_core::{Error, FromParams, Result, Storage, StorageParams};

/// Resolves storage names to shared storage instances.
///
/// The first request for a name builds the storage, runs its `init`, hands
/// it the manager's key prefix if it has none, and keeps it for the life of
/// the manager. Later requests for the same name, in any letter case, get
/// the same instance back. When no storage type can be built for a name the
/// default storage is returned instead, and nothing is remembered for that
/// name.
pub struct StorageManager {
    /// Normalized name -> live storage
    storages: RwLock<HashMap<String, Arc<dyn Storage>>>,
    /// Prefix handed to new storages that have none of their own
    key_prefix: RwLock<String>,
    /// Returned when resolution fails
    default_storage: RwLock<Option<Arc<dyn Storage>>>,
    factories: RwLock<FactoryTable>,
    /// Params from configuration, keyed by normalized name
    configured: HashMap<String, StorageParams>,
}

impl StorageManager {
    /// Create a manager that knows the bundled storage types
    pub fn new() -> Self {
        Self::with_factories(FactoryTable::with_builtin())
    }

    /// Create a manager with an explicit registration table
    pub fn with_factories(factories: FactoryTable) -> Self {
        Self {
            storages: RwLock::new(HashMap::new()),
            key_prefix: RwLock::new(String::new()),
            default_storage: RwLock::new(None),
            factories: RwLock::new(factories),
            configured: HashMap::new(),
        }
    }

    pub fn builder() -> StorageManagerBuilder {
        StorageManagerBuilder::new()
    }

    pub(crate) fn set_configured(&mut self, configured: HashMap<String, StorageParams>) {
        self.configured = configured
            .into_iter()
            .map(|(name, params)| (normalize(&name), params))
            .collect();
    }

    /// Get the storage for `name`, building it on first use.
    ///
    /// A `class` entry in `params` names the storage type to build and is
    /// removed before the params reach the factory. Without it the type name
    /// is derived from `name` (`"redis"` -> `"Redis"`). Params are ignored
    /// once a storage for `name` exists.
    ///
    /// Construction for one name is serialized, so concurrent first requests
    /// still produce a single instance. Factories and `init` run while that
    /// lock is held and must not call back into the manager.
    pub fn resolve(&self, name: &str, mut params: StorageParams) -> Result<Arc<dyn Storage>> {
        let key = normalize(name);

        if let Some(storage) = self.storages.read().get(&key) {
            tracing::debug!(name = %name, "Storage cache hit");
            return Ok(Arc::clone(storage));
        }

        let type_name = match params.take_class()? {
            Some(class) => class,
            None => derive_type_name(name),
        };

        {
            let mut storages = self.storages.write();
            // Another caller may have won the race for the write lock
            if let Some(storage) = storages.get(&key) {
                return Ok(Arc::clone(storage));
            }

            if let Some(storage) = self.construct(&type_name, params)? {
                let storage: Arc<dyn Storage> = Arc::from(storage);
                storages.insert(key, Arc::clone(&storage));
                tracing::info!(name = %name, storage_type = %type_name, "Storage registered");
                return Ok(storage);
            }
        }

        if let Some(fallback) = self.default_storage.read().as_ref() {
            tracing::warn!(
                name = %name,
                storage_type = %type_name,
                "No storage type found, using default storage"
            );
            return Ok(Arc::clone(fallback));
        }

        Err(Error::backend_not_found(type_name))
    }

    /// Get the storage for `name` using the params configured for it, if any
    pub fn storage(&self, name: &str) -> Result<Arc<dyn Storage>> {
        let params = self
            .configured
            .get(&normalize(name))
            .cloned()
            .unwrap_or_default();
        self.resolve(name, params)
    }

    /// Build and initialize one storage without touching the memo map.
    ///
    /// Returns `Ok(None)` when `type_name` is empty or not registered.
    /// Errors from the factory or from `init` are returned unchanged.
    pub fn construct(
        &self,
        type_name: &str,
        params: StorageParams,
    ) -> Result<Option<Box<dyn Storage>>> {
        if type_name.is_empty() {
            return Ok(None);
        }
        let Some(factory) = self.factories.read().get(type_name) else {
            tracing::debug!(storage_type = %type_name, "Storage type not registered");
            return Ok(None);
        };

        tracing::debug!(storage_type = %type_name, params = params.len(), "Constructing storage");
        let mut storage = factory(params)?;
        storage.init()?;

        if storage.key_prefix().is_empty() {
            let prefix = self.key_prefix.read();
            if !prefix.is_empty() {
                storage.set_key_prefix(prefix.clone());
            }
        }
        Ok(Some(storage))
    }

    /// Set the storage returned when resolution fails. It is shared, not
    /// owned: the caller may keep its own handle.
    pub fn set_default_storage(&self, storage: Arc<dyn Storage>) {
        *self.default_storage.write() = Some(storage);
    }

    pub fn default_storage(&self) -> Option<Arc<dyn Storage>> {
        self.default_storage.read().clone()
    }

    pub fn clear_default_storage(&self) {
        *self.default_storage.write() = None;
    }

    /// Set the key prefix for storages built from now on. Storages that
    /// already exist keep their prefix.
    pub fn set_key_prefix(&self, prefix: impl Into<String>) {
        *self.key_prefix.write() = prefix.into();
    }

    pub fn key_prefix(&self) -> String {
        self.key_prefix.read().clone()
    }

    /// Register a storage factory; takes effect on the next resolve
    pub fn register_factory<F>(&self, type_name: impl Into<String>, factory: F) -> bool
    where
        F: Fn(StorageParams) -> Result<Box<dyn Storage>> + Send + Sync + 'static,
    {
        self.factories.write().register(type_name, factory)
    }

    /// Register a storage type constructible from params
    pub fn register_type<T>(&self, type_name: impl Into<String>) -> bool
    where
        T: Storage + FromParams + 'static,
    {
        self.factories.write().register_type::<T>(type_name)
    }

    /// Whether a storage has been built for `name`
    pub fn is_resolved(&self, name: &str) -> bool {
        self.storages.read().contains_key(&normalize(name))
    }

    /// Normalized names with a live storage, sorted
    pub fn resolved_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.storages.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageManager")
            .field("storages", &self.resolved_names())
            .field("key_prefix", &*self.key_prefix.read())
            .field("has_default_storage", &self.default_storage.read().is_some())
            .field("factories", &*self.factories.read())
            .finish()
    }
}

/// Memo key for a storage name
fn normalize(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stowage_storage::{MemoryStorage, NullStorage};

    #[test]
    fn test_memory_storage_by_name() {
        let manager = StorageManager::new();
        let storage = manager.resolve("memory", StorageParams::new()).unwrap();

        storage.set("answer", json!(42), None).unwrap();
        assert_eq!(storage.get("answer").unwrap(), Some(json!(42)));
        assert!(manager.is_resolved("Memory"));
        assert_eq!(manager.resolved_names(), vec!["memory"]);
    }

    #[test]
    fn test_construct_empty_or_unknown_type() {
        let manager = StorageManager::new();
        assert!(manager.construct("", StorageParams::new()).unwrap().is_none());
        assert!(manager
            .construct("Nonexistent", StorageParams::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_construct_does_not_memoize() {
        let manager = StorageManager::new();
        let storage = manager.construct("Memory", StorageParams::new()).unwrap();
        assert!(storage.is_some());
        assert!(manager.resolved_names().is_empty());
    }

    #[test]
    fn test_construct_applies_prefix() {
        let manager = StorageManager::new();
        manager.set_key_prefix("p:");
        assert_eq!(manager.key_prefix(), "p:");

        let storage = manager
            .construct("Null", StorageParams::new())
            .unwrap()
            .unwrap();
        assert_eq!(storage.key_prefix(), "p:");

        let own = manager
            .construct("Null", StorageParams::new().with("key_prefix", "own:"))
            .unwrap()
            .unwrap();
        assert_eq!(own.key_prefix(), "own:");
    }

    #[test]
    fn test_default_storage_accessors() {
        let manager = StorageManager::new();
        assert!(manager.default_storage().is_none());
        assert!(manager
            .resolve("Nonexistent", StorageParams::new())
            .unwrap_err()
            .is_backend_not_found());

        let fallback: Arc<dyn Storage> = Arc::new(NullStorage::new());
        manager.set_default_storage(Arc::clone(&fallback));
        assert!(manager.default_storage().is_some());
        let resolved = manager.resolve("Nonexistent", StorageParams::new()).unwrap();
        assert!(Arc::ptr_eq(&resolved, &fallback));

        manager.clear_default_storage();
        assert!(manager.default_storage().is_none());
        let err = manager
            .resolve("Nonexistent", StorageParams::new())
            .unwrap_err();
        assert!(err.is_backend_not_found());
        assert!(!manager.is_resolved("nonexistent"));
    }

    #[test]
    fn test_empty_name_is_not_found() {
        let manager = StorageManager::new();
        let err = manager.resolve("", StorageParams::new()).unwrap_err();
        assert!(err.is_backend_not_found());
    }

    #[test]
    fn test_register_type_at_runtime() {
        let manager = StorageManager::with_factories(FactoryTable::new());
        assert!(manager.resolve("cache", StorageParams::new()).is_err());

        manager.register_type::<MemoryStorage>("Cache");
        assert!(manager.resolve("cache", StorageParams::new()).is_ok());
    }

    #[test]
    fn test_debug_lists_state() {
        let manager = StorageManager::new();
        manager.resolve("null", StorageParams::new()).unwrap();
        let debug = format!("{manager:?}");
        assert!(debug.contains("null"));
        assert!(debug.contains("Memory"));
    }
}
