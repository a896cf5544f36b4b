//! Registration table mapping storage type names to constructors

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use stowage_core::{FromParams, Result, Storage, StorageParams};
use stowage_storage::{FileStorage, MemoryStorage, NullStorage};

/// Constructor for one storage type
pub type StorageFactory = Arc<dyn Fn(StorageParams) -> Result<Box<dyn Storage>> + Send + Sync>;

/// Storage type names to factories. Lookup ignores case.
#[derive(Clone, Default)]
pub struct FactoryTable {
    /// Folded type name -> (name as registered, factory)
    entries: HashMap<String, (String, StorageFactory)>,
}

impl FactoryTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the bundled `Memory`, `File` and `Null` storages
    pub fn with_builtin() -> Self {
        let mut table = Self::new();
        table.register_type::<MemoryStorage>("Memory");
        table.register_type::<FileStorage>("File");
        table.register_type::<NullStorage>("Null");
        table
    }

    /// Register a factory, returning `true` if it replaced an existing one
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F) -> bool
    where
        F: Fn(StorageParams) -> Result<Box<dyn Storage>> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        self.entries
            .insert(fold(&type_name), (type_name, Arc::new(factory)))
            .is_some()
    }

    /// Register a storage type constructible from params
    pub fn register_type<T>(&mut self, type_name: impl Into<String>) -> bool
    where
        T: Storage + FromParams + 'static,
    {
        self.register(type_name, |params| {
            Ok(Box::new(T::from_params(params)?) as Box<dyn Storage>)
        })
    }

    pub fn get(&self, type_name: &str) -> Option<StorageFactory> {
        self.entries
            .get(&fold(type_name))
            .map(|(_, factory)| Arc::clone(factory))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(&fold(type_name))
    }

    /// Registered names as given at registration, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.values().map(|(name, _)| name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryTable")
            .field("types", &self.type_names())
            .finish()
    }
}

/// Storage type name for a requested storage name: first character upper
/// case, the rest unchanged (`"redis"` -> `"Redis"`).
pub fn derive_type_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
