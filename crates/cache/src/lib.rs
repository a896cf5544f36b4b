//! Named cache storages for stowage
//!
//! [`StorageManager`] turns a storage name such as `"memory"` or `"redis"`
//! into a shared, initialized [`Storage`] instance:
//! - storage types are looked up in a [`FactoryTable`] registered at startup
//! - each name is built once and memoized, ignoring letter case
//! - a manager-wide key prefix is handed to storages that have none
//! - a default storage can stand in when a name cannot be resolved
//!
//! ```
//! use stowage_cache::{Storage, StorageManager, StorageParams};
//!
//! let manager = StorageManager::new();
//! manager.set_key_prefix("app:");
//!
//! let storage = manager.resolve("memory", StorageParams::new()).unwrap();
//! assert_eq!(storage.key_prefix(), "app:");
//! ```

pub mod config;
pub mod manager;

pub use config::ManagerConfig;
pub use manager::{
    derive_type_name, FactoryTable, StorageFactory, StorageManager, StorageManagerBuilder,
};

pub use stowage_core::{Error, FromParams, Result, Storage, StorageParams};
