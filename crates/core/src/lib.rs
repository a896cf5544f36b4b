//! Core types, errors, and the storage contract for `stowage`.
//!
//! ## Key Components
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias shared by the
//!   manager and every storage backend.
//! - **`params`**: `StorageParams`, the configuration bag passed to storage
//!   constructors.
//! - **`storage`**: the `Storage` capability trait and `FromParams`.
//! - **`constants`**: parameter keys and environment variable names.

pub mod constants;
pub mod errors;
pub mod params;
pub mod storage;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    params::StorageParams,
    storage::{validate_key, FromParams, Storage},
};
