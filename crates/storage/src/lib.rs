//! Storage backends bundled with stowage
//!
//! - `MemoryStorage`: in-process map with TTL and an optional size cap
//! - `FileStorage`: one JSON document per key on the local file system
//! - `NullStorage`: discards writes, useful as a default storage

pub mod file;
pub mod memory;
pub mod null;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use null::NullStorage;
