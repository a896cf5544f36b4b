/// Constants used throughout the stowage codebase
// Parameter keys understood by the manager and the bundled storages
pub const CLASS_PARAM: &str = "class";
pub const KEY_PREFIX_PARAM: &str = "key_prefix";

// Environment variable names
pub const STOWAGE_KEY_PREFIX_VAR: &str = "STOWAGE_KEY_PREFIX";
pub const STOWAGE_DEFAULT_STORAGE_VAR: &str = "STOWAGE_DEFAULT_STORAGE";

// Directory under the user cache dir used by the file storage
pub const DEFAULT_CACHE_DIR_NAME: &str = "stowage";
