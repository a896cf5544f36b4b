//! File-backed storage
//!
//! Each key is stored as one JSON document. Paths use the SHA-256 of the
//! prefixed key with the first byte as a shard directory:
//! `<dir>/<hash[..2]>/<hash>.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stowage_core::{
    Error, FromParams, Result, Storage, StorageParams, DEFAULT_CACHE_DIR_NAME, KEY_PREFIX_PARAM,
};
use walkdir::WalkDir;

const ENTRY_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl FileEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// File storage
///
/// Recognized parameters: `path` (directory, defaults to the user cache
/// directory) and `key_prefix`.
#[derive(Debug)]
pub struct FileStorage {
    base_dir: PathBuf,
    key_prefix: String,
}

impl FileStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            key_prefix: String::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn default_dir() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|dir| dir.join(DEFAULT_CACHE_DIR_NAME))
            .ok_or_else(|| {
                Error::configuration("file storage needs a 'path': no user cache directory found")
            })
    }

    fn entry_path(&self, full_key: &str) -> PathBuf {
        let hash = hex::encode(Sha256::digest(full_key.as_bytes()));
        self.base_dir
            .join(&hash[..2])
            .join(format!("{hash}.{ENTRY_EXTENSION}"))
    }

    fn read_entry(&self, path: &Path) -> Result<Option<FileEntry>> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::file_system(path, "read", e)),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    fn remove_file(path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::file_system(path, "remove", e)),
        }
    }
}

impl FromParams for FileStorage {
    fn from_params(params: StorageParams) -> Result<Self> {
        let base_dir = match params.get_str("path")? {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::default_dir()?,
        };
        Ok(Self {
            base_dir,
            key_prefix: params
                .get_str(KEY_PREFIX_PARAM)?
                .unwrap_or_default()
                .to_string(),
        })
    }
}

impl Storage for FileStorage {
    fn init(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| Error::file_system(&self.base_dir, "create storage directory", e))?;
        tracing::debug!(dir = %self.base_dir.display(), "File storage ready");
        Ok(())
    }

    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn set_key_prefix(&mut self, prefix: String) {
        self.key_prefix = prefix;
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        let full_key = self.prefixed_key(key)?;
        let path = self.entry_path(&full_key);

        let Some(entry) = self.read_entry(&path)? else {
            return Ok(None);
        };
        if entry.key != full_key {
            tracing::warn!(key = %full_key, path = %path.display(), "Hash collision in file storage");
            return Ok(None);
        }
        if entry.is_expired(Utc::now()) {
            Self::remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let full_key = self.prefixed_key(key)?;
        let path = self.entry_path(&full_key);
        let shard = path
            .parent()
            .ok_or_else(|| Error::configuration("Invalid cache path"))?;
        std::fs::create_dir_all(shard)
            .map_err(|e| Error::file_system(shard, "create shard directory", e))?;

        let expires_at = match ttl {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl).map_err(|e| {
                        Error::configuration(format!("ttl out of range for '{key}': {e}"))
                    })?,
            ),
            None => None,
        };
        let entry = FileEntry {
            key: full_key,
            value,
            expires_at,
        };
        let data = serde_json::to_vec(&entry)?;

        // Write to a temp file in the same directory, then rename into place
        let mut temp = tempfile::NamedTempFile::new_in(shard)
            .map_err(|e| Error::file_system(shard, "create temp file", e))?;
        temp.write_all(&data)
            .map_err(|e| Error::file_system(temp.path(), "write", e))?;
        temp.persist(&path)
            .map_err(|e| Error::file_system(&path, "persist", e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let full_key = self.prefixed_key(key)?;
        Self::remove_file(&self.entry_path(&full_key))
    }

    fn clear(&self) -> Result<()> {
        if !self.base_dir.exists() {
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in WalkDir::new(&self.base_dir).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                Error::file_system(path, "walk storage directory", e.into())
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION)
            {
                continue;
            }

            // Other prefixes may share this directory
            if !self.key_prefix.is_empty() {
                match self.read_entry(path) {
                    Ok(Some(stored)) if stored.key.starts_with(&self.key_prefix) => {}
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable cache file {}: {}", path.display(), e);
                        continue;
                    }
                }
            }
            if Self::remove_file(path)? {
                removed += 1;
            }
        }

        tracing::debug!(removed, dir = %self.base_dir.display(), "Cleared file storage");
        Ok(())
    }
}
