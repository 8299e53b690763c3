// ============================================================================
// Kasir Infrastructure - File Store
// File: crates/kasir-infrastructure/src/storage/file_store.rs
// Description: One JSON blob per key under a data directory
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use kasir_core::repositories::{KeyValueStore, StorageError};
use kasir_shared::config::StorageSettings;
use tracing::{debug, info};

use super::{check_quota, entry_size};

const EXTENSION: &str = "json";

fn backend(context: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Backend(format!("{} {}: {}", context, path.display(), e))
}

/// Keys map to file names by replacing anything outside `[A-Za-z0-9_-]`
/// with `_`; `auth:users` is stored as `auth_users.json`.
fn file_name(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}.{}", stem, EXTENSION)
}

pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStore {
    /// Create the directory when it does not exist yet.
    pub fn open(dir: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| backend("create", &dir, e))?;
        info!("File store at {}", dir.display());
        Ok(Self { dir, quota_bytes })
    }

    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        Self::open(&settings.data_dir, settings.quota_bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }

    /// Total charged bytes of every blob except `skip`.
    fn used_bytes_except(&self, skip: &Path) -> Result<u64, StorageError> {
        let mut total = 0;
        let entries = fs::read_dir(&self.dir).map_err(|e| backend("list", &self.dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| backend("list", &self.dir, e))?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let len = entry.metadata().map_err(|e| backend("stat", &path, e))?.len();
            let stem_len = path.file_stem().map(|s| s.len() as u64).unwrap_or(0);
            total += len + stem_len;
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend("read", &path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if self.quota_bytes.is_some() {
            let after = self.used_bytes_except(&path)? + entry_size(key, value);
            check_quota(key, after, self.quota_bytes)?;
        }

        // Write beside the target then rename so readers never see half a blob.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).map_err(|e| backend("write", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| backend("rename", &path, e))?;
        debug!(key, bytes = value.len(), "Blob written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(backend("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_sanitizes_separators() {
        assert_eq!(file_name("auth:users"), "auth_users.json");
        assert_eq!(file_name("txns:v1"), "txns_v1.json");
        assert_eq!(file_name("../etc"), "___etc.json");
    }
}
