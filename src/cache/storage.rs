//! Persistent key-value backends for the response cache
//!
//! A [`Storage`] behaves like browser local storage: string keys map to
//! string values, and every write replaces the whole value at once.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use directories::ProjectDirs;
use tempfile::NamedTempFile;
use thiserror::Error;

/// File extension for on-disk entries
const ENTRY_EXTENSION: &str = "json";

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem read/write failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writing would exceed the backend's capacity
    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Backend cannot be used at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value store shared by every cache user in the process
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces any existing value atomically
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}

/// Stores each key as one JSON file in a directory
///
/// Key names are percent-encoded into file names, so any key is accepted.
/// Writes go to a uniquely named temporary file that is then renamed over the
/// target, so a concurrent reader sees either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses the XDG cache directory (`~/.cache/folio/` on Linux)
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "folio")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Uses a custom directory, created lazily on first write
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name = format!("{}.{}", urlencoding::encode(key), ENTRY_EXTENSION);
        self.dir.join(file_name)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        // Each writer gets its own temp file; the rename is the only shared step
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.entry_path(key)).map_err(|e| e.error)?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(key) = urlencoding::decode(stem) {
                keys.push(key.into_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process storage with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes once keys plus values would exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    fn items(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items()?;

        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.items()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    #[test]
    fn test_file_storage_write_then_read() {
        let (storage, _temp_dir) = create_test_storage();

        storage.set_item("portfolio_cache_blogs", "[1,2,3]").unwrap();

        assert_eq!(
            storage.get_item("portfolio_cache_blogs").unwrap().as_deref(),
            Some("[1,2,3]")
        );
    }

    #[test]
    fn test_file_storage_missing_key_is_none() {
        let (storage, _temp_dir) = create_test_storage();
        assert!(storage.get_item("nope").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("cache");
        let storage = FileStorage::with_dir(nested.clone());

        storage.set_item("key", "value").unwrap();

        assert!(nested.join("key.json").exists());
        assert_eq!(
            fs::read_dir(&nested).unwrap().count(),
            1,
            "temp file should be renamed away"
        );
    }

    #[test]
    fn test_file_storage_encodes_unsafe_keys() {
        let (storage, temp_dir) = create_test_storage();

        storage.set_item("blog_a/b c", "{}").unwrap();

        assert!(temp_dir.path().join("blog_a%2Fb%20c.json").exists());
        assert_eq!(storage.keys().unwrap(), vec!["blog_a/b c".to_string()]);
        assert_eq!(storage.get_item("blog_a/b c").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_overwrite_and_remove() {
        let (storage, _temp_dir) = create_test_storage();

        storage.set_item("k", "first").unwrap();
        storage.set_item("k", "second").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("second"));

        storage.remove_item("k").unwrap();
        assert!(storage.get_item("k").unwrap().is_none());

        // Removing again is fine
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn test_file_storage_keys_ignores_foreign_files() {
        let (storage, temp_dir) = create_test_storage();

        storage.set_item("b", "1").unwrap();
        storage.set_item("a", "2").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hi").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_file_storage_concurrent_writers_never_tear_reads() {
        let (storage, _temp_dir) = create_test_storage();
        let values: Vec<String> = (b'a'..=b'd')
            .map(|c| (c as char).to_string().repeat(64 * 1024))
            .collect();
        storage.set_item("k", &values[0]).unwrap();

        std::thread::scope(|scope| {
            let writers: Vec<_> = values
                .iter()
                .map(|value| {
                    let storage = &storage;
                    scope.spawn(move || {
                        for _ in 0..50 {
                            storage.set_item("k", value).unwrap();
                        }
                    })
                })
                .collect();

            for _ in 0..500 {
                let read = storage.get_item("k").unwrap().expect("key stays present");
                assert!(values.contains(&read), "torn read of {} bytes", read.len());
            }
            for writer in writers {
                writer.join().unwrap();
            }
        });

        assert_eq!(storage.keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_file_storage_keys_on_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::with_dir(temp_dir.path().join("never-created"));
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(storage) = FileStorage::new() {
            let path_str = storage.dir().to_string_lossy();
            assert!(path_str.contains("folio"), "Cache path should contain project name");
        }
        // Passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_memory_storage_roundtrip_and_keys() {
        let storage = MemoryStorage::new();

        storage.set_item("x", "1").unwrap();
        storage.set_item("y", "2").unwrap();
        storage.remove_item("x").unwrap();

        assert!(storage.get_item("x").unwrap().is_none());
        assert_eq!(storage.keys().unwrap(), vec!["y".to_string()]);
    }

    #[test]
    fn test_memory_storage_quota_rejects_large_write() {
        let storage = MemoryStorage::with_quota(10);

        storage.set_item("k", "12345").unwrap();
        let err = storage.set_item("other", "123456789").unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(storage.get_item("other").unwrap().is_none());
        // Replacing the existing key does not count its old value
        storage.set_item("k", "123456789").unwrap();
    }
}
