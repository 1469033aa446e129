//! Durable key-value backends
//!
//! The durable tier only needs string keys and string values with
//! origin/process-scoped lifetime. [`FileStore`] keeps one file per key in a
//! directory, so several processes sharing the directory see each other's
//! writes; every write is an idempotent upsert. [`MemoryStore`] is the
//! in-process stand-in used by headless runs and tests.

use crate::error::StorageError;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Raw string storage behind the durable tier
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Default)]
struct MemoryStoreInner {
    values: FxHashMap<String, String>,
    quota_bytes: Option<usize>,
    unavailable: bool,
}

/// In-process backend with an optional byte quota
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the stored value bytes past `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::default();
        store.inner.lock().quota_bytes = Some(bytes);
        store
    }

    /// Make every operation fail, as a blocked or corrupted storage area would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.lock();
        if inner.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(inner.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if inner.unavailable {
            return Err(StorageError::Unavailable);
        }
        if let Some(quota) = inner.quota_bytes {
            let used: usize = inner
                .values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(used);
            if value.len() > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available,
                });
            }
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if inner.unavailable {
            return Err(StorageError::Unavailable);
        }
        inner.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock();
        if inner.unavailable {
            return Err(StorageError::Unavailable);
        }
        Ok(inner.values.keys().cloned().collect())
    }
}

// ============================================================================
// File backend
// ============================================================================

const RECORD_EXTENSION: &str = "json";

/// One file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!("FileStore: opened {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_key(key), RECORD_EXTENSION))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        // Every writer gets its own temp file in the same directory; the
        // rename then publishes a whole record or nothing.
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|err| err.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Map a key onto a portable file stem: `[A-Za-z0-9_-]` kept, everything else `%XX`
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn decode_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_encoding_round_trips() {
        for key in ["vitrine.theme.current", "theme:warm-comfort", "a b/c%", "plain"] {
            let encoded = encode_key(key);
            assert!(!encoded.contains('/'));
            assert!(!encoded.contains('.'));
            assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        }
    }

    #[test]
    fn memory_store_quota() {
        let store = MemoryStore::with_quota(10);
        store.write("a", "12345").unwrap();
        // Replacing a key does not count its old value against the quota
        store.write("a", "1234567890").unwrap();
        let err = store.write("b", "x").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { available: 0, .. }));
    }

    #[test]
    fn memory_store_unavailable() {
        let store = MemoryStore::new();
        store.write("a", "1").unwrap();
        store.set_unavailable(true);
        assert!(store.read("a").is_err());
        assert!(store.write("a", "2").is_err());
        store.set_unavailable(false);
        assert_eq!(store.read("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn file_store_crud() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();

        assert_eq!(store.read("theme:a").unwrap(), None);
        store.write("theme:a", "{\"x\":1}").unwrap();
        store.write("theme:a", "{\"x\":2}").unwrap();
        assert_eq!(store.read("theme:a").unwrap().as_deref(), Some("{\"x\":2}"));
        assert_eq!(store.keys().unwrap(), vec!["theme:a".to_string()]);

        store.remove("theme:a").unwrap();
        store.remove("theme:a").unwrap();
        assert_eq!(store.read("theme:a").unwrap(), None);
    }

    #[test]
    fn file_stores_share_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileStore::open(dir.path()).unwrap();
        let reader = FileStore::open(dir.path()).unwrap();

        writer.write("k", "v").unwrap();
        assert_eq!(reader.read("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn concurrent_upserts_never_tear_a_record() {
        const LEN: usize = 200 * 1024;
        let dir = tempfile::tempdir().unwrap();
        let key = "vitrine.theme.current";

        std::thread::scope(|scope| {
            for fill in ['a', 'b', 'c', 'd'] {
                let store = FileStore::open(dir.path()).unwrap();
                scope.spawn(move || {
                    let value = fill.to_string().repeat(LEN);
                    for _ in 0..50 {
                        store.write(key, &value).unwrap();
                        let read = store.read(key).unwrap().unwrap();
                        assert_eq!(read.len(), LEN);
                        let first = read.chars().next().unwrap();
                        assert!(read.chars().all(|c| c == first));
                    }
                });
            }
        });

        // Temp files are renamed away, never left behind as records
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.keys().unwrap(), vec![key.to_string()]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
