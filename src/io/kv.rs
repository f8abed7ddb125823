use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::io::lock::{DataLock, LockError};
use crate::io::recovery::atomic_write;

/// Error type for key/value storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key} ({needed} of {quota} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("storage is disabled")]
    Disabled,
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a valid storage file: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize storage: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Locked(#[from] LockError),
}

/// One write in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set(String, String),
    Remove(String),
}

impl KvWrite {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        KvWrite::Set(key.into(), value.into())
    }

    pub fn remove(key: impl Into<String>) -> Self {
        KvWrite::Remove(key.into())
    }

    fn apply_to(&self, map: &mut IndexMap<String, String>) {
        match self {
            KvWrite::Set(k, v) => {
                map.insert(k.clone(), v.clone());
            }
            KvWrite::Remove(k) => {
                map.shift_remove(k);
            }
        }
    }
}

/// Flat string→string durable storage.
///
/// Reads and writes are synchronous. `apply` commits a batch; backends that
/// can do so make it all-or-nothing.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    fn apply(&mut self, batch: &[KvWrite]) -> Result<(), StorageError> {
        for write in batch {
            match write {
                KvWrite::Set(k, v) => self.set(k, v)?,
                KvWrite::Remove(k) => self.remove(k)?,
            }
        }
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn apply(&mut self, batch: &[KvWrite]) -> Result<(), StorageError> {
        (**self).apply(batch)
    }
}

/// Total bytes of keys and values, the unit the quota is measured in.
fn payload_size(map: &IndexMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory store with an optional byte quota and an off switch,
/// used for tests and for running without a writable data directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: IndexMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryStore {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    /// Make every subsequent read and write fail with `Disabled`
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    fn check(&self, key: &str, candidate: &IndexMap<String, String>) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        if let Some(quota) = self.quota {
            let needed = payload_size(candidate);
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Disabled);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[KvWrite::set(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.apply(&[KvWrite::remove(key)])
    }

    fn apply(&mut self, batch: &[KvWrite]) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        for write in batch {
            write.apply_to(&mut next);
        }
        let key = match batch.first() {
            Some(KvWrite::Set(k, _)) | Some(KvWrite::Remove(k)) => k.as_str(),
            None => "",
        };
        self.check(key, &next)?;
        self.entries = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// JSON-object file store shared by every `pl` process of a project.
///
/// Reads come from the map cached at open. Each write takes the data lock
/// on the file's directory, re-reads the file, applies the batch to what is
/// on disk and commits it atomically, so writes from another process since
/// open are kept and a batch lands entirely or not at all.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(FileStore {
            path: path.to_path_buf(),
            entries: read_entries(path)?,
        })
    }

    /// An empty store at `path` that ignores whatever is on disk.
    /// The file is only replaced on the next write.
    pub fn empty(path: &Path) -> Self {
        FileStore {
            path: path.to_path_buf(),
            entries: IndexMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &IndexMap<String, String> {
        &self.entries
    }

    fn lock_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Current file contents. A file that no longer parses is replaced by
    /// the cached map; its raw text was preserved when it was first opened.
    fn latest(&self) -> Result<IndexMap<String, String>, StorageError> {
        match read_entries(&self.path) {
            Ok(entries) => Ok(entries),
            Err(StorageError::Corrupt { .. }) => Ok(self.entries.clone()),
            Err(e) => Err(e),
        }
    }

    fn commit(&mut self, next: IndexMap<String, String>) -> Result<(), StorageError> {
        let mut content = serde_json::to_string_pretty(&next)?;
        content.push('\n');
        atomic_write(&self.path, content.as_bytes()).map_err(|e| StorageError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;
        self.entries = next;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<IndexMap<String, String>, StorageError> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(IndexMap::new()),
        Ok(text) => serde_json::from_str(&text).map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IndexMap::new()),
        Err(e) => Err(StorageError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[KvWrite::set(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.apply(&[KvWrite::remove(key)])
    }

    fn apply(&mut self, batch: &[KvWrite]) -> Result<(), StorageError> {
        let _lock = DataLock::acquire_default(self.lock_dir())?;
        let mut next = self.latest()?;
        for write in batch {
            write.apply_to(&mut next);
        }
        self.commit(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_set_get_remove() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn memory_quota_rejects_without_partial_write() {
        let mut store = MemoryStore::with_quota(8);
        store.set("ab", "12").unwrap();
        let err = store
            .apply(&[KvWrite::set("cd", "34"), KvWrite::set("ef", "5678")])
            .unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("cd").unwrap(), None);
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn memory_disabled_fails_reads_and_writes() {
        let mut store = MemoryStore::new();
        store.set_disabled(true);
        assert!(matches!(store.get("a"), Err(StorageError::Disabled)));
        assert!(matches!(store.set("a", "1"), Err(StorageError::Disabled)));
    }

    #[test]
    fn file_store_persists_across_open() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".storage.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("task-1", "true").unwrap();
            store.set("notes_p1", "line one\nline two").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("task-1").unwrap().as_deref(), Some("true"));
        assert_eq!(
            store.get("notes_p1").unwrap().as_deref(),
            Some("line one\nline two")
        );
        let keys: Vec<&String> = store.entries().keys().collect();
        assert_eq!(keys, vec!["task-1", "notes_p1"]);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(&tmp.path().join("nope.json")).unwrap();
        assert!(store.entries().is_empty());
        assert!(!tmp.path().join("nope.json").exists());
    }

    #[test]
    fn file_store_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".storage.json");
        fs::write(&path, "not json {{{").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn file_store_batch_is_one_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".storage.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set("a", "true").unwrap();
        store.set("b", "x").unwrap();
        store
            .apply(&[KvWrite::remove("a"), KvWrite::set("b", "y"), KvWrite::set("c", "0")])
            .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let on_disk: IndexMap<String, String> = serde_json::from_str(&text).unwrap();
        assert_eq!(on_disk.get("a"), None);
        assert_eq!(on_disk.get("b").map(String::as_str), Some("y"));
        assert_eq!(on_disk.get("c").map(String::as_str), Some("0"));
    }

    #[test]
    fn file_store_failed_write_keeps_cache() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone").join(".storage.json");
        let mut store = FileStore::empty(&path);
        assert!(matches!(
            store.set("a", "1"),
            Err(StorageError::Locked(_))
        ));
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn file_store_keeps_writes_from_another_handle() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".storage.json");
        let mut first = FileStore::open(&path).unwrap();
        first.set("timer_p1", "0").unwrap();

        let mut second = FileStore::open(&path).unwrap();
        second.set("t1", "true").unwrap();

        first.set("timer_p1", "1").unwrap();
        first.apply(&[KvWrite::remove("notes_p1")]).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("t1").unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get("timer_p1").unwrap().as_deref(), Some("1"));
        assert_eq!(first.get("t1").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn file_store_write_leaves_lock_file_unlocked() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::open(&tmp.path().join(".storage.json")).unwrap();
        store.set("a", "1").unwrap();
        assert!(DataLock::acquire(tmp.path(), std::time::Duration::from_millis(50)).is_ok());
    }
}
