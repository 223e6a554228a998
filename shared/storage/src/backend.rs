//! Durable key/value media the store can sit on.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, StoreError};

/// String-to-string storage with per-key atomic writes, the contract of a
/// browser's local storage.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// In-process storage. An optional byte quota reproduces the
/// quota-exceeded failures of real browser storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// Raw stored text, bypassing any namespace or decoding.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn used_bytes(entries: &BTreeMap<String, String>, skip: &str) -> usize {
    entries
        .iter()
        .filter(|(k, _)| k.as_str() != skip)
        .map(|(k, v)| k.len() + v.len())
        .sum()
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some(quota) = self.quota {
            let available = quota.saturating_sub(used_bytes(&entries, key));
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

/// Storage persisted as a single JSON object on disk. Every write replaces
/// the file through a temp file and rename, so a crash never leaves it
/// half-written.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read(&path)?;
            if raw.iter().all(u8::is_ascii_whitespace) {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&raw)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened storage at {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut json_bytes = serde_json::to_vec_pretty(entries)?;
        json_bytes.push(b'\n');
        let tmp_path = temp_path(&self.path);
        fs::write(&tmp_path, &json_bytes)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os_string = path.as_os_str().to_os_string();
    os_string.push(".tmp");
    os_string.into()
}
