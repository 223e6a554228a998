use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::backend::StorageBackend;
use crate::error::Result;
use crate::obfuscation;

pub const DEFAULT_PREFIX: &str = "solsniperx_";

/// Entry holding the obfuscation key. Never exported or imported.
pub const ENCRYPTION_KEY: &str = "encryption_key";

/// Namespaced JSON storage with a plain and an obfuscated tier.
///
/// Public operations never fail: reads degrade to `None` and writes to
/// `false`, with the cause logged. `None` means "absent or unreadable".
pub struct LocalStore<B> {
    backend: B,
    prefix: String,
}

impl<B: StorageBackend> LocalStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_prefix(backend, DEFAULT_PREFIX)
    }

    pub fn with_prefix(backend: B, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set_item(key, value) {
            Ok(()) => true,
            Err(e) => {
                error!("Error storing item {}: {}", key, e);
                false
            }
        }
    }

    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get_item(key) {
            Ok(value) => value,
            Err(e) => {
                error!("Error retrieving item {}: {}", key, e);
                None
            }
        }
    }

    pub fn set_secure_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set_secure_item(key, value) {
            Ok(()) => true,
            Err(e) => {
                error!("Error storing secure item {}: {}", key, e);
                false
            }
        }
    }

    pub fn get_secure_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get_secure_item(key) {
            Ok(value) => value,
            Err(e) => {
                error!("Error retrieving secure item {}: {}", key, e);
                None
            }
        }
    }

    pub fn remove_item(&self, key: &str) -> bool {
        match self.backend.remove(&self.namespaced(key)) {
            Ok(()) => true,
            Err(e) => {
                error!("Error removing item {}: {}", key, e);
                false
            }
        }
    }

    /// Deletes every namespaced entry, the obfuscation key included. Secure
    /// entries written before the clear cannot be read back afterwards.
    pub fn clear_all(&self) -> bool {
        let result = self.backend.keys().and_then(|keys| {
            keys.iter()
                .filter(|k| k.starts_with(&self.prefix))
                .try_for_each(|k| self.backend.remove(k))
        });
        match result {
            Ok(()) => true,
            Err(e) => {
                error!("Error clearing data: {}", e);
                false
            }
        }
    }

    /// Keys under the namespace, prefix stripped.
    pub fn all_keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .iter()
                .filter_map(|k| k.strip_prefix(&self.prefix))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                error!("Error getting keys: {}", e);
                Vec::new()
            }
        }
    }

    /// Raw stored text of an entry, without any decoding.
    pub fn raw_item(&self, key: &str) -> Option<String> {
        self.backend.get(&self.namespaced(key)).ok().flatten()
    }

    /// Decoded copy of every entry except the key material, for backup.
    /// Obfuscated entries are exported in the clear.
    pub fn export_data(&self) -> Map<String, Value> {
        self.all_keys()
            .into_iter()
            .filter(|key| key != ENCRYPTION_KEY)
            .map(|key| {
                let value = self.decode_any(&key).unwrap_or(Value::Null);
                (key, value)
            })
            .collect()
    }

    /// Writes every entry back through the plain tier. Data that was secure
    /// before export is not re-obfuscated.
    pub fn import_data(&self, data: &Map<String, Value>) -> bool {
        let mut ok = true;
        for (key, value) in data {
            if key == ENCRYPTION_KEY {
                warn!("Skipping {} during import", ENCRYPTION_KEY);
                continue;
            }
            ok &= self.set_item(key, value);
        }
        ok
    }

    fn decode_any(&self, key: &str) -> Option<Value> {
        let raw = self.raw_item(key)?;
        serde_json::from_str(&raw)
            .ok()
            .or_else(|| self.get_secure_item(key))
    }

    fn try_set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.backend.set(&self.namespaced(key), &json)
    }

    fn try_get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(&self.namespaced(key))? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    fn try_set_secure_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let key_material = self.obfuscation_key()?;
        let encoded = obfuscation::obfuscate(&json, &key_material);
        self.backend.set(&self.namespaced(key), &encoded)
    }

    fn try_get_secure_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let encoded = match self.backend.get(&self.namespaced(key))? {
            Some(encoded) if !encoded.is_empty() => encoded,
            _ => return Ok(None),
        };
        let key_material = self.obfuscation_key()?;
        let json = obfuscation::reveal(&encoded, &key_material)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// The stored key, created and persisted on first use.
    fn obfuscation_key(&self) -> Result<String> {
        let name = self.namespaced(ENCRYPTION_KEY);
        if let Some(key) = self.backend.get(&name)? {
            if !key.is_empty() {
                return Ok(key);
            }
        }
        let key = obfuscation::generate_key();
        self.backend.set(&name, &key)?;
        Ok(key)
    }
}
