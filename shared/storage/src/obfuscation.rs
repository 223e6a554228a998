//! Reversible text transform for the "secure" tier.
//!
//! This is obfuscation, not encryption: the stored text is
//! `base64(json + key)` and the key sits next to it in the same storage. It
//! keeps credentials out of casual view and nothing more.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{Result, StoreError};

pub const KEY_LENGTH: usize = 32;

/// Fresh per-profile key material: 32 characters from `[A-Za-z0-9]`.
pub fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

pub fn obfuscate(json: &str, key: &str) -> String {
    let mut plain = String::with_capacity(json.len() + key.len());
    plain.push_str(json);
    plain.push_str(key);
    BASE64_STANDARD.encode(plain.as_bytes())
}

/// Reverses [`obfuscate`], returning the JSON text. The key is taken off the
/// end; text that does not end with it loses the first occurrence instead.
pub fn reveal(encoded: &str, key: &str) -> Result<String> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    let plain = String::from_utf8(bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
    match plain.strip_suffix(key) {
        Some(json) => Ok(json.to_string()),
        None => Ok(plain.replacen(key, "", 1)),
    }
}
