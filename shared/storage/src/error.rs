use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage quota exceeded writing {key} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("corrupt storage file: {0}")]
    Corrupt(String),

    #[error("failed to decode obfuscated entry: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
