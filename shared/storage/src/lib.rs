//! Local persistence for the SolSniperX dashboard: a namespaced JSON
//! key/value store with an obfuscated tier for credentials.

pub mod backend;
pub mod error;
pub mod obfuscation;
pub mod store;
pub mod user_data;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use error::{Result, StoreError};
pub use store::{LocalStore, DEFAULT_PREFIX, ENCRYPTION_KEY};
pub use user_data::{Session, UserDataStore};
