use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::StorageBackend;
use crate::store::LocalStore;

pub const USER_KEY: &str = "user";
pub const PRIVATE_KEY_KEY: &str = "private_key";
pub const WALLET_KEY: &str = "wallet";
pub const WATCHLIST_KEY: &str = "watchlist";
pub const SETTINGS_KEY: &str = "settings";
pub const TRADING_HISTORY_KEY: &str = "trading_history";
pub const ANALYTICS_KEY: &str = "analytics";
pub const AUTH_TOKEN_KEY: &str = "token";

/// Everything the dashboard restores on startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<Value>,
    pub is_logged_in: bool,
    pub wallet: Option<Value>,
    pub settings: Map<String, Value>,
}

/// Typed accessors over a [`LocalStore`] for the dashboard's fixed keys.
///
/// Credentials (user, private key, wallet) go through the obfuscated tier;
/// everything else is stored as plain JSON.
pub struct UserDataStore<B> {
    store: LocalStore<B>,
}

impl<B: StorageBackend> UserDataStore<B> {
    pub fn new(store: LocalStore<B>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LocalStore<B> {
        &self.store
    }

    pub fn save_user(&self, user: &Value) -> bool {
        self.store.set_secure_item(USER_KEY, user)
    }

    pub fn get_user(&self) -> Option<Value> {
        self.store.get_secure_item::<Value>(USER_KEY).filter(|v| !v.is_null())
    }

    pub fn save_private_key(&self, private_key: &str) -> bool {
        self.store.set_secure_item(PRIVATE_KEY_KEY, private_key)
    }

    pub fn get_private_key(&self) -> Option<String> {
        self.store.get_secure_item(PRIVATE_KEY_KEY)
    }

    pub fn save_wallet(&self, wallet: &Value) -> bool {
        self.store.set_secure_item(WALLET_KEY, wallet)
    }

    pub fn get_wallet(&self) -> Option<Value> {
        self.store.get_secure_item::<Value>(WALLET_KEY).filter(|v| !v.is_null())
    }

    pub fn save_watchlist(&self, watchlist: &[String]) -> bool {
        self.store.set_item(WATCHLIST_KEY, watchlist)
    }

    pub fn get_watchlist(&self) -> Vec<String> {
        self.store.get_item(WATCHLIST_KEY).unwrap_or_default()
    }

    /// Appends `token` unless already present. Returns the write result.
    pub fn add_to_watchlist(&self, token: &str) -> bool {
        let mut watchlist = self.get_watchlist();
        if watchlist.iter().any(|t| t == token) {
            return true;
        }
        watchlist.push(token.to_string());
        self.save_watchlist(&watchlist)
    }

    pub fn remove_from_watchlist(&self, token: &str) -> bool {
        let mut watchlist = self.get_watchlist();
        watchlist.retain(|t| t != token);
        self.save_watchlist(&watchlist)
    }

    pub fn save_settings(&self, settings: &Map<String, Value>) -> bool {
        self.store.set_item(SETTINGS_KEY, settings)
    }

    pub fn get_settings(&self) -> Map<String, Value> {
        self.store.get_item(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save_trading_history(&self, history: &[Value]) -> bool {
        self.store.set_item(TRADING_HISTORY_KEY, history)
    }

    pub fn get_trading_history(&self) -> Vec<Value> {
        self.store.get_item(TRADING_HISTORY_KEY).unwrap_or_default()
    }

    pub fn save_analytics(&self, analytics: &Map<String, Value>) -> bool {
        self.store.set_item(ANALYTICS_KEY, analytics)
    }

    pub fn get_analytics(&self) -> Map<String, Value> {
        self.store.get_item(ANALYTICS_KEY).unwrap_or_default()
    }

    pub fn save_auth_token(&self, token: &str) -> bool {
        self.store.set_item(AUTH_TOKEN_KEY, token)
    }

    pub fn get_auth_token(&self) -> Option<String> {
        self.store.get_item(AUTH_TOKEN_KEY)
    }

    pub fn remove_auth_token(&self) -> bool {
        self.store.remove_item(AUTH_TOKEN_KEY)
    }

    /// True when both a user and a private key are stored and readable.
    pub fn is_logged_in(&self) -> bool {
        self.get_user().is_some() && self.get_private_key().is_some()
    }

    /// Forgets the credentials. Watchlist, settings, history, analytics and
    /// the auth token survive.
    pub fn logout(&self) -> bool {
        [USER_KEY, PRIVATE_KEY_KEY, WALLET_KEY]
            .iter()
            .fold(true, |ok, key| self.store.remove_item(key) && ok)
    }

    pub fn session(&self) -> Session {
        Session {
            user: self.get_user(),
            is_logged_in: self.is_logged_in(),
            wallet: self.get_wallet(),
            settings: self.get_settings(),
        }
    }
}
