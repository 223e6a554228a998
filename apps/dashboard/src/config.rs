use anyhow::{Context, Result};
use realtime_sync::RealtimeConfig;
use secure_store::DEFAULT_PREFIX;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_DATA_DIR: &str = ".solsniperx";
pub const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub api_url: String,
    pub data_dir: PathBuf,
    pub storage_prefix: String,
    pub http_timeout: Duration,
    pub realtime: RealtimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_prefix: DEFAULT_PREFIX.to_string(),
            http_timeout: Duration::from_secs(30),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let http_timeout = match env::var("SOLSNIPERX_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .context("Invalid SOLSNIPERX_HTTP_TIMEOUT_SECS")?,
            ),
            Err(_) => defaults.http_timeout,
        };

        Ok(Self {
            api_url: env::var("SOLSNIPERX_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            data_dir: env::var("SOLSNIPERX_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            storage_prefix: env::var("SOLSNIPERX_STORAGE_PREFIX")
                .unwrap_or(defaults.storage_prefix),
            http_timeout,
            realtime: RealtimeConfig::from_env()?,
        })
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }
}
