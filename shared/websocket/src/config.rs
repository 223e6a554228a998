use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::reconnect::ReconnectPolicy;

pub const DEFAULT_WS_URL: &str = "ws://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub url: String,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay: Duration,
    /// Capacity of the event stream; slow subscribers lag past this.
    pub event_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            max_reconnect_attempts: 5,
            base_reconnect_delay: Duration::from_millis(1000),
            event_buffer: 256,
        }
    }
}

impl RealtimeConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let url = env::var("SOLSNIPERX_WS_URL").unwrap_or(defaults.url);

        let max_reconnect_attempts = match env::var("SOLSNIPERX_MAX_RECONNECT_ATTEMPTS") {
            Ok(raw) => raw
                .parse()
                .context("Invalid SOLSNIPERX_MAX_RECONNECT_ATTEMPTS")?,
            Err(_) => defaults.max_reconnect_attempts,
        };

        let base_reconnect_delay = match env::var("SOLSNIPERX_RECONNECT_BASE_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse()
                    .context("Invalid SOLSNIPERX_RECONNECT_BASE_MS")?,
            ),
            Err(_) => defaults.base_reconnect_delay,
        };

        Ok(Self {
            url,
            max_reconnect_attempts,
            base_reconnect_delay,
            event_buffer: defaults.event_buffer,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_reconnect_attempts,
            base_delay: self.base_reconnect_delay,
        }
    }
}
