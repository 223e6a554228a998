use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx reply. `message` is the backend's `error` field when present.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyRequest<'a> {
    pub token_address: &'a str,
    pub amount_sol: f64,
    pub slippage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellRequest<'a> {
    pub token_address: &'a str,
    pub amount_tokens: f64,
    pub slippage: f64,
}

pub const DEFAULT_SLIPPAGE: f64 = 1.0;

/// JSON client for the SolSniperX REST backend.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Bearer token sent with every request, usually the stored auth token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let data: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = error_message(status, data.as_ref());
            warn!("API error on {}: {}", endpoint, message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        data.ok_or_else(|| ApiError::Decode(format!("{} returned non-JSON body", endpoint)))
    }

    pub async fn health(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/health", None).await
    }

    pub async fn scan_tokens(&self, params: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, "/api/scanner/scan", Some(params))
            .await
    }

    pub async fn analyze_token(&self, token_id: &str) -> Result<Value, ApiError> {
        self.request(Method::POST, &format!("/api/ai/analyze/{}", token_id), None)
            .await
    }

    pub async fn trading_signals(&self, token_id: &str) -> Result<Value, ApiError> {
        self.request(
            Method::POST,
            &format!("/api/ai/trading-signals/{}", token_id),
            None,
        )
        .await
    }

    pub async fn monitor_mempool(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/mempool/monitor", None).await
    }

    pub async fn buy_token(
        &self,
        token_address: &str,
        amount_sol: f64,
        slippage: Option<f64>,
    ) -> Result<Value, ApiError> {
        let body = json!(BuyRequest {
            token_address,
            amount_sol,
            slippage: slippage.unwrap_or(DEFAULT_SLIPPAGE),
        });
        self.request(Method::POST, "/api/trading/buy", Some(&body))
            .await
    }

    pub async fn sell_token(
        &self,
        token_address: &str,
        amount_tokens: f64,
        slippage: Option<f64>,
    ) -> Result<Value, ApiError> {
        let body = json!(SellRequest {
            token_address,
            amount_tokens,
            slippage: slippage.unwrap_or(DEFAULT_SLIPPAGE),
        });
        self.request(Method::POST, "/api/trading/sell", Some(&body))
            .await
    }

    pub async fn dashboard_data(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/analytics/dashboard", None)
            .await
    }

    pub async fn transactions(&self, limit: u32) -> Result<Value, ApiError> {
        self.request(
            Method::GET,
            &format!("/api/analytics/transactions?limit={}", limit),
            None,
        )
        .await
    }

    pub async fn token_history(
        &self,
        token_address: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Value, ApiError> {
        self.request(
            Method::GET,
            &format!(
                "/api/tokens/{}/history?interval={}&limit={}",
                token_address, interval, limit
            ),
            None,
        )
        .await
    }

    pub async fn wallet_balance(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/wallet/balance", None).await
    }

    pub async fn wallets(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, "/api/wallets", None).await
    }

    pub async fn add_wallet(&self, name: &str, private_key: &str) -> Result<Value, ApiError> {
        let body = json!({ "name": name, "private_key": private_key });
        self.request(Method::POST, "/api/wallets", Some(&body)).await
    }

    pub async fn update_wallet(&self, wallet_id: &str, updates: &Value) -> Result<Value, ApiError> {
        self.request(
            Method::PUT,
            &format!("/api/wallets/{}", wallet_id),
            Some(updates),
        )
        .await
    }

    pub async fn delete_wallet(&self, wallet_id: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, &format!("/api/wallets/{}", wallet_id), None)
            .await
    }

    pub async fn start_auto_trader(&self) -> Result<Value, ApiError> {
        self.request(Method::POST, "/api/auto-trader/start", None)
            .await
    }

    pub async fn stop_auto_trader(&self) -> Result<Value, ApiError> {
        self.request(Method::POST, "/api/auto-trader/stop", None)
            .await
    }
}

fn error_message(status: StatusCode, data: Option<&Value>) -> String {
    data.and_then(|d| d.get("error"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_backend_field() {
        let data = json!({"error": "Insufficient balance"});
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, Some(&data)),
            "Insufficient balance"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, None),
            "HTTP error! status: 500"
        );
        let data = json!({"detail": "nope"});
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, Some(&data)),
            "HTTP error! status: 404"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
