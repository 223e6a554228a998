use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FrameError;

/// Market data for one token, as held in the price slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_24h: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub volume_24h: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub liquidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub address: String,
    #[serde(flatten)]
    pub update: PriceUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mint_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance_raw: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub usd_value: f64,
}

/// Balances pushed for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalances {
    pub wallet_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sol_balance: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub usd_value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tokens: Vec<TokenBalance>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_value_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRemoved {
    pub wallet_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Every frame the backend pushes, decoded once by its `type` field.
///
/// Payloads without a slice of their own (`new_token`, `trade_executed`,
/// alerts) are kept as the raw JSON object so consumers see exactly what the
/// backend sent.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    PriceUpdate(PriceTick),
    NewToken(Value),
    TradeExecuted(Value),
    WalletUpdate(WalletBalances),
    WalletDeleted(WalletRemoved),
    RugpullAlert(Value),
    TradingStatus(TradingStatus),
    AutoTradeEvent(Value),
    Unknown { kind: String, raw: Value },
}

impl InboundMessage {
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let raw: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, FrameError> {
        if !raw.is_object() {
            return Err(FrameError::NotAnObject);
        }
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingType)?
            .to_string();

        let message = match kind.as_str() {
            "price_update" => InboundMessage::PriceUpdate(payload(&kind, &raw)?),
            "new_token" => InboundMessage::NewToken(raw),
            "trade_executed" => InboundMessage::TradeExecuted(raw),
            "wallet_update" => InboundMessage::WalletUpdate(payload(&kind, &raw)?),
            "wallet_deleted" => InboundMessage::WalletDeleted(payload(&kind, &raw)?),
            "rugpull_alert" => InboundMessage::RugpullAlert(raw),
            "trading_status" => InboundMessage::TradingStatus(payload(&kind, &raw)?),
            "auto_trade_event" => InboundMessage::AutoTradeEvent(raw),
            _ => InboundMessage::Unknown { kind, raw },
        };
        Ok(message)
    }

    /// The wire discriminator this message arrived with.
    pub fn kind(&self) -> &str {
        match self {
            InboundMessage::PriceUpdate(_) => "price_update",
            InboundMessage::NewToken(_) => "new_token",
            InboundMessage::TradeExecuted(_) => "trade_executed",
            InboundMessage::WalletUpdate(_) => "wallet_update",
            InboundMessage::WalletDeleted(_) => "wallet_deleted",
            InboundMessage::RugpullAlert(_) => "rugpull_alert",
            InboundMessage::TradingStatus(_) => "trading_status",
            InboundMessage::AutoTradeEvent(_) => "auto_trade_event",
            InboundMessage::Unknown { kind, .. } => kind,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, InboundMessage::Unknown { .. })
    }
}

/// Backend payloads carry `null` for unknown numbers; read it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn payload<T: DeserializeOwned>(kind: &str, raw: &Value) -> Result<T, FrameError> {
    T::deserialize(raw).map_err(|source| FrameError::Payload {
        kind: kind.to_string(),
        source,
    })
}

/// Control frames the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Subscribe { token_id: String },
    Unsubscribe { token_id: String },
}
