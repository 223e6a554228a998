//! View state folded from the inbound event stream.
//!
//! `SyncSnapshot::apply` is a pure reducer: it never mutates the snapshot it
//! is called on, so published `Arc<SyncSnapshot>` values stay valid for every
//! reader regardless of what arrives next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::FrameError;
use crate::types::{InboundMessage, PriceUpdate, TokenBalance, TradingStatus};

/// One accepted inbound frame, numbered in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    pub seq: u64,
    pub received_at: DateTime<Utc>,
    pub message: InboundMessage,
    /// The frame exactly as it arrived.
    pub raw: Value,
}

impl ReceivedEvent {
    pub fn new(seq: u64, received_at: DateTime<Utc>, raw: Value) -> Result<Self, FrameError> {
        let message = InboundMessage::from_value(raw.clone())?;
        Ok(Self {
            seq,
            received_at,
            message,
            raw,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletUpdate {
    pub sol_balance: f64,
    pub usd_value: f64,
    pub tokens: Vec<TokenBalance>,
    pub total_value_usd: f64,
    pub last_updated: DateTime<Utc>,
}

/// The most recent frame, whatever its type. Discrete-event consumers must
/// filter on `kind`: price ticks land here too.
#[derive(Debug, Clone, PartialEq)]
pub struct LastEvent {
    pub seq: u64,
    pub kind: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSnapshot {
    pub prices: HashMap<String, PriceUpdate>,
    pub wallets: HashMap<String, WalletUpdate>,
    pub last_event: Option<LastEvent>,
    pub trading_status: Option<TradingStatus>,
    /// Sequence number of the last event folded in; 0 before any.
    pub seq: u64,
}

impl SyncSnapshot {
    pub fn price(&self, address: &str) -> Option<&PriceUpdate> {
        self.prices.get(address)
    }

    pub fn wallet(&self, wallet_id: &str) -> Option<&WalletUpdate> {
        self.wallets.get(wallet_id)
    }

    /// Last event only if it carries the given discriminator.
    pub fn last_event_of(&self, kind: &str) -> Option<&LastEvent> {
        self.last_event.as_ref().filter(|event| event.kind == kind)
    }

    pub fn apply(&self, event: &ReceivedEvent) -> SyncSnapshot {
        let mut next = self.clone();

        match &event.message {
            InboundMessage::Unknown { .. } => return next,
            InboundMessage::PriceUpdate(tick) => {
                next.prices.insert(tick.address.clone(), tick.update.clone());
            }
            InboundMessage::WalletUpdate(balances) => {
                next.wallets.insert(
                    balances.wallet_id.clone(),
                    WalletUpdate {
                        sol_balance: balances.sol_balance,
                        usd_value: balances.usd_value,
                        tokens: balances.tokens.clone(),
                        total_value_usd: balances.total_value_usd,
                        last_updated: event.received_at,
                    },
                );
            }
            InboundMessage::WalletDeleted(removed) => {
                next.wallets.remove(&removed.wallet_id);
            }
            InboundMessage::TradingStatus(status) => {
                next.trading_status = Some(status.clone());
            }
            InboundMessage::NewToken(_)
            | InboundMessage::TradeExecuted(_)
            | InboundMessage::RugpullAlert(_)
            | InboundMessage::AutoTradeEvent(_) => {}
        }

        next.last_event = Some(LastEvent {
            seq: event.seq,
            kind: event.message.kind().to_string(),
            payload: event.raw.clone(),
        });
        next.seq = event.seq;
        next
    }
}
