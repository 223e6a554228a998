use anyhow::{bail, Result};
use realtime_sync::{ConnectionState, InboundMessage, ReceivedEvent, SyncClient};
use std::future::Future;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::metrics::Metrics;

/// One-line operator summary of an accepted event.
pub fn describe_event(event: &ReceivedEvent) -> String {
    match &event.message {
        InboundMessage::PriceUpdate(tick) => format!(
            "💹 {} ${} ({:+.2}% 24h)",
            tick.address, tick.update.price, tick.update.price_change_24h
        ),
        InboundMessage::NewToken(raw) => format!(
            "🆕 New token {}",
            raw.get("symbol")
                .or_else(|| raw.get("address"))
                .and_then(|v| v.as_str())
                .unwrap_or("?")
        ),
        InboundMessage::TradeExecuted(raw) => format!(
            "✅ Trade executed {}",
            raw.get("transaction_id")
                .and_then(|v| v.as_str())
                .unwrap_or("?")
        ),
        InboundMessage::WalletUpdate(wallet) => format!(
            "👛 Wallet {}: {} SOL (${:.2} total)",
            wallet.wallet_id, wallet.sol_balance, wallet.total_value_usd
        ),
        InboundMessage::WalletDeleted(removed) => format!("🗑️ Wallet {} removed", removed.wallet_id),
        InboundMessage::RugpullAlert(raw) => format!(
            "🚨 Rugpull alert {}",
            raw.get("token_address")
                .and_then(|v| v.as_str())
                .unwrap_or("?")
        ),
        InboundMessage::TradingStatus(status) => format!(
            "🤖 Auto trader {}",
            if status.enabled { "enabled" } else { "disabled" }
        ),
        InboundMessage::AutoTradeEvent(_) => "🤖 Auto trade event".to_string(),
        InboundMessage::Unknown { kind, .. } => format!("❔ {}", kind),
    }
}

/// Streams events until `shutdown` resolves or the client gives up
/// reconnecting. The watchlist is re-subscribed after every open.
pub async fn run_watch<F>(
    client: &SyncClient,
    watchlist: &[String],
    metrics: &Metrics,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let mut connection = client.watch_connection();
    let mut events = client.events();
    tokio::pin!(shutdown);

    client.connect();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("🛑 Shutting down realtime feed");
                client.disconnect();
                return Ok(());
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    bail!("realtime worker stopped");
                }
                let state = *connection.borrow_and_update();
                metrics.record_connection(&state, client.reconnect_attempts());
                match state {
                    ConnectionState::Connected => {
                        for token in watchlist {
                            client.subscribe_to_token(token);
                        }
                        info!("📡 Subscribed to {} watchlist tokens", watchlist.len());
                    }
                    ConnectionState::Idle { attempt } => {
                        bail!("realtime connection lost after {} reconnect attempts", attempt);
                    }
                    _ => {}
                }
            }
            received = events.recv() => match received {
                Ok(event) => {
                    metrics.record_event(&event);
                    info!("{}", describe_event(&event));
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} events", skipped),
                Err(RecvError::Closed) => bail!("realtime event stream closed"),
            }
        }
    }
}
