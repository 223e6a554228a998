use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use realtime_sync::{ConnectionState, ConnectionStatus, InboundMessage, ReceivedEvent};
use std::sync::Arc;

pub struct Metrics {
    pub frames_received: IntCounterVec,
    pub reconnect_attempts: IntCounter,
    pub connected: IntGauge,
    pub trades_executed: IntCounter,
    registry: Registry,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Arc<Self>> {
        let registry = Registry::new();

        let frames_received = IntCounterVec::new(
            Opts::new(
                "solsniperx_frames_received_total",
                "Realtime frames accepted, by message type",
            ),
            &["kind"],
        )?;

        let reconnect_attempts = IntCounter::new(
            "solsniperx_reconnect_attempts_total",
            "Automatic reconnect dials",
        )?;

        let connected = IntGauge::new(
            "solsniperx_connected",
            "1 while the realtime connection is open",
        )?;

        let trades_executed = IntCounter::new(
            "solsniperx_trades_executed_total",
            "trade_executed notifications received",
        )?;

        registry.register(Box::new(frames_received.clone()))?;
        registry.register(Box::new(reconnect_attempts.clone()))?;
        registry.register(Box::new(connected.clone()))?;
        registry.register(Box::new(trades_executed.clone()))?;

        Ok(Arc::new(Self {
            frames_received,
            reconnect_attempts,
            connected,
            trades_executed,
            registry,
        }))
    }

    pub fn record_event(&self, event: &ReceivedEvent) {
        self.frames_received
            .with_label_values(&[event.message.kind()])
            .inc();
        if matches!(event.message, InboundMessage::TradeExecuted(_)) {
            self.trades_executed.inc();
        }
    }

    /// Feed every observed connection state along with the client's running
    /// reconnect total. States may be coalesced; the total is exact.
    pub fn record_connection(&self, state: &ConnectionState, reconnects_total: u64) {
        self.connected
            .set(i64::from(state.status() == ConnectionStatus::Connected));
        let seen = self.reconnect_attempts.get();
        if reconnects_total > seen {
            self.reconnect_attempts.inc_by(reconnects_total - seen);
        }
    }

    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
