use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::{Connector, Session, WsConnector};
use crate::config::RealtimeConfig;
use crate::error::{FrameError, TransportError};
use crate::reconnect::{ConnectionState, ConnectionStatus, ReconnectPolicy};
use crate::state::{ReceivedEvent, SyncSnapshot};
use crate::types::OutboundMessage;

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Send(String),
    Shutdown,
}

/// Handle to the realtime sync worker.
///
/// Every operation returns immediately; outcomes show up later on the
/// connection and snapshot watch channels. Dropping the handle stops the
/// worker and closes any open session.
pub struct SyncClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    snapshot: watch::Receiver<Arc<SyncSnapshot>>,
    events: broadcast::Sender<ReceivedEvent>,
    reconnects: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl SyncClient {
    /// Starts the worker on the current tokio runtime. Nothing is dialed until
    /// [`SyncClient::connect`] is called.
    pub fn spawn<C: Connector>(config: RealtimeConfig, connector: C) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::default());
        let (snapshot_tx, snapshot) = watch::channel(Arc::new(SyncSnapshot::default()));
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let reconnects = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            policy: config.reconnect_policy(),
            url: config.url,
            connector: Box::new(connector),
            state: ConnectionState::default(),
            session: None,
            dialing: None,
            snapshot: Arc::new(SyncSnapshot::default()),
            seq: 0,
            state_tx,
            snapshot_tx,
            events_tx: events.clone(),
            reconnects: reconnects.clone(),
        };
        let task = tokio::spawn(worker.run(command_rx));

        Self {
            commands,
            state,
            snapshot,
            events,
            reconnects,
            task,
        }
    }

    pub fn websocket(config: RealtimeConfig) -> Self {
        Self::spawn(config, WsConnector)
    }

    pub fn connect(&self) {
        self.command(Command::Connect);
    }

    /// Cancels a pending reconnect and closes the session. Safe to repeat.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Serializes and transmits `message` if connected; otherwise a no-op.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) {
        if self.status() != ConnectionStatus::Connected {
            debug!("Not connected, dropping outbound message");
            return;
        }
        match serde_json::to_string(message) {
            Ok(text) => self.command(Command::Send(text)),
            Err(e) => warn!("Failed to serialize outbound message: {}", e),
        }
    }

    pub fn subscribe_to_token(&self, token_id: &str) {
        self.send(&OutboundMessage::Subscribe {
            token_id: token_id.to_string(),
        });
    }

    pub fn unsubscribe_from_token(&self, token_id: &str) {
        self.send(&OutboundMessage::Unsubscribe {
            token_id: token_id.to_string(),
        });
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status()
    }

    pub fn attempt(&self) -> u32 {
        self.state.borrow().attempt()
    }

    /// Automatic reconnect dials since the client was spawned. Counted before
    /// the matching `Connecting` state is published.
    pub fn reconnect_attempts(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> Arc<SyncSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Arc<SyncSnapshot>> {
        self.snapshot.clone()
    }

    /// Every accepted inbound frame, in arrival order. This is the feed for
    /// notifications that have no slice of their own, such as `new_token`.
    pub fn events(&self) -> broadcast::Receiver<ReceivedEvent> {
        self.events.subscribe()
    }

    /// Disconnects and waits for the worker to finish.
    pub async fn shutdown(self) {
        self.command(Command::Shutdown);
        if let Err(e) = self.task.await {
            error!("Sync worker ended abnormally: {}", e);
        }
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Sync worker already stopped");
        }
    }
}

struct Worker {
    url: String,
    policy: ReconnectPolicy,
    connector: Box<dyn Connector>,
    state: ConnectionState,
    session: Option<Session>,
    dialing: Option<BoxFuture<'static, Result<Session, TransportError>>>,
    snapshot: Arc<SyncSnapshot>,
    seq: u64,
    state_tx: watch::Sender<ConnectionState>,
    snapshot_tx: watch::Sender<Arc<SyncSnapshot>>,
    events_tx: broadcast::Sender<ReceivedEvent>,
    reconnects: Arc<AtomicU64>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.state.deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => {
                        self.close_session().await;
                        self.set_state(self.state.disconnected());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },
                result = dial_result(&mut self.dialing), if self.dialing.is_some() => {
                    self.dialing = None;
                    self.on_dial_result(result);
                }
                frame = next_frame(&mut self.session), if self.session.is_some() => {
                    self.on_frame(frame);
                }
                _ = sleep_until(deadline), if deadline.is_some() => {
                    self.on_backoff_elapsed();
                }
            }
        }
        debug!("Sync worker stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => {
                let (next, dial) = self.state.connect_requested();
                self.set_state(next);
                if dial {
                    self.start_dial();
                }
            }
            Command::Disconnect => {
                self.dialing = None;
                self.close_session().await;
                self.set_state(self.state.disconnected());
            }
            Command::Send(text) => {
                if self.state.status() != ConnectionStatus::Connected {
                    debug!("Not connected, dropping outbound message");
                    return;
                }
                if let Some(session) = self.session.as_mut() {
                    if let Err(e) = session.sink.send(text).await {
                        warn!("Failed to send message: {}", e);
                    }
                }
            }
            Command::Shutdown => {}
        }
    }

    fn start_dial(&mut self) {
        info!(
            "Connecting to {} (attempt {})",
            self.url,
            self.state.attempt()
        );
        self.dialing = Some(self.connector.connect(&self.url));
    }

    fn on_dial_result(&mut self, result: Result<Session, TransportError>) {
        match result {
            Ok(session) => {
                self.session = Some(session);
                self.set_state(self.state.opened());
                info!("✅ WebSocket connected");
            }
            Err(e) => {
                error!("Failed to create WebSocket connection: {}", e);
                self.on_closed();
            }
        }
    }

    fn on_frame(&mut self, frame: Option<Result<String, TransportError>>) {
        match frame {
            Some(Ok(text)) => self.ingest(&text),
            Some(Err(e)) => {
                error!("WebSocket error: {}", e);
                self.session = None;
                self.on_closed();
            }
            None => {
                warn!("WebSocket disconnected");
                self.session = None;
                self.on_closed();
            }
        }
    }

    fn on_closed(&mut self) {
        let next = self.state.closed(&self.policy, Instant::now());
        match next {
            ConnectionState::Backoff { attempt, deadline } => {
                warn!(
                    "Reconnecting in {:?} (attempt {})",
                    deadline.saturating_duration_since(Instant::now()),
                    attempt + 1
                );
            }
            ConnectionState::Idle { attempt } => {
                error!(
                    "Giving up after {} reconnect attempts; call connect() to retry",
                    attempt
                );
            }
            _ => {}
        }
        self.set_state(next);
    }

    fn on_backoff_elapsed(&mut self) {
        let (next, dial) = self.state.backoff_elapsed();
        if dial {
            self.reconnects.fetch_add(1, Ordering::Relaxed);
        }
        self.set_state(next);
        if dial {
            self.start_dial();
        }
    }

    fn ingest(&mut self, text: &str) {
        let event = match decode_frame(self.seq + 1, text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Error parsing WebSocket message: {}", e);
                return;
            }
        };

        if event.message.is_unknown() {
            info!("Unknown message type: {}", event.message.kind());
            return;
        }

        self.seq = event.seq;
        self.snapshot = Arc::new(self.snapshot.apply(&event));
        self.snapshot_tx.send_replace(self.snapshot.clone());
        // No subscribers is fine; the snapshot already holds the state.
        let _ = self.events_tx.send(event);
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.sink.close().await {
                debug!("Error closing session: {}", e);
            }
            info!("WebSocket closed");
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        self.state = next;
        self.state_tx.send_replace(next);
    }
}

fn decode_frame(seq: u64, text: &str) -> Result<ReceivedEvent, FrameError> {
    let raw: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;
    ReceivedEvent::new(seq, Utc::now(), raw)
}

async fn dial_result(
    dialing: &mut Option<BoxFuture<'static, Result<Session, TransportError>>>,
) -> Result<Session, TransportError> {
    match dialing {
        Some(dial) => dial.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(session: &mut Option<Session>) -> Option<Result<String, TransportError>> {
    match session {
        Some(session) => session.stream.next().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
