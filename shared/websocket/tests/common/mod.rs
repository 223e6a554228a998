#![allow(dead_code)]

use anyhow::{Context, Result};
use futures_channel::mpsc as fmpsc;
use futures_util::future::{self, BoxFuture};
use futures_util::{SinkExt, StreamExt};
use realtime_sync::{Connector, Session, TransportError};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info};

type ClientId = usize;
type Clients = Arc<RwLock<HashMap<ClientId, tokio::sync::mpsc::UnboundedSender<Message>>>>;

/// Loopback WebSocket backend that pushes frames to every connected client
/// and records what they send.
pub struct MockBackend {
    clients: Clients,
    received: Arc<RwLock<Vec<String>>>,
    local_addr: SocketAddr,
}

impl MockBackend {
    pub async fn bind() -> Result<Arc<Self>> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind WebSocket listener")?;

        let local_addr = listener.local_addr()?;
        info!("Mock backend listening on {}", local_addr);

        let clients: Clients = Arc::new(RwLock::new(HashMap::new()));
        let received = Arc::new(RwLock::new(Vec::new()));

        let backend = Arc::new(Self {
            clients: clients.clone(),
            received: received.clone(),
            local_addr,
        });

        tokio::spawn(async move {
            let mut next_id: ClientId = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let clients = clients.clone();
                let received = received.clone();
                let client_id = next_id;
                next_id += 1;

                tokio::spawn(async move {
                    if let Err(e) = Self::handle_connection(stream, client_id, clients, received).await {
                        error!("Mock backend connection error: {}", e);
                    }
                });
            }
        });

        Ok(backend)
    }

    async fn handle_connection(
        stream: TcpStream,
        client_id: ClientId,
        clients: Clients,
        received: Arc<RwLock<Vec<String>>>,
    ) -> Result<()> {
        let ws_stream = accept_async(stream)
            .await
            .context("Failed to accept WebSocket")?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        clients.write().await.insert(client_id, tx);

        let send_task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if ws_sender.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => received.write().await.push(text),
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }

        clients.write().await.remove(&client_id);
        send_task.abort();

        Ok(())
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    pub async fn broadcast<T: Serialize>(&self, message: &T) -> Result<()> {
        self.broadcast_text(serde_json::to_string(message)?).await
    }

    pub async fn broadcast_text(&self, text: impl Into<String>) -> Result<()> {
        let msg = Message::Text(text.into());
        for tx in self.clients.read().await.values() {
            let _ = tx.send(msg.clone());
        }
        Ok(())
    }

    /// Closes every client connection from the server side.
    pub async fn kick_all(&self) {
        for tx in self.clients.read().await.values() {
            let _ = tx.send(Message::Close(None));
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn received(&self) -> Vec<String> {
        self.received.read().await.clone()
    }
}

/// Server side of one in-memory session.
pub struct Remote {
    pub inbound: fmpsc::UnboundedSender<Result<String, TransportError>>,
    pub outbound: fmpsc::UnboundedReceiver<String>,
}

impl Remote {
    pub fn push(&self, text: &str) {
        let _ = self.inbound.unbounded_send(Ok(text.to_string()));
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push(&value.to_string());
    }
}

enum Outcome {
    Accept,
    Refuse,
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Outcome>,
    dials: Vec<Instant>,
    remotes: Vec<Remote>,
}

/// In-memory connector whose dial results are queued by the test. With an
/// empty queue every dial is refused.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn accept_next(&self) {
        self.script.lock().unwrap().outcomes.push_back(Outcome::Accept);
    }

    pub fn refuse_next(&self) {
        self.script.lock().unwrap().outcomes.push_back(Outcome::Refuse);
    }

    pub fn dials(&self) -> Vec<Instant> {
        self.script.lock().unwrap().dials.clone()
    }

    pub fn dial_count(&self) -> usize {
        self.script.lock().unwrap().dials.len()
    }

    /// Takes the server side of the oldest accepted session not yet claimed.
    pub fn take_remote(&self) -> Option<Remote> {
        let mut script = self.script.lock().unwrap();
        if script.remotes.is_empty() {
            None
        } else {
            Some(script.remotes.remove(0))
        }
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Session, TransportError>> {
        let mut script = self.script.lock().unwrap();
        script.dials.push(Instant::now());

        match script.outcomes.pop_front().unwrap_or(Outcome::Refuse) {
            Outcome::Accept => {
                let (inbound_tx, inbound_rx) = fmpsc::unbounded();
                let (outbound_tx, outbound_rx) = fmpsc::unbounded::<String>();
                script.remotes.push(Remote {
                    inbound: inbound_tx,
                    outbound: outbound_rx,
                });
                let sink = outbound_tx.sink_map_err(|_| TransportError::Closed);
                let session = Session::new(Box::pin(sink), Box::pin(inbound_rx));
                Box::pin(future::ready(Ok(session)))
            }
            Outcome::Refuse => {
                let err = TransportError::Connect {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                };
                Box::pin(future::ready(Err(err)))
            }
        }
    }
}
