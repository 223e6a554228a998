use thiserror::Error;

/// Failures of the streaming transport. None of these escape the sync client;
/// they are logged and fed into the reconnection logic.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("session closed")]
    Closed,
}

/// An inbound frame that could not be turned into an `InboundMessage`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("invalid `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
