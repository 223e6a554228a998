use futures_util::future::{self, BoxFuture};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

use crate::error::TransportError;

pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// One open streaming session, split into its outbound and inbound halves.
///
/// The stream ending (or yielding an error) means the session is gone.
pub struct Session {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Session {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens sessions against a URL. The sync client only ever talks to the
/// backend through this seam.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Session, TransportError>>;
}

/// Production connector over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Session, TransportError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) =
                connect_async(url.as_str())
                    .await
                    .map_err(|e| TransportError::Connect {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;

            info!("Connected to WebSocket: {}", url);

            let (write, read) = ws_stream.split();

            let sink = write
                .sink_map_err(TransportError::from)
                .with(|text: String| future::ready(Ok::<_, TransportError>(Message::Text(text))));

            let stream = read.filter_map(|frame| {
                future::ready(match frame {
                    Ok(Message::Text(text)) => Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => Some(Ok(text)),
                        Err(_) => {
                            debug!("Skipping non UTF-8 binary frame");
                            None
                        }
                    },
                    // Pongs are answered by tungstenite; the stream ends after Close.
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::from(e))),
                })
            });

            Ok(Session::new(Box::pin(sink), Box::pin(stream)))
        })
    }
}
