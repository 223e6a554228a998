pub mod client;
pub mod config;
pub mod error;
pub mod reconnect;
pub mod state;
pub mod sync;
pub mod types;

pub use client::{Connector, Session, WsConnector};
pub use config::RealtimeConfig;
pub use error::{FrameError, TransportError};
pub use reconnect::{ConnectionState, ConnectionStatus, ReconnectPolicy};
pub use state::{LastEvent, ReceivedEvent, SyncSnapshot, WalletUpdate};
pub use sync::SyncClient;
pub use types::{InboundMessage, OutboundMessage, PriceUpdate, TokenBalance, TradingStatus};
