//! SolSniperX terminal dashboard: wires the realtime feed, the local store
//! and the REST backend together.

pub mod api_client;
pub mod config;
pub mod metrics;
pub mod watch;

pub use api_client::{ApiClient, ApiError};
pub use config::AppConfig;
pub use metrics::Metrics;
pub use watch::{describe_event, run_watch};
