//! Turns [`birdnet_metrics_store::MetricsStore`] subscriptions into the
//! historical-query and live-stream event sequences a client-facing
//! endpoint would serve, without depending on any particular transport
//! (HTTP, WebSocket, SSE).

#![forbid(unsafe_code)]

mod error;
mod filter;
mod history;
mod stream;

pub use error::{DeliveryError, Result};
pub use filter::parse_filter;
pub use history::{history, DEFAULT_HISTORY_POINTS};
pub use stream::{MetricsStream, StreamEvent, DEFAULT_HEARTBEAT};
