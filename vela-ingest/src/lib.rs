//! vela-ingest
//!
//! Upstream market data ingestion for the vela candle engine.
//!
//! - `connector`: the [`FeedConnector`] contract and the tag registry.
//! - `session`: the reconnecting push-session driver shared by WebSocket feeds.
//! - `transport`: the transport adapter seam (real tungstenite sockets in
//!   production, scripted sockets in tests).
//! - `backoff`: exponential, jittered, cancellable reconnect delays.
//! - `merge`: K-way fan-in of connector trade streams.
//! - `binance` / `tradermade` / `twelvedata`: vendor connectors.
#![warn(missing_docs)]

/// Exponential backoff with jitter for reconnecting sessions.
pub mod backoff;
/// Binance trade-stream connector (push WebSocket).
pub mod binance;
/// The `FeedConnector` contract and the source tag registry.
pub mod connector;
/// Fan-in of multiple connector trade streams.
pub mod merge;
/// Reconnecting push-session driver.
pub mod session;
/// TraderMade FX quote connector (push WebSocket).
pub mod tradermade;
/// Transport adapter traits and the tungstenite implementation.
pub mod transport;
/// TwelveData polled REST connector.
pub mod twelvedata;

pub use backoff::Backoff;
pub use connector::{FeedConnector, FeedStreams, KNOWN_SOURCES, from_tag};
pub use merge::merge_trades;
