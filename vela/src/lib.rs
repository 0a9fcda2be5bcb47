//! Vela aggregates live trade streams into interval-aligned OHLCV+VWAP
//! candles and fans them out to concurrent subscribers.
//!
//! Overview
//! - [`engine`]: wires connectors → merger → aggregator under one stop watch.
//! - [`aggregate`]: the pure windowing fold and its async driver; emits a
//!   partial candle per trade and exactly one final per (symbol, window).
//! - [`hub`]: symbol-keyed pub/sub with bounded per-subscriber queues and
//!   drop-on-overflow semantics.
//!
//! Key behaviors and trade-offs
//! - Ordering is arrival order at the merger, not global timestamp order;
//!   per symbol, finals for bucket `k` always precede bucket `k+1`.
//! - Liveness over completeness: a slow or failed branch never stalls the
//!   pipeline. Partials may be dropped under load; finals are swept out even
//!   when a symbol goes quiet mid-window.
//! - Cancellation is cooperative throughout: one root watch terminates every
//!   session, forwarder, and the aggregator within a bounded time.
#![warn(missing_docs)]

/// Windowed aggregation: pure fold plus async driver.
pub mod aggregate;
/// Pipeline assembly and lifecycle.
pub mod engine;
/// Candle pub/sub for downstream consumers.
pub mod hub;

pub use aggregate::Aggregator;
pub use engine::{Engine, EngineBuilder, EngineStream};
pub use hub::{Hub, Subscription};

// Re-export the model types consumers handle.
pub use vela_core::{AGGREGATE_SOURCE, BackoffConfig, Candle, Trade, VelaError};
