//! Canonical data model: trades in, candles out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag carried by every aggregated candle.
pub const AGGREGATE_SOURCE: &str = "agg";

/// A single normalized tick from one upstream source.
///
/// Connectors produce these; the merger and aggregator consume them.
/// Invariants enforced at the connector boundary: `price` is finite and
/// positive, `qty` is finite and non-negative, `symbol` is uppercase.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    /// Uppercase instrument symbol (e.g. `BTCUSDT`, `EURUSD`).
    pub symbol: String,
    /// Last traded (or quoted mid) price.
    pub price: f64,
    /// Traded quantity. Quote-style feeds synthesize `1.0`, turning VWAP
    /// into a count-weighted mean; consumers disambiguate via `source`.
    pub qty: f64,
    /// Short stable tag of the originating connector.
    pub source: &'static str,
    /// Trade time as reported upstream, else the receive instant.
    pub ts: DateTime<Utc>,
}

impl Trade {
    /// Millisecond timestamp of this trade.
    #[must_use]
    pub fn ts_ms(&self) -> i64 {
        self.ts.timestamp_millis()
    }
}

/// An OHLCV+VWAP summary of one symbol over one half-open time window.
///
/// This struct doubles as the wire format: its JSON serialization is what the
/// streaming server and the Kafka publisher emit. The `source` field
/// serializes as `exchange` and is always [`AGGREGATE_SOURCE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Uppercase instrument symbol.
    pub symbol: String,
    /// Inclusive window start, Unix milliseconds, aligned to the interval.
    pub window_start_ms: i64,
    /// Exclusive window end, Unix milliseconds.
    pub window_end_ms: i64,
    /// First trade price in the window.
    pub open: f64,
    /// Highest trade price in the window.
    pub high: f64,
    /// Lowest trade price in the window.
    pub low: f64,
    /// Most recent trade price in the window.
    pub close: f64,
    /// Sum of trade quantities.
    pub volume: f64,
    /// Volume-weighted average price; `0.0` when the window has no volume.
    pub vwap: f64,
    /// `false` for live partials, `true` for the terminal emission of the
    /// window. Exactly one final is emitted per (symbol, window).
    pub is_final: bool,
    /// Always [`AGGREGATE_SOURCE`] on emitted candles.
    #[serde(rename = "exchange")]
    pub source: String,
    /// Largest trade timestamp folded into the window, Unix milliseconds.
    pub last_trade_ts: i64,
    /// Number of trades folded into the window.
    pub trade_count: u64,
}

/// Exponential backoff configuration for reconnecting ingest sessions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum (and initial) backoff delay in milliseconds.
    pub min_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor applied after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 500,
            max_backoff_ms: 30_000,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

/// Canonicalize an instrument symbol: trim, uppercase, and strip the `/`
/// separator so `eur/usd` and `EURUSD` compare equal.
#[must_use]
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '/')
        .collect::<String>()
        .to_ascii_uppercase()
}
