use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::watch;
use vela_core::{BackoffConfig, Trade, normalize_symbol};

use crate::connector::{FeedConnector, FeedStreams};
use crate::session::{Decoded, PushFeed, spawn_push_session};
use crate::transport::WsTransport;

const NAME: &str = "binance";

/// Binance spot trade stream: one persistent WebSocket per symbol, addressed
/// by URL, no subscribe frame needed.
pub struct Binance {
    backoff: BackoffConfig,
}

impl Default for Binance {
    fn default() -> Self {
        Self::new()
    }
}

impl Binance {
    /// Create the connector with default backoff.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backoff: BackoffConfig::default(),
        }
    }
}

impl FeedConnector for Binance {
    fn name(&self) -> &'static str {
        NAME
    }

    fn start(&self, symbol: &str, stop: watch::Receiver<bool>) -> FeedStreams {
        spawn_push_session(
            Arc::new(BinanceFeed),
            Arc::new(WsTransport::new(NAME)),
            normalize_symbol(symbol),
            self.backoff,
            stop,
        )
    }
}

/// Raw trade event as delivered on `<symbol>@trade`. Numeric fields arrive
/// as strings.
#[derive(Debug, Deserialize)]
struct TradeEvent {
    #[serde(rename = "e")]
    event: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    qty: String,
    #[serde(rename = "T", default)]
    trade_time_ms: i64,
}

/// The [`PushFeed`] half of the Binance connector: endpoint layout and
/// trade-event decoding. Public so decode behavior is testable in isolation.
pub struct BinanceFeed;

impl PushFeed for BinanceFeed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn endpoint(&self, symbol: &str) -> String {
        format!(
            "wss://stream.binance.com:9443/ws/{}@trade",
            symbol.to_ascii_lowercase()
        )
    }

    fn decode(&self, raw: &str, received_at: DateTime<Utc>) -> Decoded {
        let msg: TradeEvent = match serde_json::from_str(raw) {
            Ok(msg) => msg,
            Err(e) => return Decoded::Malformed(format!("unmarshal: {e}")),
        };
        if msg.event != "trade" {
            return Decoded::Skip;
        }
        let price = match msg.price.parse::<f64>() {
            Ok(p) => p,
            Err(_) => return Decoded::Malformed(format!("bad price {:?}", msg.price)),
        };
        let qty = match msg.qty.parse::<f64>() {
            Ok(q) => q,
            Err(_) => return Decoded::Malformed(format!("bad qty {:?}", msg.qty)),
        };
        if !price.is_finite() || price <= 0.0 {
            return Decoded::Malformed(format!("rejecting price {price}"));
        }
        if !qty.is_finite() || qty < 0.0 {
            return Decoded::Malformed(format!("rejecting qty {qty}"));
        }
        // A missing trade time deserializes as 0; fill with the receive instant.
        let ts = if msg.trade_time_ms > 0 {
            DateTime::from_timestamp_millis(msg.trade_time_ms).unwrap_or(received_at)
        } else {
            received_at
        };
        Decoded::Trade(Trade {
            symbol: normalize_symbol(&msg.symbol),
            price,
            qty,
            source: NAME,
            ts,
        })
    }
}
