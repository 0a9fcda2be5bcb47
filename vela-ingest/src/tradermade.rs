use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use vela_core::coerce::{lenient_f64, lenient_ms};
use vela_core::{BackoffConfig, Trade, normalize_symbol};

use crate::connector::{FeedConnector, FeedStreams, credential_failure};
use crate::session::{Decoded, PushFeed, spawn_push_session};
use crate::transport::WsTransport;

const NAME: &str = "tradermade";
const API_KEY_VAR: &str = "TRADERMADE_API_KEY";

/// TraderMade FX streaming feed.
///
/// Quote ticks (bid/ask/mid) are normalized into trades with `qty = 1`, so
/// downstream VWAP degenerates to a time-weighted mean; consumers see that
/// through the `tradermade` source tag.
pub struct TraderMade {
    api_key: Option<String>,
    backoff: BackoffConfig,
}

impl TraderMade {
    /// Construct with an explicit (possibly absent) API key.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            backoff: BackoffConfig::default(),
        }
    }

    /// Read the API key from `TRADERMADE_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_KEY_VAR).ok())
    }
}

impl FeedConnector for TraderMade {
    fn name(&self) -> &'static str {
        NAME
    }

    fn start(&self, symbol: &str, stop: watch::Receiver<bool>) -> FeedStreams {
        let Some(api_key) = self.api_key.clone() else {
            return credential_failure(NAME, API_KEY_VAR);
        };
        spawn_push_session(
            Arc::new(TraderMadeFeed::new(api_key)),
            Arc::new(WsTransport::new(NAME)),
            normalize_symbol(symbol),
            self.backoff,
            stop,
        )
    }
}

/// The [`PushFeed`] half of the TraderMade connector: endpoint, subscribe
/// frame, and quote-tick decoding. Public so decode behavior is testable in
/// isolation.
pub struct TraderMadeFeed {
    api_key: String,
}

impl TraderMadeFeed {
    /// Build the feed half around an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl PushFeed for TraderMadeFeed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn endpoint(&self, _symbol: &str) -> String {
        format!(
            "wss://marketdata.tradermade.com/feedadv?api_key={}",
            self.api_key
        )
    }

    fn subscribe_frame(&self, symbol: &str) -> Option<String> {
        Some(serde_json::json!({ "subscribe": [symbol] }).to_string())
    }

    fn decode(&self, raw: &str, received_at: DateTime<Utc>) -> Decoded {
        // The feed greets with plain-text frames ("Connected") before the
        // first quote; anything that is not a JSON object is not a tick.
        let Ok(Value::Object(msg)) = serde_json::from_str::<Value>(raw) else {
            return Decoded::Skip;
        };
        let Some(symbol) = msg.get("symbol").and_then(Value::as_str) else {
            return Decoded::Skip;
        };

        // Price: mid if supplied, else the bid/ask midpoint, else drop the
        // tick silently.
        let price = match msg.get("mid").and_then(lenient_f64) {
            Some(mid) => Some(mid),
            None => {
                let bid = msg.get("bid").and_then(lenient_f64);
                let ask = msg.get("ask").and_then(lenient_f64);
                match (bid, ask) {
                    (Some(b), Some(a)) if b > 0.0 && a > 0.0 => Some((b + a) / 2.0),
                    _ => None,
                }
            }
        };
        let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0) else {
            return Decoded::Skip;
        };

        let ts = msg
            .get("ts")
            .and_then(lenient_ms)
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(received_at);

        Decoded::Trade(Trade {
            symbol: normalize_symbol(symbol),
            price,
            // Quote ticks carry no volume; unit quantity turns VWAP into a
            // time-weighted mean.
            qty: 1.0,
            source: NAME,
            ts,
        })
    }
}
