#![allow(dead_code)]

pub mod mock_connector;

pub use mock_connector::MockConnector;

use chrono::{TimeZone, Utc};
use vela_core::Trade;

pub fn trade(symbol: &str, price: f64, qty: f64, ts_ms: i64) -> Trade {
    Trade {
        symbol: symbol.to_string(),
        price,
        qty,
        source: "mock",
        ts: Utc.timestamp_millis_opt(ts_ms).unwrap(),
    }
}
