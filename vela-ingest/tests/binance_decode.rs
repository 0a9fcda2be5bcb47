use chrono::{TimeZone, Utc};
use vela_ingest::binance::BinanceFeed;
use vela_ingest::session::{Decoded, PushFeed};

fn received_at() -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

#[test]
fn endpoint_is_lowercased_trade_stream() {
    assert_eq!(
        BinanceFeed.endpoint("BTCUSDT"),
        "wss://stream.binance.com:9443/ws/btcusdt@trade"
    );
    assert!(BinanceFeed.subscribe_frame("BTCUSDT").is_none());
}

#[test]
fn decodes_trade_event() {
    let raw = r#"{"e":"trade","E":1700000000100,"s":"btcusdt","t":42,"p":"42000.50","q":"0.25","b":1,"a":2,"T":1700000000050,"m":true}"#;
    match BinanceFeed.decode(raw, received_at()) {
        Decoded::Trade(t) => {
            assert_eq!(t.symbol, "BTCUSDT");
            assert_eq!(t.price, 42000.50);
            assert_eq!(t.qty, 0.25);
            assert_eq!(t.source, "binance");
            assert_eq!(t.ts.timestamp_millis(), 1_700_000_000_050);
        }
        _ => panic!("expected a trade"),
    }
}

#[test]
fn non_trade_events_are_skipped() {
    let raw = r#"{"e":"aggTrade","s":"BTCUSDT","p":"1.0","q":"1.0","T":1}"#;
    assert!(matches!(
        BinanceFeed.decode(raw, received_at()),
        Decoded::Skip
    ));
}

#[test]
fn unparsable_numerics_are_malformed() {
    let raw = r#"{"e":"trade","s":"BTCUSDT","p":"not-a-price","q":"1.0","T":1}"#;
    assert!(matches!(
        BinanceFeed.decode(raw, received_at()),
        Decoded::Malformed(_)
    ));
    let raw = r#"{"e":"trade","s":"BTCUSDT","p":"1.0","q":"??","T":1}"#;
    assert!(matches!(
        BinanceFeed.decode(raw, received_at()),
        Decoded::Malformed(_)
    ));
}

#[test]
fn boundary_rejects_nonpositive_price_and_negative_qty() {
    let raw = r#"{"e":"trade","s":"BTCUSDT","p":"0","q":"1.0","T":1}"#;
    assert!(matches!(
        BinanceFeed.decode(raw, received_at()),
        Decoded::Malformed(_)
    ));
    let raw = r#"{"e":"trade","s":"BTCUSDT","p":"-5","q":"1.0","T":1}"#;
    assert!(matches!(
        BinanceFeed.decode(raw, received_at()),
        Decoded::Malformed(_)
    ));
    let raw = r#"{"e":"trade","s":"BTCUSDT","p":"1.0","q":"-1","T":1}"#;
    assert!(matches!(
        BinanceFeed.decode(raw, received_at()),
        Decoded::Malformed(_)
    ));
}

#[test]
fn garbage_is_malformed() {
    assert!(matches!(
        BinanceFeed.decode("not json at all", received_at()),
        Decoded::Malformed(_)
    ));
}

#[test]
fn missing_trade_time_falls_back_to_receive_instant() {
    let raw = r#"{"e":"trade","s":"BTCUSDT","p":"100.0","q":"1.0"}"#;
    match BinanceFeed.decode(raw, received_at()) {
        Decoded::Trade(t) => assert_eq!(t.ts, received_at()),
        _ => panic!("expected a trade"),
    }
}
