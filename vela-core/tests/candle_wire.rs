use vela_core::{AGGREGATE_SOURCE, Candle};

fn sample() -> Candle {
    Candle {
        symbol: "BTCUSDT".to_string(),
        window_start_ms: 1_000,
        window_end_ms: 2_000,
        open: 100.0,
        high: 110.0,
        low: 90.0,
        close: 90.0,
        volume: 4.0,
        vwap: 102.5,
        is_final: true,
        source: AGGREGATE_SOURCE.to_string(),
        last_trade_ts: 1_900,
        trade_count: 3,
    }
}

#[test]
fn wire_format_field_names() {
    let v: serde_json::Value = serde_json::to_value(sample()).unwrap();
    let obj = v.as_object().unwrap();

    for key in [
        "symbol",
        "window_start_ms",
        "window_end_ms",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "vwap",
        "is_final",
        "exchange",
        "last_trade_ts",
        "trade_count",
    ] {
        assert!(obj.contains_key(key), "missing wire field {key}");
    }
    // The in-memory field is `source`; on the wire it is `exchange`.
    assert!(!obj.contains_key("source"));
    assert_eq!(obj["exchange"], "agg");
}

#[test]
fn wire_roundtrip_preserves_candle() {
    let c = sample();
    let json = serde_json::to_string(&c).unwrap();
    let back: Candle = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
}
