mod helpers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use helpers::{MockConnector, trade};
use vela::Engine;
use vela_core::{Candle, VelaError};

#[test]
fn build_rejects_zero_interval() {
    let err = Engine::builder()
        .with_connector(Arc::new(MockConnector::new("mock", vec![])))
        .symbol("BTCUSDT")
        .interval(Duration::ZERO)
        .build()
        .unwrap_err();
    assert!(matches!(err, VelaError::Config(_)));
}

#[test]
fn build_rejects_missing_connectors_and_symbols() {
    let err = Engine::builder()
        .symbol("BTCUSDT")
        .interval(Duration::from_secs(1))
        .build()
        .unwrap_err();
    assert!(matches!(err, VelaError::Config(_)));

    let err = Engine::builder()
        .with_connector(Arc::new(MockConnector::new("mock", vec![])))
        .interval(Duration::from_secs(1))
        .build()
        .unwrap_err();
    assert!(matches!(err, VelaError::Config(_)));
}

#[test]
fn build_normalizes_and_dedups_symbols() {
    let engine = Engine::builder()
        .with_connector(Arc::new(MockConnector::new("mock", vec![])))
        .symbol(" btcusdt ")
        .symbol("BTCUSDT")
        .symbol("eur/usd")
        .interval(Duration::from_secs(1))
        .build()
        .unwrap();
    let symbols: Vec<&str> = engine.symbols().iter().map(String::as_str).collect();
    assert_eq!(symbols, ["BTCUSDT", "EURUSD"]);
}

#[tokio::test(start_paused = true)]
async fn pipeline_aggregates_per_symbol_and_finalizes() {
    // Timestamps in the past so the sweeper closes the windows immediately.
    let script = vec![
        trade("BTCUSDT", 100.0, 1.0, 0),
        trade("BTCUSDT", 110.0, 2.0, 500),
        trade("BTCUSDT", 90.0, 1.0, 900),
        trade("ETHUSDT", 10.0, 5.0, 100),
        trade("ETHUSDT", 12.0, 5.0, 800),
    ];
    let engine = Engine::builder()
        .with_connector(Arc::new(MockConnector::new("mock", script)))
        .symbol("BTCUSDT")
        .symbol("ETHUSDT")
        .interval(Duration::from_secs(1))
        .build()
        .unwrap();

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut stream = engine.start(stop_rx);

    let mut finals: HashMap<String, Candle> = HashMap::new();
    let mut partials: HashMap<String, usize> = HashMap::new();
    while finals.len() < 2 {
        let c = tokio::time::timeout(Duration::from_secs(10), stream.candles.recv())
            .await
            .expect("pipeline stalled")
            .expect("candle stream ended early");
        assert_eq!(c.source, "agg");
        if c.is_final {
            assert!(
                finals.insert(c.symbol.clone(), c).is_none(),
                "duplicate final"
            );
        } else {
            *partials.entry(c.symbol.clone()).or_default() += 1;
        }
    }

    let btc = &finals["BTCUSDT"];
    assert_eq!((btc.open, btc.high, btc.low, btc.close), (100.0, 110.0, 90.0, 90.0));
    assert_eq!(btc.volume, 4.0);
    assert!((btc.vwap - 102.5).abs() < 1e-9);
    assert_eq!(btc.trade_count, 3);

    let eth = &finals["ETHUSDT"];
    assert_eq!(eth.trade_count, 2);
    assert_eq!(eth.volume, 10.0);

    // Every final was preceded by at least one partial for its symbol.
    assert!(partials["BTCUSDT"] >= 1);
    assert!(partials["ETHUSDT"] >= 1);

    stop_tx.send(true).unwrap();
    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while stream.candles.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok(), "candle stream did not close on shutdown");
    stream.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn two_connectors_feed_one_stream() {
    let fast = MockConnector::new("fast", vec![trade("BTCUSDT", 100.0, 1.0, 100)]);
    let slow = MockConnector::new("slow", vec![trade("BTCUSDT", 101.0, 1.0, 200)])
        .with_delay(Duration::from_millis(5));

    let engine = Engine::builder()
        .with_connector(Arc::new(fast))
        .with_connector(Arc::new(slow))
        .symbol("BTCUSDT")
        .interval(Duration::from_secs(1))
        .build()
        .unwrap();

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut stream = engine.start(stop_rx);

    let fin = loop {
        let c = tokio::time::timeout(Duration::from_secs(10), stream.candles.recv())
            .await
            .expect("pipeline stalled")
            .expect("candle stream ended early");
        if c.is_final {
            break c;
        }
    };
    // Both sources' trades landed in the same window.
    assert_eq!(fin.trade_count, 2);
    assert_eq!(fin.volume, 2.0);

    stop_tx.send(true).unwrap();
    while stream.candles.recv().await.is_some() {}
    stream.shutdown().await;
}
