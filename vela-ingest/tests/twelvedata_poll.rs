use std::time::Duration;

use httpmock::prelude::*;
use vela_core::VelaError;
use vela_ingest::connector::FeedConnector;
use vela_ingest::twelvedata::TwelveData;

#[tokio::test]
async fn polls_price_into_unit_volume_trades() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/price")
                .query_param("symbol", "EUR/USD")
                .query_param("apikey", "k3y");
            then.status(200).json_body(serde_json::json!({"price": "1.1000"}));
        })
        .await;

    let connector = TwelveData::with_options(
        Some("k3y".to_string()),
        server.base_url(),
        Duration::from_millis(10),
    );
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut streams = connector.start("EURUSD", stop_rx);

    for _ in 0..2 {
        let t = tokio::time::timeout(Duration::from_secs(5), streams.trades.recv())
            .await
            .expect("poll timed out")
            .expect("trade stream closed");
        assert_eq!(t.symbol, "EURUSD");
        assert_eq!(t.price, 1.10);
        assert_eq!(t.qty, 1.0);
        assert_eq!(t.source, "twelvedata");
    }
    stop_tx.send(true).unwrap();
    streams.handle.stop().await;
    assert!(streams.trades.recv().await.is_none());
    assert!(mock.hits_async().await >= 2);
}

#[tokio::test]
async fn numeric_price_body_is_accepted() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/price");
            then.status(200).json_body(serde_json::json!({"price": 1.2345}));
        })
        .await;

    let connector = TwelveData::with_options(
        Some("k3y".to_string()),
        server.base_url(),
        Duration::from_millis(10),
    );
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut streams = connector.start("EURUSD", stop_rx);

    let t = tokio::time::timeout(Duration::from_secs(5), streams.trades.recv())
        .await
        .expect("poll timed out")
        .expect("trade stream closed");
    assert_eq!(t.price, 1.2345);

    stop_tx.send(true).unwrap();
    streams.handle.stop().await;
}

#[tokio::test]
async fn priceless_body_reports_decode_error_and_keeps_polling() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/price");
            then.status(200)
                .json_body(serde_json::json!({"code": 404, "message": "symbol not found"}));
        })
        .await;

    let connector = TwelveData::with_options(
        Some("k3y".to_string()),
        server.base_url(),
        Duration::from_millis(10),
    );
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut streams = connector.start("EURUSD", stop_rx);

    let err = tokio::time::timeout(Duration::from_secs(5), streams.errors.recv())
        .await
        .expect("no error surfaced")
        .expect("error stream closed");
    assert!(matches!(err, VelaError::Decode { .. }), "got {err}");

    stop_tx.send(true).unwrap();
    streams.handle.stop().await;
    // The session never promoted a priceless body into a trade.
    assert!(streams.trades.recv().await.is_none());
}

#[tokio::test]
async fn non_fx_symbols_poll_compact() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/price")
                .query_param("symbol", "BTCUSDT");
            then.status(200).json_body(serde_json::json!({"price": "42000"}));
        })
        .await;

    let connector = TwelveData::with_options(
        Some("k3y".to_string()),
        server.base_url(),
        Duration::from_millis(10),
    );
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let mut streams = connector.start("BTCUSDT", stop_rx);

    let t = tokio::time::timeout(Duration::from_secs(5), streams.trades.recv())
        .await
        .expect("poll timed out")
        .expect("trade stream closed");
    assert_eq!(t.symbol, "BTCUSDT");

    stop_tx.send(true).unwrap();
    streams.handle.stop().await;
    assert!(mock.hits_async().await >= 1);
}
