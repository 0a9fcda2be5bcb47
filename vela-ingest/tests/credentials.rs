//! A requested source with no credential must emit exactly one error and
//! close its streams cleanly instead of crashing the process.

use std::time::Duration;

use vela_core::VelaError;
use vela_ingest::connector::FeedConnector;
use vela_ingest::tradermade::TraderMade;
use vela_ingest::twelvedata::TwelveData;

async fn assert_single_error_then_clean_close(
    streams: vela_ingest::FeedStreams,
    expected_var: &str,
) {
    let mut streams = streams;
    let err = tokio::time::timeout(Duration::from_secs(1), streams.errors.recv())
        .await
        .expect("no credential error surfaced")
        .expect("error stream closed without an error");
    match err {
        VelaError::MissingCredential { var, .. } => assert_eq!(var, expected_var),
        other => panic!("unexpected error: {other}"),
    }

    // Exactly one error, then closure.
    let next = tokio::time::timeout(Duration::from_secs(1), streams.errors.recv())
        .await
        .expect("error stream did not close");
    assert!(next.is_none());

    let trades = tokio::time::timeout(Duration::from_secs(1), streams.trades.recv())
        .await
        .expect("trade stream did not close");
    assert!(trades.is_none());
}

#[tokio::test]
async fn tradermade_without_key_fails_cleanly() {
    let connector = TraderMade::new(None);
    let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let streams = connector.start("EURUSD", stop_rx);
    assert_single_error_then_clean_close(streams, "TRADERMADE_API_KEY").await;
}

#[tokio::test]
async fn tradermade_empty_key_counts_as_missing() {
    let connector = TraderMade::new(Some(String::new()));
    let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let streams = connector.start("EURUSD", stop_rx);
    assert_single_error_then_clean_close(streams, "TRADERMADE_API_KEY").await;
}

#[tokio::test]
async fn twelvedata_without_key_fails_cleanly() {
    let connector = TwelveData::with_options(None, "http://127.0.0.1:0", Duration::from_millis(10));
    let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let streams = connector.start("EURUSD", stop_rx);
    assert_single_error_then_clean_close(streams, "TWELVEDATA_API_KEY").await;
}
