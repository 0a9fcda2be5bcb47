//! CLI surface of the aggregation service.

use std::time::Duration;

use clap::Parser;

/// Aggregate live trade feeds into OHLCV+VWAP candles and stream them to
/// WebSocket subscribers.
#[derive(Debug, Parser)]
#[command(name = "vela-server", version, about)]
pub struct Cli {
    /// WebSocket listen address for candle subscriptions.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen_addr: String,

    /// Comma-separated symbols (e.g. BTCUSDT,EURUSD).
    #[arg(long, value_delimiter = ',', default_value = "BTCUSDT")]
    pub symbols: Vec<String>,

    /// Comma-separated sources: binance,tradermade,twelvedata.
    /// Unknown tags are logged and skipped.
    #[arg(long, value_delimiter = ',', default_value = "binance")]
    pub exchanges: Vec<String>,

    /// Aggregation window, e.g. 1s, 250ms, 1m. Must be positive.
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    pub interval: Duration,

    /// Publish every candle to Kafka as well.
    #[arg(long)]
    pub kafka_enable: bool,

    /// Kafka bootstrap brokers (comma-separated).
    #[arg(long, default_value = "localhost:9092")]
    pub kafka_brokers: String,

    /// Kafka topic for serialized candles.
    #[arg(long, default_value = "agg.candles.v1")]
    pub kafka_topic: String,
}

/// Parse durations like `250ms`, `1s`, or `2m`. Zero is rejected: the
/// engine cannot run zero-width windows.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (value, unit): (&str, fn(u64) -> Duration) = if let Some(v) = raw.strip_suffix("ms") {
        (v, Duration::from_millis)
    } else if let Some(v) = raw.strip_suffix('s') {
        (v, Duration::from_secs)
    } else if let Some(v) = raw.strip_suffix('m') {
        (v, |n| Duration::from_secs(n * 60))
    } else {
        return Err(format!("`{raw}` needs a unit: ms, s, or m"));
    };
    let n: u64 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a valid duration"))?;
    if n == 0 {
        return Err("interval must be positive".to_string());
    }
    Ok(unit(n))
}
