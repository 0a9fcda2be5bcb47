use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use vela_core::coerce::lenient_f64;
use vela_core::iso4217::split_fx;
use vela_core::{SessionHandle, Trade, VelaError, normalize_symbol};

use crate::connector::{
    ERROR_CHANNEL_CAPACITY, FeedConnector, FeedStreams, TRADE_CHANNEL_CAPACITY,
    credential_failure, merge_halt, stopped,
};

const NAME: &str = "twelvedata";
const API_KEY_VAR: &str = "TWELVEDATA_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// TwelveData price endpoint, sampled on a fixed cadence.
///
/// A pull source: every poll tick becomes one trade with `qty = 1`, whether
/// or not the price moved, so `trade_count` is poll-rate-inflated for this
/// source.
pub struct TwelveData {
    api_key: Option<String>,
    base_url: String,
    poll_interval: Duration,
    http: reqwest::Client,
}

impl TwelveData {
    /// Read the API key from `TWELVEDATA_API_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_options(
            std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty()),
            DEFAULT_BASE_URL,
            POLL_INTERVAL,
        )
    }

    /// Construct with explicit credentials, endpoint, and poll cadence.
    /// Tests point `base_url` at a local mock server.
    #[must_use]
    pub fn with_options(
        api_key: Option<String>,
        base_url: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            poll_interval,
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client"),
        }
    }
}

impl FeedConnector for TwelveData {
    fn name(&self) -> &'static str {
        NAME
    }

    fn start(&self, symbol: &str, stop: watch::Receiver<bool>) -> FeedStreams {
        let Some(api_key) = self.api_key.clone() else {
            return credential_failure(NAME, API_KEY_VAR);
        };

        let (trade_tx, trades) = mpsc::channel(TRADE_CHANNEL_CAPACITY);
        let (err_tx, errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let (session_stop_tx, session_stop_rx) = oneshot::channel::<()>();
        let halt = merge_halt(stop, session_stop_rx);

        let url = format!(
            "{}/price?symbol={}&apikey={}",
            self.base_url,
            slashed(symbol),
            api_key
        );
        let join = tokio::spawn(run_poll_session(
            self.http.clone(),
            url,
            normalize_symbol(symbol),
            self.poll_interval,
            halt,
            trade_tx,
            err_tx,
        ));

        FeedStreams {
            handle: SessionHandle::new(join, session_stop_tx),
            trades,
            errors,
        }
    }
}

/// The vendor addresses FX pairs as `EUR/USD`; everything else passes
/// through compact.
fn slashed(symbol: &str) -> String {
    let norm = normalize_symbol(symbol);
    match split_fx(&norm) {
        Some((base, quote)) => format!("{base}/{quote}"),
        None => norm,
    }
}

async fn run_poll_session(
    http: reqwest::Client,
    url: String,
    symbol: String,
    poll_interval: Duration,
    mut halt: watch::Receiver<bool>,
    trade_tx: mpsc::Sender<Trade>,
    err_tx: mpsc::Sender<VelaError>,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = stopped(&mut halt) => break,
            _ = ticker.tick() => {}
        }

        let sampled = tokio::select! {
            res = poll_once(&http, &url) => res,
            () = stopped(&mut halt) => break,
        };
        let price = match sampled {
            Ok(Some(price)) if price.is_finite() && price > 0.0 => price,
            Ok(_) => {
                let _ = err_tx.try_send(VelaError::decode(NAME, "response carried no usable price"));
                continue;
            }
            Err(e) => {
                tracing::debug!(error = %e, "twelvedata poll failed");
                let _ = err_tx.try_send(e);
                continue;
            }
        };

        let trade = Trade {
            symbol: symbol.clone(),
            price,
            qty: 1.0,
            source: NAME,
            ts: Utc::now(),
        };
        tokio::select! {
            res = trade_tx.send(trade) => {
                if res.is_err() {
                    break;
                }
            }
            () = stopped(&mut halt) => break,
        }
    }
    tracing::debug!(connector = NAME, symbol = %symbol, "session terminated");
}

/// One sample of the price endpoint. The body is `{"price": "1.2345"}` or
/// `{"price": 1.2345}` depending on plan.
async fn poll_once(http: &reqwest::Client, url: &str) -> Result<Option<f64>, VelaError> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| VelaError::transport(NAME, format!("request: {e}")))?;
    let body: Value = resp
        .json()
        .await
        .map_err(|e| VelaError::decode(NAME, format!("body: {e}")))?;
    Ok(body.get("price").and_then(lenient_f64))
}
