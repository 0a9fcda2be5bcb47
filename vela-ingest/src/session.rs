use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use vela_core::{BackoffConfig, SessionHandle, Trade, VelaError};

use crate::backoff::Backoff;
use crate::connector::{
    ERROR_CHANNEL_CAPACITY, FeedStreams, TRADE_CHANNEL_CAPACITY, merge_halt, stopped,
};
use crate::transport::PushTransport;

/// Outcome of decoding one raw frame from a push feed.
pub enum Decoded {
    /// A normalized trade ready for the merger.
    Trade(Trade),
    /// A frame that carries no trade (heartbeat, ack, quote without a
    /// computable price). Dropped silently.
    Skip,
    /// A frame that should have carried a trade but could not be parsed.
    /// Reported on the error stream, then dropped; never fatal.
    Malformed(String),
}

/// Vendor-specific half of a push session: where to connect, what to send
/// after connecting, and how to turn raw frames into [`Trade`]s.
///
/// The shared driver in this module supplies everything else: reconnection,
/// backoff, cancellation, and bounded delivery.
pub trait PushFeed: Send + Sync + 'static {
    /// Short stable tag used as [`Trade::source`].
    fn name(&self) -> &'static str;

    /// Endpoint to dial for `symbol`.
    fn endpoint(&self, symbol: &str) -> String;

    /// Optional frame to send immediately after connecting (e.g. a
    /// subscription message). `None` for feeds addressed by URL alone.
    fn subscribe_frame(&self, _symbol: &str) -> Option<String> {
        None
    }

    /// Decode one raw text frame received at `received_at`.
    fn decode(&self, raw: &str, received_at: DateTime<Utc>) -> Decoded;
}

/// Spawn the reconnecting session for `(feed, symbol)`.
///
/// The session terminates only when `stop` flips, the returned handle is
/// stopped or dropped, or the trade receiver goes away; transport failures
/// reconnect with backoff instead.
pub fn spawn_push_session(
    feed: Arc<dyn PushFeed>,
    transport: Arc<dyn PushTransport>,
    symbol: String,
    cfg: BackoffConfig,
    stop: watch::Receiver<bool>,
) -> FeedStreams {
    let (trade_tx, trades) = mpsc::channel(TRADE_CHANNEL_CAPACITY);
    let (err_tx, errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

    let (session_stop_tx, session_stop_rx) = oneshot::channel::<()>();
    let halt_rx = merge_halt(stop, session_stop_rx);

    let join = tokio::spawn(run_push_session(
        feed, transport, symbol, cfg, halt_rx, trade_tx, err_tx,
    ));

    FeedStreams {
        handle: SessionHandle::new(join, session_stop_tx),
        trades,
        errors,
    }
}

fn report(err_tx: &mpsc::Sender<VelaError>, err: VelaError) {
    tracing::debug!(error = %err, "ingest session event");
    // Best-effort: a full error channel drops the report.
    let _ = err_tx.try_send(err);
}

async fn run_push_session(
    feed: Arc<dyn PushFeed>,
    transport: Arc<dyn PushTransport>,
    symbol: String,
    cfg: BackoffConfig,
    mut halt: watch::Receiver<bool>,
    trade_tx: mpsc::Sender<Trade>,
    err_tx: mpsc::Sender<VelaError>,
) {
    let name = feed.name();
    let endpoint = feed.endpoint(&symbol);
    let mut backoff = Backoff::new(cfg);

    'session: loop {
        if *halt.borrow() {
            break;
        }

        // Connecting
        let dialed = tokio::select! {
            res = transport.connect(&endpoint) => res,
            () = stopped(&mut halt) => break 'session,
        };
        let mut socket = match dialed {
            Ok(socket) => socket,
            Err(e) => {
                report(&err_tx, e);
                if backoff.wait(&mut halt).await {
                    continue 'session;
                }
                break 'session;
            }
        };

        // Subscribing
        if let Some(frame) = feed.subscribe_frame(&symbol) {
            let sent = tokio::select! {
                res = socket.send_text(frame) => res,
                () = stopped(&mut halt) => break 'session,
            };
            if let Err(e) = sent {
                report(&err_tx, e);
                if backoff.wait(&mut halt).await {
                    continue 'session;
                }
                break 'session;
            }
        }
        tracing::debug!(connector = name, symbol = %symbol, "session streaming");

        // Streaming
        loop {
            let frame = tokio::select! {
                biased;
                () = stopped(&mut halt) => break 'session,
                res = socket.next_text() => res,
            };
            match frame {
                Ok(Some(raw)) => {
                    backoff.reset();
                    match feed.decode(&raw, Utc::now()) {
                        Decoded::Trade(trade) => {
                            // Blocking send gated by cancellation: backpressure
                            // to the transport rather than dropping trades.
                            tokio::select! {
                                res = trade_tx.send(trade) => {
                                    if res.is_err() {
                                        break 'session;
                                    }
                                }
                                () = stopped(&mut halt) => break 'session,
                            }
                        }
                        Decoded::Skip => {}
                        Decoded::Malformed(msg) => {
                            report(&err_tx, VelaError::decode(name, msg));
                        }
                    }
                }
                Ok(None) => {
                    report(&err_tx, VelaError::transport(name, "connection closed"));
                    if backoff.wait(&mut halt).await {
                        continue 'session;
                    }
                    break 'session;
                }
                Err(e) => {
                    report(&err_tx, e);
                    if backoff.wait(&mut halt).await {
                        continue 'session;
                    }
                    break 'session;
                }
            }
        }
    }
    tracing::debug!(connector = name, symbol = %symbol, "session terminated");
}
