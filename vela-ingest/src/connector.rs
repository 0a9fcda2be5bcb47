use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use vela_core::{SessionHandle, Trade, VelaError};

/// Capacity of each connector's trade channel. Sends block (gated by
/// cancellation) when the downstream lags, which backpressures the transport.
pub const TRADE_CHANNEL_CAPACITY: usize = 2048;

/// Capacity of each connector's error channel. Errors are best-effort;
/// surplus reports are dropped rather than ever blocking a session.
pub const ERROR_CHANNEL_CAPACITY: usize = 1;

/// Everything a started ingest session hands back to its owner.
pub struct FeedStreams {
    /// Handle to the session task; stop it directly or let the shared stop
    /// watch terminate it.
    pub handle: SessionHandle,
    /// Normalized trades, strict FIFO in reception order.
    pub trades: mpsc::Receiver<Trade>,
    /// Non-fatal transport and decode events.
    pub errors: mpsc::Receiver<VelaError>,
}

/// A named origin of trade ticks.
///
/// `start` spawns one long-lived session for `(self, symbol)` and returns its
/// streams. Both streams terminate exactly when `stop` flips to `true` (or
/// the session handle is stopped); a missing credential instead produces a
/// single error followed by clean closure. Sessions self-heal: transport
/// failures are reported on the error stream and trigger reconnection with
/// exponential backoff, never termination.
pub trait FeedConnector: Send + Sync {
    /// Short stable tag used as [`Trade::source`] on emitted trades.
    fn name(&self) -> &'static str;

    /// Start the ingest session for one symbol under the given stop watch.
    fn start(&self, symbol: &str, stop: watch::Receiver<bool>) -> FeedStreams;
}

/// Source tags accepted by [`from_tag`].
pub const KNOWN_SOURCES: &[&str] = &["binance", "tradermade", "twelvedata"];

/// Resolve a source tag from the CLI into a connector.
///
/// Tags are matched case-insensitively. Returns `None` for unknown tags;
/// callers log and skip those.
#[must_use]
pub fn from_tag(tag: &str) -> Option<Arc<dyn FeedConnector>> {
    match tag.trim().to_ascii_lowercase().as_str() {
        "binance" => Some(Arc::new(crate::binance::Binance::new())),
        "tradermade" => Some(Arc::new(crate::tradermade::TraderMade::from_env())),
        "twelvedata" => Some(Arc::new(crate::twelvedata::TwelveData::from_env())),
        _ => None,
    }
}

/// Build the streams for a connector whose credential is missing: one
/// [`VelaError::MissingCredential`] on the error stream, then both streams
/// close cleanly. The process keeps running without this source.
pub(crate) fn credential_failure(
    connector: &'static str,
    var: &'static str,
) -> FeedStreams {
    let (_trade_tx, trades) = mpsc::channel(1);
    let (err_tx, errors) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
    let (stop_tx, _stop_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        let _ = err_tx
            .send(VelaError::missing_credential(connector, var))
            .await;
    });
    FeedStreams {
        handle: SessionHandle::new(join, stop_tx),
        trades,
        errors,
    }
}

pub(crate) use vela_core::stream::stopped;

/// Fold the shared stop watch and a per-session one-shot into a single halt
/// watch, so session tasks have exactly one cancellation source to select on.
pub(crate) fn merge_halt(
    mut stop: watch::Receiver<bool>,
    session_stop_rx: oneshot::Receiver<()>,
) -> watch::Receiver<bool> {
    let (halt_tx, halt_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::select! {
            () = stopped(&mut stop) => {}
            _ = session_stop_rx => {}
        }
        let _ = halt_tx.send(true);
    });
    halt_rx
}
