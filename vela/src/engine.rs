//! Pipeline assembly: connectors → merger → aggregator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use vela_core::{Candle, SessionHandle, VelaError, normalize_symbol};
use vela_ingest::{FeedConnector, merge_trades};

/// Builder for a validated [`Engine`].
pub struct EngineBuilder {
    connectors: Vec<Arc<dyn FeedConnector>>,
    symbols: Vec<String>,
    interval: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Create a builder with no connectors, no symbols, and 1 s windows.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: Vec::new(),
            symbols: Vec::new(),
            interval: Duration::from_secs(1),
        }
    }

    /// Register a trade source. Every registered connector ingests every
    /// configured symbol.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn FeedConnector>) -> Self {
        self.connectors.push(connector);
        self
    }

    /// Add one symbol (normalized to compact uppercase).
    #[must_use]
    pub fn symbol(mut self, symbol: &str) -> Self {
        self.symbols.push(normalize_symbol(symbol));
        self
    }

    /// Set the aggregation window size.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    /// Rejects a zero interval, an empty connector set, and an empty symbol
    /// set: the unrecoverable startup conditions.
    pub fn build(self) -> Result<Engine, VelaError> {
        if self.interval.is_zero() {
            return Err(VelaError::config("interval must be positive"));
        }
        if self.connectors.is_empty() {
            return Err(VelaError::config("no connectors configured"));
        }
        let symbols: BTreeSet<String> =
            self.symbols.into_iter().filter(|s| !s.is_empty()).collect();
        if symbols.is_empty() {
            return Err(VelaError::config("no symbols configured"));
        }
        Ok(Engine {
            connectors: self.connectors,
            symbols: symbols.into_iter().collect(),
            interval: self.interval,
        })
    }
}

/// A validated candle pipeline, ready to start.
pub struct Engine {
    connectors: Vec<Arc<dyn FeedConnector>>,
    symbols: Vec<String>,
    interval: Duration,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field(
                "connectors",
                &self.connectors.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("symbols", &self.symbols)
            .field("interval", &self.interval)
            .finish()
    }
}

impl Engine {
    /// Start building an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// The configured window size.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// The normalized symbol set.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Spawn one ingest session per (connector, symbol), fan the trade
    /// streams into the aggregator, and hand back the resulting candle
    /// stream.
    ///
    /// Everything spawned here terminates when `stop` flips; the candle
    /// stream then closes once in-flight trades drain.
    #[must_use]
    pub fn start(&self, stop: watch::Receiver<bool>) -> EngineStream {
        let mut trade_streams = Vec::new();
        let mut sessions = Vec::new();
        for connector in &self.connectors {
            for symbol in &self.symbols {
                let streams = connector.start(symbol, stop.clone());
                trade_streams.push(streams.trades);
                sessions.push(streams.handle);
                spawn_error_logger(connector.name(), streams.errors);
            }
        }
        tracing::info!(
            sessions = sessions.len(),
            interval_ms = self.interval.as_millis() as u64,
            "engine started"
        );

        let merged = merge_trades(trade_streams, &stop);
        let candles = crate::aggregate::run(merged, self.interval, stop);
        EngineStream { candles, sessions }
    }
}

/// The running pipeline: a candle stream plus the session handles keeping
/// the ingest tasks stoppable. Dropping this aborts the sessions; prefer
/// [`shutdown`](Self::shutdown) after flipping the stop watch.
pub struct EngineStream {
    /// Aggregated candles, partials and finals interleaved per symbol.
    pub candles: mpsc::Receiver<Candle>,
    sessions: Vec<SessionHandle>,
}

impl EngineStream {
    /// Await the graceful termination of every ingest session.
    pub async fn shutdown(self) {
        for session in self.sessions {
            session.stop().await;
        }
    }
}

fn spawn_error_logger(connector: &'static str, mut errors: mpsc::Receiver<VelaError>) {
    tokio::spawn(async move {
        while let Some(err) = errors.recv().await {
            tracing::warn!(connector, error = %err, "ingest error");
        }
    });
}
