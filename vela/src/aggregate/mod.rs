//! Time-bucketed OHLCV+VWAP aggregation.
//!
//! Split the way the streaming supervisor is: a pure fold ([`Aggregator`])
//! that turns trades and clock readings into candle emissions, and an async
//! driver ([`run`]) that wires it to channels, the sweep timer, and the stop
//! watch. The window map has exactly one owner (the driver task), so there
//! is no lock anywhere in the hot path.

mod window;

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use vela_core::stream::stopped;
use vela_core::{Candle, Trade};

use window::Window;

/// Capacity of the aggregator's candle output.
pub const CANDLE_CHANNEL_CAPACITY: usize = 2048;

/// How long one full-queue retry may block before the candle is dropped.
const SEND_RETRY: Duration = Duration::from_millis(25);

/// Wall-clock tolerance when deciding that an idle window has closed.
///
/// Capped at a tenth of the interval so sub-100 ms windows are not held open
/// by a tolerance comparable to their own width. The tolerance exists to
/// avoid racing the wall clock against a just-received boundary trade.
#[must_use]
pub const fn sweep_epsilon_ms(interval_ms: i64) -> i64 {
    let tenth = interval_ms / 10;
    if tenth < 10 { tenth } else { 10 }
}

/// Pure per-symbol windowing fold.
///
/// Feed it trades via [`on_trade`](Self::on_trade) and clock readings via
/// [`sweep`](Self::sweep); it returns the candles each step emits, finals
/// always ahead of the partial that opens the next bucket.
#[derive(Debug)]
pub struct Aggregator {
    interval_ms: i64,
    windows: HashMap<String, Window>,
}

impl Aggregator {
    /// Create an aggregator for interval-aligned buckets of `interval`.
    ///
    /// `interval` must be positive; builders validate this before
    /// construction.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX).max(1),
            windows: HashMap::new(),
        }
    }

    /// Width of this aggregator's buckets in milliseconds.
    #[must_use]
    pub const fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    /// Number of currently open windows.
    #[must_use]
    pub fn open_windows(&self) -> usize {
        self.windows.len()
    }

    /// Fold one trade, returning the emissions it causes: the final of a
    /// rotated-out bucket (if any) followed by the live partial.
    pub fn on_trade(&mut self, trade: &Trade) -> Vec<Candle> {
        let start_ms = trade.ts_ms().div_euclid(self.interval_ms) * self.interval_ms;
        let end_ms = start_ms + self.interval_ms;

        let mut out = Vec::with_capacity(2);
        let rotate = self
            .windows
            .get(&trade.symbol)
            .is_some_and(|w| w.start_ms() != start_ms);
        if rotate
            && let Some(old) = self.windows.remove(&trade.symbol)
            && old.is_init()
        {
            out.push(old.candle(&trade.symbol, true));
        }

        let window = self
            .windows
            .entry(trade.symbol.clone())
            .or_insert_with(|| Window::new(start_ms, end_ms));
        window.fold(trade);
        out.push(window.candle(&trade.symbol, false));
        out
    }

    /// Close every window whose end has passed `now_ms` by more than the
    /// sweep tolerance. Guarantees a final even when no rotating trade ever
    /// arrives.
    pub fn sweep(&mut self, now_ms: i64) -> Vec<Candle> {
        let cutoff = now_ms - sweep_epsilon_ms(self.interval_ms);
        let expired: Vec<String> = self
            .windows
            .iter()
            .filter(|(_, w)| w.is_init() && w.end_ms() <= cutoff)
            .map(|(sym, _)| sym.clone())
            .collect();

        let mut out = Vec::with_capacity(expired.len());
        for symbol in expired {
            if let Some(w) = self.windows.remove(&symbol) {
                out.push(w.candle(&symbol, true));
            }
        }
        out
    }
}

/// Drive an [`Aggregator`] over a live trade stream.
///
/// The returned stream closes when the input closes or the stop watch flips.
/// Emission is lossy under sustained downstream stall: a full output gets one
/// bounded retry per candle, then the candle is dropped; the next partial or
/// the sweep-driven final supersedes it.
#[must_use]
pub fn run(
    mut trades: mpsc::Receiver<Trade>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> mpsc::Receiver<Candle> {
    let (tx, rx) = mpsc::channel(CANDLE_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut agg = Aggregator::new(interval);
        // First sweep one period out; there is nothing to close at startup.
        let period = interval / 2;
        let mut sweeper = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        sweeper.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        'run: loop {
            let emissions = tokio::select! {
                biased;
                () = stopped(&mut stop) => break 'run,
                maybe = trades.recv() => match maybe {
                    Some(trade) => agg.on_trade(&trade),
                    None => break 'run,
                },
                _ = sweeper.tick() => agg.sweep(Utc::now().timestamp_millis()),
            };
            for candle in emissions {
                if !emit(&tx, candle, &mut stop).await {
                    break 'run;
                }
            }
        }
    });
    rx
}

/// Non-blocking emit with one bounded retry.
///
/// Returns `false` when the loop should terminate (downstream gone or
/// cancellation); a retry timeout only drops the candle.
async fn emit(tx: &mpsc::Sender<Candle>, candle: Candle, stop: &mut watch::Receiver<bool>) -> bool {
    use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};

    let candle = match tx.try_send(candle) {
        Ok(()) => return true,
        Err(TrySendError::Closed(_)) => return false,
        Err(TrySendError::Full(candle)) => candle,
    };
    tokio::select! {
        res = tx.send_timeout(candle, SEND_RETRY) => match res {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(c)) => {
                tracing::trace!(symbol = %c.symbol, "candle dropped: output full");
                true
            }
            Err(SendTimeoutError::Closed(_)) => false,
        },
        () = stopped(stop) => false,
    }
}
