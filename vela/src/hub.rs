//! Symbol-keyed candle pub/sub with lossy slow-consumer semantics.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use vela_core::Candle;

/// Capacity of each subscriber's candle queue.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 1024;

type Registry = HashMap<String, HashMap<u64, mpsc::Sender<Candle>>>;

struct Shared {
    subs: RwLock<Registry>,
    next_id: AtomicU64,
}

/// Publish/subscribe registry for aggregated candles.
///
/// One writer (the pipeline's candle consumer) publishes; any number of
/// subscriber streams attach and detach concurrently. A full subscriber
/// queue drops the candle for that subscriber only; publishing never
/// blocks on a slow consumer.
#[derive(Clone)]
pub struct Hub {
    shared: Arc<Shared>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                subs: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Deliver `candle` to every subscriber of its symbol.
    ///
    /// Per subscriber this is a non-blocking enqueue; queues that are full
    /// miss this candle and catch up on the next one (or the final, which
    /// supersedes any partial).
    pub fn publish(&self, candle: &Candle) {
        let subs = self.shared.subs.read();
        let Some(group) = subs.get(&candle.symbol) else {
            return;
        };
        for sender in group.values() {
            if sender.try_send(candle.clone()).is_err() {
                tracing::trace!(symbol = %candle.symbol, "subscriber queue full; candle dropped");
            }
        }
    }

    /// Attach a new subscriber for `symbol`.
    ///
    /// Subscribers are independent; detaching one never affects another.
    #[must_use]
    pub fn subscribe(&self, symbol: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared
            .subs
            .write()
            .entry(symbol.to_string())
            .or_default()
            .insert(id, tx);
        Subscription {
            symbol: symbol.to_string(),
            id,
            rx,
            shared: Arc::clone(&self.shared),
            detached: false,
        }
    }

    /// Number of live subscribers for `symbol`.
    #[must_use]
    pub fn subscriber_count(&self, symbol: &str) -> usize {
        self.shared
            .subs
            .read()
            .get(symbol)
            .map_or(0, |group| group.len())
    }
}

/// One subscriber's bounded candle queue plus its detach handle.
///
/// Detach is idempotent and closes the queue: after the buffered candles
/// drain, [`recv`](Self::recv) returns `None` and the consumer loop ends
/// naturally. Dropping the subscription detaches it. A detached queue is
/// never reused.
pub struct Subscription {
    symbol: String,
    id: u64,
    rx: mpsc::Receiver<Candle>,
    shared: Arc<Shared>,
    detached: bool,
}

impl Subscription {
    /// Symbol this subscription is attached to.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Receive the next candle; `None` once detached and drained.
    pub async fn recv(&mut self) -> Option<Candle> {
        self.rx.recv().await
    }

    /// Receive without waiting.
    ///
    /// # Errors
    /// Propagates the queue state: empty, or disconnected after detach.
    pub fn try_recv(&mut self) -> Result<Candle, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Detach from the hub. Idempotent; closes the queue. The symbol's
    /// registry entry disappears with its last subscriber.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        let mut subs = self.shared.subs.write();
        if let Some(group) = subs.get_mut(&self.symbol) {
            group.remove(&self.id);
            if group.is_empty() {
                subs.remove(&self.symbol);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
