use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use vela_core::stream::stopped;
use vela_core::{SessionHandle, Trade, normalize_symbol};
use vela_ingest::connector::{FeedConnector, FeedStreams};

/// Scripted in-memory connector for engine tests.
///
/// Emits the subset of its script matching the started symbol, then keeps
/// its streams open until the stop watch flips, like a live feed that has
/// gone quiet.
pub struct MockConnector {
    name: &'static str,
    script: Vec<Trade>,
    delay: Duration,
}

impl MockConnector {
    pub fn new(name: &'static str, script: Vec<Trade>) -> Self {
        Self {
            name,
            script,
            delay: Duration::from_millis(1),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl FeedConnector for MockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn start(&self, symbol: &str, mut stop: watch::Receiver<bool>) -> FeedStreams {
        let wanted = normalize_symbol(symbol);
        let script: Vec<Trade> = self
            .script
            .iter()
            .filter(|t| t.symbol == wanted)
            .cloned()
            .collect();
        let delay = self.delay;

        let (trade_tx, trades) = mpsc::channel(64);
        let (err_tx, errors) = mpsc::channel(1);
        let (session_stop_tx, mut session_stop_rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let _err_tx = err_tx;
            for t in script {
                tokio::time::sleep(delay).await;
                tokio::select! {
                    res = trade_tx.send(t) => {
                        if res.is_err() {
                            return;
                        }
                    }
                    () = stopped(&mut stop) => return,
                }
            }
            // Script exhausted: stay "connected" until shutdown.
            tokio::select! {
                () = stopped(&mut stop) => {}
                _ = &mut session_stop_rx => {}
            }
        });

        FeedStreams {
            handle: SessionHandle::new(join, session_stop_tx),
            trades,
            errors,
        }
    }
}
