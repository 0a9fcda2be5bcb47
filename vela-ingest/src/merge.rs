use tokio::sync::{mpsc, watch};
use vela_core::Trade;

use crate::connector::stopped;

/// Capacity of the merged trade stream.
pub const MERGED_CHANNEL_CAPACITY: usize = 2048;

/// Fan K connector trade streams into one.
///
/// One forwarder task drains each input; the output closes once every
/// forwarder has exited, which happens when all inputs close or the stop
/// watch flips. Ordering is arrival order at the merger: FIFO per input,
/// non-deterministic across inputs. No reordering, no deduplication, no
/// timestamp awareness.
#[must_use]
pub fn merge_trades(
    inputs: Vec<mpsc::Receiver<Trade>>,
    stop: &watch::Receiver<bool>,
) -> mpsc::Receiver<Trade> {
    let (tx, rx) = mpsc::channel(MERGED_CHANNEL_CAPACITY);
    for mut input in inputs {
        let tx = tx.clone();
        let mut stop = stop.clone();
        tokio::spawn(async move {
            loop {
                let trade = tokio::select! {
                    biased;
                    () = stopped(&mut stop) => break,
                    maybe = input.recv() => match maybe {
                        Some(trade) => trade,
                        None => break,
                    },
                };
                tokio::select! {
                    res = tx.send(trade) => {
                        if res.is_err() {
                            break;
                        }
                    }
                    () = stopped(&mut stop) => break,
                }
            }
        });
    }
    // The clones held by forwarders are now the only senders; the output
    // closes exactly when the last forwarder exits.
    rx
}
