use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Resolve once the stop watch reads `true`.
///
/// A dropped sender counts as a stop request, so tasks selecting on this
/// cannot outlive the pipeline that spawned them.
pub async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|flag| *flag).await;
}

/// Handle to one long-lived ingest session task.
///
/// Lifecycle contract:
/// - Prefer [`stop`](SessionHandle::stop) to request a graceful shutdown and
///   await completion.
/// - Call [`abort`](SessionHandle::abort) for immediate termination.
/// - On drop, a best-effort stop signal is sent and the task is aborted if
///   still running; the task may not observe the signal before the abort
///   lands.
#[derive(Debug)]
pub struct SessionHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    /// Wrap the spawned session task and the one-shot used to request a
    /// graceful stop.
    #[must_use]
    pub const fn new(inner: JoinHandle<()>, stop_tx: oneshot::Sender<()>) -> Self {
        Self {
            inner: Some(inner),
            stop_tx: Some(stop_tx),
        }
    }

    /// Return `true` once the session task has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Request a graceful stop and wait for the session task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(inner) = self.inner.take() {
            let _ = inner.await;
        }
    }

    /// Kill the session task without waiting. Use [`stop`](Self::stop) when
    /// the session should get a chance to wind down.
    pub fn abort(mut self) {
        if let Some(inner) = self.inner.take() {
            inner.abort();
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(inner) = self.inner.take()
            && !inner.is_finished()
        {
            inner.abort();
        }
    }
}
