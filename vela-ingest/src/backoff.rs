use rand::Rng;
use tokio::sync::watch;
use vela_core::BackoffConfig;

/// Exponential reconnect delay for one ingest session.
///
/// Starts at `min_backoff_ms`, multiplies by `factor` per consecutive
/// failure up to `max_backoff_ms`, and resets to the minimum after any
/// successful message reception. Each wait gets random slack of up to
/// `jitter_percent` percent so a fleet of sessions does not reconnect in
/// lockstep.
#[derive(Debug)]
pub struct Backoff {
    cfg: BackoffConfig,
    next_ms: u64,
}

impl Backoff {
    /// Create a backoff at its initial delay.
    #[must_use]
    pub const fn new(cfg: BackoffConfig) -> Self {
        Self {
            next_ms: cfg.min_backoff_ms,
            cfg,
        }
    }

    /// The delay the next failure wait would use, in milliseconds.
    #[must_use]
    pub const fn current_ms(&self) -> u64 {
        self.next_ms
    }

    /// Consume the current delay and schedule the next one (doubling, capped).
    /// Returns the delay to wait now.
    pub fn advance(&mut self) -> u64 {
        let now = self.next_ms;
        self.next_ms = self
            .next_ms
            .saturating_mul(u64::from(self.cfg.factor))
            .min(self.cfg.max_backoff_ms);
        now
    }

    /// Drop back to the initial delay after a successful reception.
    pub fn reset(&mut self) {
        self.next_ms = self.cfg.min_backoff_ms;
    }

    /// Sleep out the current delay plus jitter, advancing the schedule.
    ///
    /// Returns `false` if the stop watch flipped before the wait finished;
    /// callers then terminate instead of reconnecting.
    pub async fn wait(&mut self, stop: &mut watch::Receiver<bool>) -> bool {
        let mut delay = self.advance();
        if self.cfg.jitter_percent > 0 {
            let slack = delay.saturating_mul(u64::from(self.cfg.jitter_percent)) / 100;
            if slack > 0 {
                delay += rand::rng().random_range(0..=slack);
            }
        }
        tokio::select! {
            () = tokio::time::sleep(std::time::Duration::from_millis(delay)) => true,
            () = crate::connector::stopped(stop) => false,
        }
    }
}
