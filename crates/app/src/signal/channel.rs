//! Channel guard — one transmission at a time, spaced by a busy delay.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::lock;

/// Serializes outbound transmissions of one receiver.
///
/// Every successful send (and every received frame) marks the channel busy
/// for `busy_for`; the next transmission waits for the channel to be free.
#[derive(Debug)]
pub struct ChannelGuard {
    busy_for: Duration,
    free_at: Mutex<Option<Instant>>,
    turn: tokio::sync::Mutex<()>,
}

impl ChannelGuard {
    #[must_use]
    pub fn new(busy_for: Duration) -> Self {
        Self {
            busy_for,
            free_at: Mutex::new(None),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn busy_for(&self) -> Duration {
        self.busy_for
    }

    /// Mark the channel busy from now on.
    pub fn mark_busy(&self) {
        *lock(&self.free_at) = Some(Instant::now() + self.busy_for);
    }

    /// Run `send` once every earlier transmission is done and the channel
    /// is free. A successful send marks the channel busy.
    ///
    /// # Errors
    ///
    /// Returns whatever `send` returns.
    pub async fn transmit<F, Fut, T, E>(&self, send: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _turn = self.turn.lock().await;
        loop {
            let free_at = *lock(&self.free_at);
            match free_at {
                Some(at) if at > Instant::now() => tokio::time::sleep_until(at).await,
                _ => break,
            }
        }

        let result = send().await;
        if result.is_ok() {
            self.mark_busy();
        }
        result
    }
}
