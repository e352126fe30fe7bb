//! # Single-fire broadcast signal.
//!
//! [`SignalChannel`] is fired at most once and observed by any number of readers.
//! It is a thin wrapper over [`tokio_util::sync::CancellationToken`]:
//!
//! ```text
//! fire()          ──► token.cancel()          (idempotent, wakes every waiter)
//! try_observe()   ──► token.is_cancelled()    (non-blocking)
//! wait_observe()  ──► token.cancelled().await (optionally bounded by a deadline)
//! ```
//!
//! ## Rules
//! - Once fired, a signal stays fired (no re-arming).
//! - Firing twice is a no-op, not an error.
//! - A child signal fires when its parent fires; firing the child never touches the parent.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken as Trigger;

/// One-shot, multi-reader notification.
#[derive(Debug, Default)]
pub struct SignalChannel {
    trigger: Trigger,
}

impl SignalChannel {
    /// Creates a signal that has not been fired.
    pub fn new() -> Self {
        Self {
            trigger: Trigger::new(),
        }
    }

    /// Creates a signal that fires together with `self` but can also be fired on its own.
    pub fn child(&self) -> Self {
        Self {
            trigger: self.trigger.child_token(),
        }
    }

    /// Fires the signal. Repeated calls are no-ops.
    pub fn fire(&self) {
        self.trigger.cancel();
    }

    /// Returns `true` iff the signal has fired. Never blocks.
    #[inline]
    pub fn try_observe(&self) -> bool {
        self.trigger.is_cancelled()
    }

    /// Parks the caller until the signal fires or `timeout` elapses.
    ///
    /// Returns `true` when the signal fired, `false` on timeout.
    /// `None` waits without a deadline.
    pub async fn wait_observe(&self, timeout: Option<Duration>) -> bool {
        match timeout {
            None => {
                self.trigger.cancelled().await;
                true
            }
            Some(dur) => time::timeout(dur, self.trigger.cancelled()).await.is_ok(),
        }
    }
}
