//! # Cancellation tokens and their source.
//!
//! [`CancellationTokenSource`] owns a [`SignalChannel`] and is the only party able to fire it.
//! [`CancellationToken`] is a read-only view of the same signal; a source can mint any number
//! of tokens, which is how one source controls a group of agents.
//!
//! ```text
//!                    ┌──► CancellationToken (agent 1)
//! Source ── signal ──┼──► CancellationToken (agent 2)
//!  cancel()          └──► CancellationToken (agent N)
//! ```
//!
//! ## Rules
//! - Tokens minted **after** `cancel()` report cancellation on their first query.
//! - Once a token reports `true` it caches it and never reports `false` again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cancel::signal::SignalChannel;

/// Read-only capability to observe whether cancellation has been requested.
///
/// ## Example
/// ```rust
/// use agentvisor::CancellationTokenSource;
///
/// let source = CancellationTokenSource::new();
/// let token = source.token();
/// assert!(!token.is_cancellation_requested());
///
/// source.cancel();
/// assert!(token.is_cancellation_requested());
/// assert!(source.token().is_cancellation_requested());
/// ```
#[derive(Debug)]
pub struct CancellationToken {
    signal: Arc<SignalChannel>,
    observed: AtomicBool,
}

impl CancellationToken {
    fn new(signal: Arc<SignalChannel>) -> Self {
        Self {
            signal,
            observed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once cancellation has been requested on the backing source.
    ///
    /// After the first `true` the answer is cached and the signal is not polled again.
    pub fn is_cancellation_requested(&self) -> bool {
        if self.observed.load(Ordering::Acquire) {
            return true;
        }
        if self.signal.try_observe() {
            self.mark_observed();
            return true;
        }
        false
    }

    /// Parks until cancellation is requested or `timeout` elapses.
    ///
    /// Returns `true` when cancellation was observed. Useful for bodies that
    /// tick on a timer instead of draining a channel.
    pub async fn wait_for_cancellation(&self, timeout: Option<Duration>) -> bool {
        if self.is_cancellation_requested() {
            return true;
        }
        let fired = self.signal.wait_observe(timeout).await;
        if fired {
            self.mark_observed();
        }
        fired
    }

    pub(crate) fn signal(&self) -> &SignalChannel {
        &self.signal
    }

    pub(crate) fn mark_observed(&self) {
        self.observed.store(true, Ordering::Release);
    }
}

impl Clone for CancellationToken {
    fn clone(&self) -> Self {
        Self {
            signal: Arc::clone(&self.signal),
            observed: AtomicBool::new(self.observed.load(Ordering::Acquire)),
        }
    }
}

/// Owner of a cancellation signal: requests cancellation and mints tokens.
#[derive(Debug, Default)]
pub struct CancellationTokenSource {
    signal: Arc<SignalChannel>,
    cancelled: AtomicBool,
}

impl CancellationTokenSource {
    /// Creates a source whose signal has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that is also cancelled when `parent`'s source is cancelled.
    ///
    /// Cancelling the child never cancels the parent.
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self {
            signal: Arc::new(parent.signal().child()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Requests cancellation. Safe to call any number of times from any task.
    pub fn cancel(&self) {
        self.signal.fire();
    }

    /// Mints a new token bound to this source's signal.
    pub fn token(&self) -> CancellationToken {
        CancellationToken::new(Arc::clone(&self.signal))
    }

    /// Returns `true` once cancellation has been requested (directly or through a parent).
    pub fn is_cancellation_requested(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        let fired = self.signal.try_observe();
        if fired {
            self.cancelled.store(true, Ordering::Release);
        }
        fired
    }
}
