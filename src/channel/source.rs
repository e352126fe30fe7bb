//! # Minimal channel contracts used by the receive race and by draining consumers.
//!
//! - [`Source`] is the reading side: a cancel-safe `recv`, a non-blocking `try_recv`,
//!   and `relink` to redirect all future deliveries elsewhere.
//! - [`Target`] is anything able to accept a value without blocking.

use std::sync::Arc;

use async_trait::async_trait;

/// Non-blocking sink for values.
pub trait Target<T>: Send + Sync {
    /// Accepts `value`. Must not block or call back into the source that relinked to it.
    fn offer(&self, value: T);
}

/// Reading side of a message channel.
///
/// ### Implementation requirements
/// - `recv` must be **cancel-safe**: a value may only leave the channel in the poll
///   that returns it, so dropping the future never loses a message.
/// - `relink` must be atomic with respect to concurrent sends: after it returns every
///   send lands in the new target and no sender stays parked.
#[async_trait]
pub trait Source<T: Send>: Send + Sync {
    /// Waits for the next value.
    async fn recv(&self) -> T;

    /// Takes the next buffered value, if any.
    fn try_recv(&self) -> Option<T>;

    /// Redirects buffered and future values to `target`.
    fn relink(&self, target: Arc<dyn Target<T>>);
}
