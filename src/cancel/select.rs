//! # Cancellable receive.
//!
//! [`select_receive`] races "a value is available" against "cancellation was requested"
//! and commits to exactly one of them. [`select_receive_timeout`] adds a deadline.
//!
//! ## Flow
//! ```text
//! token already cancelled? ── yes ──► Cancelled      (source untouched)
//!        │ no
//!        ▼
//! select! (biased) {
//!     signal fired    ──► Cancelled
//!     source.recv()   ──► Received(v)
//! }
//! deadline elapsed    ──► Err(SelectError::Timeout)
//! ```
//!
//! ## Rules
//! - Exactly one outcome per call; a value that was dequeued is always returned.
//! - When both sides are ready the cancellation branch wins and the value stays
//!   buffered (it is then handled by the consumer's drain policy).
//! - Relies on [`Source::recv`] being cancel-safe.

use std::time::Duration;

use tokio::time;

use crate::cancel::token::CancellationToken;
use crate::channel::Source;
use crate::error::SelectError;

/// Outcome of a cancellable receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected<T> {
    /// A value was taken from the source.
    Received(T),
    /// Cancellation was requested; nothing was taken from the source.
    Cancelled,
}

impl<T> Selected<T> {
    /// Returns `true` for [`Selected::Cancelled`].
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Selected::Cancelled)
    }

    /// Returns the received value, if any.
    #[inline]
    pub fn into_value(self) -> Option<T> {
        match self {
            Selected::Received(v) => Some(v),
            Selected::Cancelled => None,
        }
    }
}

/// Waits for either the next value from `source` or cancellation of `token`.
///
/// ## Example
/// ```rust
/// use agentvisor::{Buffer, CancellationTokenSource, Selected, select_receive};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let buffer = Buffer::unbounded();
/// let source = CancellationTokenSource::new();
/// let token = source.token();
///
/// buffer.send(42).await;
/// assert_eq!(select_receive(&buffer, &token).await, Selected::Received(42));
///
/// source.cancel();
/// buffer.send(43).await;
/// assert_eq!(select_receive(&buffer, &token).await, Selected::Cancelled);
/// assert_eq!(buffer.len(), 1);
/// # }
/// ```
pub async fn select_receive<S, T>(source: &S, token: &CancellationToken) -> Selected<T>
where
    S: Source<T> + ?Sized,
    T: Send,
{
    if token.is_cancellation_requested() {
        return Selected::Cancelled;
    }

    tokio::select! {
        biased;
        _ = token.signal().wait_observe(None) => {
            token.mark_observed();
            Selected::Cancelled
        }
        value = source.recv() => Selected::Received(value),
    }
}

/// Like [`select_receive`] but fails with [`SelectError::Timeout`] when neither side
/// resolves within `timeout`.
///
/// A zero timeout still takes a value that is already buffered (or reports an already
/// requested cancellation) and fails immediately otherwise.
pub async fn select_receive_timeout<S, T>(
    source: &S,
    token: &CancellationToken,
    timeout: Duration,
) -> Result<Selected<T>, SelectError>
where
    S: Source<T> + ?Sized,
    T: Send,
{
    match time::timeout(timeout, select_receive(source, token)).await {
        Ok(selected) => Ok(selected),
        Err(_elapsed) => Err(SelectError::Timeout { timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationTokenSource;
    use crate::channel::Buffer;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_receives_buffered_value() {
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        buffer.send(1).await;

        let got = select_receive(&buffer, &source.token()).await;
        assert_eq!(got, Selected::Received(1));
    }

    #[tokio::test]
    async fn test_cancelled_token_leaves_source_untouched() {
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        let token = source.token();
        buffer.send(1).await;
        buffer.send(2).await;
        source.cancel();

        for _ in 0..3 {
            assert!(select_receive(&buffer, &token).await.is_cancelled());
        }
        assert_eq!(buffer.len(), 2);
    }

    #[tokio::test]
    async fn test_value_ready_then_cancelled_keeps_value_buffered() {
        // Both sides ready: cancellation wins and nothing is dequeued.
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        let token = source.token();
        buffer.send(5).await;
        source.cancel();

        assert!(select_receive(&buffer, &token).await.is_cancelled());
        assert_eq!(buffer.try_recv(), Some(5));
    }

    #[tokio::test]
    async fn test_value_received_before_cancel_is_kept() {
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        let token = source.token();
        buffer.send(5).await;

        let got = select_receive(&buffer, &token).await;
        source.cancel();
        assert_eq!(got.into_value(), Some(5));
        assert!(select_receive(&buffer, &token).await.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_wakes_parked_receiver() {
        let buffer: Buffer<u32> = Buffer::unbounded();
        let source = Arc::new(CancellationTokenSource::new());
        let token = source.token();

        let waiter = {
            let b = buffer.clone();
            tokio::spawn(async move { select_receive(&b, &token).await })
        };
        tokio::task::yield_now().await;
        source.cancel();

        let got = waiter.await.expect("waiter panicked");
        assert!(got.is_cancelled());
    }

    #[tokio::test]
    async fn test_value_wakes_parked_receiver() {
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        let token = source.token();

        let waiter = {
            let b = buffer.clone();
            tokio::spawn(async move { select_receive(&b, &token).await })
        };
        tokio::task::yield_now().await;
        buffer.send("v").await;

        assert_eq!(
            waiter.await.expect("waiter panicked"),
            Selected::Received("v")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_deadline() {
        let buffer: Buffer<u32> = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        let timeout = Duration::from_millis(100);
        let started = time::Instant::now();

        let got = select_receive_timeout(&buffer, &source.token(), timeout).await;
        let elapsed = started.elapsed();

        assert_eq!(got, Err(SelectError::Timeout { timeout }));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_fire_when_value_arrives() {
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        let token = source.token();

        let producer = {
            let b = buffer.clone();
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(30)).await;
                b.send(9).await;
            })
        };

        let got = select_receive_timeout(&buffer, &token, Duration::from_millis(100)).await;
        assert_eq!(got, Ok(Selected::Received(9)));
        producer.await.expect("producer panicked");
    }

    #[tokio::test]
    async fn test_zero_timeout_takes_ready_value() {
        let buffer = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        buffer.send(3).await;

        let got = select_receive_timeout(&buffer, &source.token(), Duration::ZERO).await;
        assert_eq!(got, Ok(Selected::Received(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_on_empty_source_fails_immediately() {
        let buffer: Buffer<u32> = Buffer::unbounded();
        let source = CancellationTokenSource::new();

        let got = time::timeout(
            Duration::from_secs(3600),
            select_receive_timeout(&buffer, &source.token(), Duration::ZERO),
        )
        .await
        .expect("zero timeout never elapsed");
        assert_eq!(
            got,
            Err(SelectError::Timeout {
                timeout: Duration::ZERO
            })
        );
    }

    #[tokio::test]
    async fn test_zero_timeout_reports_cancellation() {
        let buffer: Buffer<u32> = Buffer::unbounded();
        let source = CancellationTokenSource::new();
        source.cancel();

        let got = select_receive_timeout(&buffer, &source.token(), Duration::ZERO).await;
        assert_eq!(got, Ok(Selected::Cancelled));
    }
}
