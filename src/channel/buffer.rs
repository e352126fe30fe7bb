//! # FIFO message buffer with relink support.
//!
//! [`Buffer`] is a multi-producer, single-consumer FIFO queue. Handles are cheap to
//! clone and all clones share the same queue.
//!
//! ## Architecture
//! ```text
//! Producers (many)                               Consumer (one)
//!   send() ──┐                                    ┌──► recv() / try_recv()
//!   send() ──┼──► Mutex<{ queue, link }> ─────────┘
//!   send() ──┘          │
//!                       └── link = Some(target) ──► every send is forwarded to target
//! ```
//!
//! ## Rules
//! - `Buffer::unbounded()` never makes a sender wait.
//! - `Buffer::bounded(n)` makes `send().await` wait while `n` values are queued.
//! - `relink()` moves queued values to the target, forwards every later send and
//!   wakes parked senders; it happens under the same lock as sends, so no send can
//!   slip into the queue after the relink or reach the target ahead of queued values.
//! - `recv()` is cancel-safe: a value is dequeued only in the poll that returns it.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::channel::source::{Source, Target};

struct State<T> {
    queue: VecDeque<T>,
    link: Option<Arc<dyn Target<T>>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: Option<usize>,
    readable: Notify,
    writable: Notify,
}

/// Multi-producer FIFO buffer.
///
/// ## Example
/// ```rust
/// use agentvisor::Buffer;
///
/// let buffer = Buffer::unbounded();
/// assert!(buffer.try_send(1).is_ok());
/// assert!(buffer.try_send(2).is_ok());
/// assert_eq!(buffer.try_recv(), Some(1));
/// assert_eq!(buffer.len(), 1);
/// ```
pub struct Buffer<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send> Buffer<T> {
    /// Creates a buffer without a capacity limit.
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Creates a buffer holding at most `capacity` values (clamped to a minimum of 1).
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity.max(1)))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    link: None,
                }),
                capacity,
                readable: Notify::new(),
                writable: Notify::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `value`, waiting for space if the buffer is bounded and full.
    pub async fn send(&self, value: T) {
        let mut value = value;
        loop {
            let writable = self.shared.writable.notified();
            tokio::pin!(writable);
            writable.as_mut().enable();

            match self.try_send(value) {
                Ok(()) => return,
                Err(back) => value = back,
            }
            writable.await;
        }
    }

    /// Sends `value` without waiting; hands it back if the buffer is full.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let mut state = self.state();
        if let Some(target) = state.link.clone() {
            drop(state);
            target.offer(value);
            return Ok(());
        }
        if let Some(cap) = self.shared.capacity {
            if state.queue.len() >= cap {
                return Err(value);
            }
        }
        state.queue.push_back(value);
        drop(state);

        self.shared.readable.notify_one();
        Ok(())
    }

    /// Waits for the next value.
    pub async fn recv(&self) -> T {
        loop {
            let readable = self.shared.readable.notified();
            tokio::pin!(readable);
            readable.as_mut().enable();

            if let Some(value) = self.try_recv() {
                return value;
            }
            readable.await;
        }
    }

    /// Takes the next queued value, if any.
    pub fn try_recv(&self) -> Option<T> {
        let value = self.state().queue.pop_front();
        if value.is_some() && self.shared.capacity.is_some() {
            self.shared.writable.notify_one();
        }
        value
    }

    /// Redirects queued and future values to `target`.
    ///
    /// Queued values reach `target` before any send that observes the link.
    pub fn relink(&self, target: Arc<dyn Target<T>>) {
        {
            let mut state = self.state();
            for value in state.queue.drain(..) {
                target.offer(value);
            }
            state.link = Some(target);
        }
        self.shared.writable.notify_waiters();
    }

    /// Number of queued values.
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.state().queue.is_empty()
    }

    /// Returns `true` once the buffer has been relinked.
    pub fn is_linked(&self) -> bool {
        self.state().link.is_some()
    }

    /// Capacity limit, `None` for unbounded buffers.
    pub fn capacity(&self) -> Option<usize> {
        self.shared.capacity
    }
}

impl<T> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.shared.capacity)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Send> Source<T> for Buffer<T> {
    async fn recv(&self) -> T {
        Buffer::recv(self).await
    }

    fn try_recv(&self) -> Option<T> {
        Buffer::try_recv(self)
    }

    fn relink(&self, target: Arc<dyn Target<T>>) {
        Buffer::relink(self, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::OverwriteBuffer;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let buffer = Buffer::unbounded();
        for i in 0..5 {
            buffer.send(i).await;
        }
        for i in 0..5 {
            assert_eq!(buffer.recv().await, i);
        }
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_recv_wakes_on_send() {
        let buffer = Buffer::unbounded();
        let reader = {
            let b = buffer.clone();
            tokio::spawn(async move { b.recv().await })
        };
        tokio::task::yield_now().await;
        buffer.send("hello").await;
        assert_eq!(reader.await.expect("reader panicked"), "hello");
    }

    #[tokio::test]
    async fn test_bounded_rejects_when_full() {
        let buffer = Buffer::bounded(1);
        assert_eq!(buffer.capacity(), Some(1));
        assert!(buffer.try_send(1).is_ok());
        assert_eq!(buffer.try_send(2), Err(2));

        assert_eq!(buffer.try_recv(), Some(1));
        assert!(buffer.try_send(2).is_ok());
    }

    #[tokio::test]
    async fn test_dropped_recv_does_not_lose_values() {
        let buffer = Buffer::unbounded();
        let pending = tokio::time::timeout(Duration::from_millis(10), buffer.recv()).await;
        assert!(pending.is_err());

        buffer.send(7).await;
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.recv().await, 7);
    }

    #[tokio::test]
    async fn test_relink_moves_queue_and_forwards_sends() {
        let buffer = Buffer::unbounded();
        buffer.send(1).await;
        buffer.send(2).await;

        let sink = Arc::new(OverwriteBuffer::new());
        buffer.relink(sink.clone());
        assert!(buffer.is_linked());
        assert!(buffer.is_empty());
        assert_eq!(sink.peek(), Some(2));

        buffer.send(3).await;
        assert!(buffer.is_empty());
        assert_eq!(sink.peek(), Some(3));
        assert_eq!(sink.offered(), 3);
    }

    struct Recorder(Mutex<Vec<u32>>);

    impl Target<u32> for Recorder {
        fn offer(&self, value: u32) {
            self.0.lock().expect("poisoned").push(value);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_relink_keeps_queued_values_ahead_of_concurrent_sends() {
        let buffer = Buffer::unbounded();
        for i in 0..1000u32 {
            assert!(buffer.try_send(i).is_ok());
        }

        let sender = {
            let b = buffer.clone();
            tokio::spawn(async move {
                for i in 1000..2000u32 {
                    b.send(i).await;
                }
            })
        };
        let target = Arc::new(Recorder(Mutex::new(Vec::new())));
        buffer.relink(target.clone());
        sender.await.expect("sender panicked");

        let seen = target.0.lock().expect("poisoned").clone();
        assert!(buffer.is_empty());
        assert_eq!(seen, (0..2000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_relink_releases_parked_senders() {
        let buffer = Buffer::bounded(1);
        buffer.send(1).await;

        let sender = {
            let b = buffer.clone();
            tokio::spawn(async move { b.send(2).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sender.is_finished());

        let sink = Arc::new(OverwriteBuffer::new());
        buffer.relink(sink.clone());

        tokio::time::timeout(Duration::from_secs(1), sender)
            .await
            .expect("sender stayed parked")
            .expect("sender panicked");
        assert_eq!(sink.peek(), Some(2));
    }
}
