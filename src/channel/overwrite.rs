//! # Single-slot sink.
//!
//! [`OverwriteBuffer`] keeps only the most recent value it was offered. Draining
//! consumers relink their input to one of these after a failure so that producers
//! keep making progress while the values are discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::channel::source::Target;

/// Single-slot buffer; every offer replaces the previous value.
#[derive(Debug)]
pub struct OverwriteBuffer<T> {
    slot: Mutex<Option<T>>,
    offered: AtomicU64,
}

impl<T> OverwriteBuffer<T> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            offered: AtomicU64::new(0),
        }
    }

    /// Takes the stored value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Returns `true` if a value is stored.
    pub fn has_value(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of values offered so far (including overwritten ones).
    pub fn offered(&self) -> u64 {
        self.offered.load(Ordering::Relaxed)
    }
}

impl<T: Clone> OverwriteBuffer<T> {
    /// Returns a copy of the stored value.
    pub fn peek(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T> Default for OverwriteBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Target<T> for OverwriteBuffer<T> {
    fn offer(&self, value: T) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        self.offered.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_latest_value() {
        let sink = OverwriteBuffer::new();
        assert!(!sink.has_value());

        sink.offer(1);
        sink.offer(2);
        assert_eq!(sink.peek(), Some(2));
        assert_eq!(sink.offered(), 2);

        assert_eq!(sink.take(), Some(2));
        assert!(sink.take().is_none());
    }
}
