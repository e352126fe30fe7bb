//! # Drain policy for draining consumers.
//!
//! [`DrainPolicy`] decides what happens to values still buffered when a
//! [`DrainingConsumer`](crate::DrainingConsumer) observes cancellation.
//!
//! ```text
//! cancelled ──► RetainLastValues ──► try_recv() until empty, consume each (FIFO)
//!          └──► DropLastValues   ──► return; buffered values stay unconsumed
//! ```

/// What to do with values left in the input once cancellation is observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Consume every value still buffered, in FIFO order (default).
    #[default]
    RetainLastValues,
    /// Leave buffered values unconsumed.
    DropLastValues,
}

impl DrainPolicy {
    /// Returns `true` for [`DrainPolicy::RetainLastValues`].
    #[inline]
    pub fn retains(self) -> bool {
        matches!(self, DrainPolicy::RetainLastValues)
    }
}
