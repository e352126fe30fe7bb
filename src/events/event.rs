//! # Runtime events emitted by agents, draining consumers and groups.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: agent started, stop requested, completed, waited
//! - **Failure events**: body failed or panicked, consumer failed, channel relinked
//! - **Group events**: shutdown requested, stopped within grace, grace exceeded
//! - **Subscriber events**: overflow and panic reports from the fan-out layer
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use agentvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DrainFinished)
//!     .with_agent("printer")
//!     .with_count(3);
//!
//! assert_eq!(ev.kind, EventKind::DrainFinished);
//! assert_eq!(ev.agent.as_deref(), Some("printer"));
//! assert_eq!(ev.count, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Agent lifecycle ===
    /// The body began running.
    ///
    /// Sets: `agent`
    AgentStarted,

    /// `stop()` was called; the agent's cancellation signal fired.
    ///
    /// Sets: `agent`
    StopRequested,

    /// The body returned (or panicked); always published exactly once per started agent.
    ///
    /// Sets: `agent`
    AgentCompleted,

    /// The body returned an error.
    ///
    /// Sets: `agent`, `reason`
    AgentFailed,

    /// The body panicked.
    ///
    /// Sets: `agent`, `reason` (panic message)
    AgentPanicked,

    /// A caller finished waiting for the agent.
    ///
    /// Sets: `agent`
    AgentWaited,

    // === Draining consumers ===
    /// `consume` failed; consumption ends for good.
    ///
    /// Sets: `agent`, `reason`
    ConsumerFailed,

    /// The consumer's input was relinked to a discard sink.
    ///
    /// Sets: `agent`, `count` (values moved out of the queue)
    ChannelRelinked,

    /// Post-cancellation drain completed.
    ///
    /// Sets: `agent`, `count` (values consumed while draining)
    DrainFinished,

    // === Group shutdown ===
    /// Group cancellation requested.
    ShutdownRequested,

    /// Every agent of the group completed within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some agents did not complete in time.
    ///
    /// Sets: `timeout_ms`, `reason` (stuck agents)
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `agent` (subscriber name), `reason`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `agent` (subscriber name), `reason`
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the agent (or subscriber), if applicable.
    pub agent: Option<Arc<str>>,
    /// Human-readable reason (errors, panic messages, stuck agents).
    pub reason: Option<Arc<str>>,
    /// Number of values involved (drained, relinked).
    pub count: Option<u64>,
    /// Grace or timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            agent: None,
            reason: None,
            count: None,
            timeout_ms: None,
        }
    }

    /// Attaches an agent name.
    #[inline]
    pub fn with_agent(mut self, agent: impl Into<Arc<str>>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a value count.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_agent(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_agent(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::AgentStarted);
        let b = Event::new(EventKind::AgentCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let ev = Event::new(EventKind::GraceExceeded).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
