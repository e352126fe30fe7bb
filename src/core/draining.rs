//! # DrainingConsumer: consume every message until cancelled, then drain.
//!
//! A [`DrainingConsumer`] is a [`Behavior`] that feeds every value of a [`Source`] to a
//! [`Consumer`]. Run it inside an [`Agent`](crate::Agent).
//!
//! ## Flow
//! ```text
//! loop {
//!   select_receive(source, token)
//!     ├─ Received(v) ─► consumer.consume(v)
//!     │                   └─ Err / panic ─► isolate() ─► return Ok
//!     └─ Cancelled   ─► break
//! }
//! DrainPolicy::RetainLastValues ─► while let Some(v) = source.try_recv() { consume(v) }
//! DrainPolicy::DropLastValues   ─► nothing
//!
//! isolate():
//!   publish ConsumerFailed
//!   source.relink(fresh OverwriteBuffer)   (producers never park on a dead consumer)
//!   publish ChannelRelinked
//! ```
//!
//! ## Rules
//! - Values buffered when cancellation is observed are consumed in FIFO order under
//!   `RetainLastValues`.
//! - A failing consumer is never called again; the failure does not escape the agent.
//! - Each consumer owns its discard sink; nothing is shared between consumers.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::behaviors::{Behavior, Consumer};
use crate::cancel::{CancellationToken, Selected, select_receive};
use crate::channel::{OverwriteBuffer, Source};
use crate::error::AgentError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::DrainPolicy;
use crate::util::panic_message;

/// Behavior consuming a source until cancelled, with a drain policy and failure isolation.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use agentvisor::{Agent, AgentError, Buffer, ConsumeError, ConsumerFn, DrainPolicy, DrainingConsumer};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), AgentError> {
/// let input = Buffer::unbounded();
/// let printer = DrainingConsumer::new(
///     "printer",
///     input.clone(),
///     ConsumerFn::new(|v: i32| async move {
///         println!("handling {v}");
///         Ok::<_, ConsumeError>(())
///     }),
///     DrainPolicy::RetainLastValues,
/// );
///
/// let agent = Agent::new(Arc::new(printer));
/// agent.start()?;
/// for i in 0..10 {
///     input.send(i).await;
/// }
/// agent.stop_and_wait().await;
/// assert!(input.is_empty());
/// # Ok(())
/// # }
/// ```
pub struct DrainingConsumer<T> {
    name: Cow<'static, str>,
    source: Arc<dyn Source<T>>,
    consumer: Arc<dyn Consumer<T>>,
    policy: DrainPolicy,
    bus: Option<Bus>,
    sink: Mutex<Option<Arc<OverwriteBuffer<T>>>>,
}

impl<T: Send + 'static> DrainingConsumer<T> {
    /// Creates a draining consumer reading from `source`.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        source: impl Source<T> + 'static,
        consumer: impl Consumer<T>,
        policy: DrainPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            source: Arc::new(source),
            consumer: Arc::new(consumer),
            policy,
            bus: None,
            sink: Mutex::new(None),
        }
    }

    /// Publishes failure and drain events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the configured drain policy.
    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }

    /// Returns the discard sink the input was relinked to, once the consumer failed.
    pub fn sink(&self) -> Option<Arc<OverwriteBuffer<T>>> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `true` once the consumer failed and the input was relinked.
    pub fn has_failed(&self) -> bool {
        self.sink().is_some()
    }

    /// Runs `consume`, turning errors and panics into a failure message.
    async fn consume_guarded(&self, value: T) -> Result<(), String> {
        match std::panic::AssertUnwindSafe(self.consumer.consume(value))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(panic) => Err(format!(
                "consumer panicked: {}",
                panic_message(panic.as_ref())
            )),
        }
    }

    /// Ends consumption for good: relinks the input to a fresh discard sink.
    fn isolate(&self, reason: String) {
        warn!(consumer = %self.name, error = %reason, "consumer failed; relinking its input");
        self.publish(Event::new(EventKind::ConsumerFailed).with_reason(reason));

        let sink = Arc::new(OverwriteBuffer::new());
        self.source.relink(sink.clone());
        let moved = sink.offered();
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);

        self.publish(Event::new(EventKind::ChannelRelinked).with_count(moved));
    }

    /// Consumes whatever is still buffered; returns how many values were consumed.
    async fn drain(&self) -> Result<u64, String> {
        let mut drained = 0u64;
        while let Some(value) = self.source.try_recv() {
            self.consume_guarded(value).await?;
            drained += 1;
        }
        Ok(drained)
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev.with_agent(self.name.as_ref()));
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Behavior for DrainingConsumer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, token: CancellationToken) -> Result<(), AgentError> {
        while let Selected::Received(value) = select_receive(self.source.as_ref(), &token).await {
            if let Err(reason) = self.consume_guarded(value).await {
                self.isolate(reason);
                return Ok(());
            }
        }

        let drained = if self.policy.retains() {
            match self.drain().await {
                Ok(n) => n,
                Err(reason) => {
                    self.isolate(reason);
                    return Ok(());
                }
            }
        } else {
            0
        };
        debug!(consumer = %self.name, drained, "consumer drained");
        self.publish(Event::new(EventKind::DrainFinished).with_count(drained));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::ConsumerFn;
    use crate::channel::Buffer;
    use crate::core::agent::{Agent, AgentStatus};
    use crate::error::ConsumeError;
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<i32>>>;

    fn recorder(seen: &Seen, fail_on: Option<i32>) -> impl Consumer<i32> {
        let seen = Arc::clone(seen);
        ConsumerFn::new(move |v: i32| {
            let seen = Arc::clone(&seen);
            async move {
                if Some(v) == fail_on {
                    return Err(ConsumeError::rejected(format!("cannot handle {v}")));
                }
                seen.lock().expect("poisoned").push(v);
                Ok(())
            }
        })
    }

    fn consumer_agent(
        input: &Buffer<i32>,
        seen: &Seen,
        fail_on: Option<i32>,
        policy: DrainPolicy,
    ) -> (Arc<DrainingConsumer<i32>>, Agent) {
        let dc = Arc::new(DrainingConsumer::new(
            "recorder",
            input.clone(),
            recorder(seen, fail_on),
            policy,
        ));
        let agent = Agent::new(dc.clone());
        (dc, agent)
    }

    #[tokio::test]
    async fn test_consumes_while_running() {
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let (_dc, agent) = consumer_agent(&input, &seen, None, DrainPolicy::RetainLastValues);
        agent.start().expect("start failed");

        for i in 0..5 {
            input.send(i).await;
        }
        while seen.lock().expect("poisoned").len() < 5 {
            tokio::task::yield_now().await;
        }
        agent.stop_and_wait().await;
        assert_eq!(*seen.lock().expect("poisoned"), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_retain_drains_values_sent_before_cancel() {
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let (_dc, agent) = consumer_agent(&input, &seen, None, DrainPolicy::RetainLastValues);

        // Cancelled before the body ever observes the values.
        agent.stop();
        for i in 1..=3 {
            input.send(i).await;
        }
        agent.start().expect("start failed");
        agent.wait().await;

        assert_eq!(*seen.lock().expect("poisoned"), vec![1, 2, 3]);
        assert!(input.is_empty());
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_drop_policy_consumes_a_prefix_at_most_once() {
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let (_dc, agent) = consumer_agent(&input, &seen, None, DrainPolicy::DropLastValues);
        agent.start().expect("start failed");

        for i in 1..=3 {
            input.send(i).await;
        }
        tokio::time::timeout(Duration::from_secs(1), agent.stop_and_wait())
            .await
            .expect("consumer hung");

        let seen = seen.lock().expect("poisoned").clone();
        assert!(seen.len() <= 3);
        assert_eq!(seen, (1..=seen.len() as i32).collect::<Vec<_>>());
        assert_eq!(input.len() + seen.len(), 3);
    }

    #[tokio::test]
    async fn test_drop_policy_leaves_buffer_untouched_when_cancelled_first() {
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let (_dc, agent) = consumer_agent(&input, &seen, None, DrainPolicy::DropLastValues);

        agent.stop();
        for i in 1..=3 {
            input.send(i).await;
        }
        agent.start().expect("start failed");
        agent.wait().await;

        assert!(seen.lock().expect("poisoned").is_empty());
        assert_eq!(input.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_relinks_input_and_completes() {
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let (dc, agent) = consumer_agent(&input, &seen, Some(2), DrainPolicy::RetainLastValues);
        agent.start().expect("start failed");

        for i in 1..=3 {
            input.send(i).await;
        }
        while !agent.is_completed() {
            tokio::task::yield_now().await;
        }
        assert_eq!(agent.status(), AgentStatus::Completed);
        assert!(dc.has_failed());

        tokio::time::timeout(Duration::from_millis(100), input.send(4))
            .await
            .expect("producer blocked after consumer failure");

        assert_eq!(*seen.lock().expect("poisoned"), vec![1]);
        let sink = dc.sink().expect("no sink after failure");
        assert_eq!(sink.peek(), Some(4));
        assert!(input.is_empty());

        agent.wait().await;
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_failure_unblocks_producer_on_bounded_input() {
        let input = Buffer::bounded(1);
        let seen = Seen::default();
        let (dc, agent) = consumer_agent(&input, &seen, Some(1), DrainPolicy::RetainLastValues);
        agent.start().expect("start failed");

        input.send(1).await;
        for i in 2..=5 {
            tokio::time::timeout(Duration::from_secs(1), input.send(i))
                .await
                .expect("producer parked forever");
        }
        agent.wait().await;

        assert!(seen.lock().expect("poisoned").is_empty());
        assert_eq!(dc.sink().and_then(|s| s.peek()), Some(5));
    }

    #[tokio::test]
    async fn test_failure_while_draining_relinks() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let dc = Arc::new(
            DrainingConsumer::new(
                "drainer",
                input.clone(),
                recorder(&seen, Some(2)),
                DrainPolicy::RetainLastValues,
            )
            .with_bus(bus),
        );
        let agent = Agent::new(dc.clone());

        agent.stop();
        for i in 1..=3 {
            input.send(i).await;
        }
        agent.start().expect("start failed");
        agent.wait().await;

        assert_eq!(*seen.lock().expect("poisoned"), vec![1]);
        assert!(dc.has_failed());
        assert_eq!(dc.sink().and_then(|s| s.peek()), Some(3));

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::ConsumerFailed, EventKind::ChannelRelinked]
        );
    }

    #[tokio::test]
    async fn test_panicking_consumer_is_isolated() {
        let input = Buffer::unbounded();
        let dc = Arc::new(DrainingConsumer::new(
            "panicky",
            input.clone(),
            ConsumerFn::new(|v: i32| async move {
                if v == 7 {
                    panic!("cannot handle seven");
                }
                Ok::<_, ConsumeError>(())
            }),
            DrainPolicy::RetainLastValues,
        ));
        let agent = Agent::new(dc.clone());
        agent.start().expect("start failed");

        input.send(7).await;
        tokio::time::timeout(Duration::from_secs(1), agent.wait())
            .await
            .expect("agent hung after consumer panic");

        assert!(dc.has_failed());
        input.send(8).await;
        assert_eq!(dc.sink().and_then(|s| s.peek()), Some(8));
    }

    #[tokio::test]
    async fn test_drain_event_reports_count() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let input = Buffer::unbounded();
        let seen = Seen::default();
        let dc = DrainingConsumer::new(
            "counter",
            input.clone(),
            recorder(&seen, None),
            DrainPolicy::RetainLastValues,
        )
        .with_bus(bus);
        let agent = Agent::new(Arc::new(dc));

        agent.stop();
        input.send(1).await;
        input.send(2).await;
        agent.start().expect("start failed");
        agent.wait().await;

        let drained = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::DrainFinished)
            .expect("no drain event");
        assert_eq!(drained.count, Some(2));
        assert_eq!(drained.agent.as_deref(), Some("counter"));
    }
}
