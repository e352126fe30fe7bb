//! # Agent: a cancellable, run-once unit of long-running work.
//!
//! An [`Agent`] owns a [`CancellationTokenSource`] and runs a [`Behavior`](crate::Behavior) exactly once on the
//! tokio runtime. It exposes `start` / `stop` / `wait` / `stop_and_wait` and a [`status`](Agent::status).
//!
//! ## Lifecycle
//! ```text
//! Created ──start()──► Runnable ──(body begins)──► Started ──(body returns/fails/panics)──► Completed
//!    │                    │                           │                                       │
//!    └────────────────────┴──────────stop()───────────┴──────────► Stopped                    │
//!                                                                     │                       │
//!                                                                     └──────wait()──► Waited ◄┘
//! ```
//!
//! ## Rules
//! - `start()` schedules the body and returns immediately; `Started` is set by the body itself.
//! - `stop()` only fires cancellation; it never blocks. Calling it N times equals calling it once.
//! - `wait()` parks until the body is over; later waits return immediately.
//! - A completion guard around the body sets `Completed` and fires the completion signal
//!   whether the body returns `Ok`, `Err` or panics, so `wait()` never hangs on a failed body.
//! - Body errors and panics are published as events and never surface from `wait()`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::behaviors::BehaviorRef;
use crate::cancel::{CancellationToken, CancellationTokenSource, SignalChannel};
use crate::error::AgentError;
use crate::events::{Bus, Event, EventKind};
use crate::util::panic_message;

/// Observable lifecycle state of an [`Agent`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentStatus {
    /// Built, not started.
    Created = 0,
    /// `start()` called; the body has not begun yet.
    Runnable = 1,
    /// The body is running.
    Started = 2,
    /// The body is over (returned, failed or panicked).
    Completed = 3,
    /// `stop()` called.
    Stopped = 4,
    /// A caller finished `wait()`.
    Waited = 5,
}

impl AgentStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => AgentStatus::Created,
            1 => AgentStatus::Runnable,
            2 => AgentStatus::Started,
            3 => AgentStatus::Completed,
            4 => AgentStatus::Stopped,
            _ => AgentStatus::Waited,
        }
    }
}

/// Atomic storage for [`AgentStatus`], shared between the agent and its body task.
#[derive(Debug)]
struct StatusCell(AtomicU8);

impl StatusCell {
    fn new(status: AgentStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    fn load(&self) -> AgentStatus {
        AgentStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from → to`; returns `false` if the current state is not `from`.
    fn transition(&self, from: AgentStatus, to: AgentStatus) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Sets `to` unless the current state is `Waited`; returns the previous state.
    fn set_unless_waited(&self, to: AgentStatus) -> AgentStatus {
        let prev = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (AgentStatus::from_u8(raw) != AgentStatus::Waited).then_some(to as u8)
            })
            .unwrap_or_else(|raw| raw);
        AgentStatus::from_u8(prev)
    }
}

/// Fires the completion signal when the body future finishes or is dropped.
struct CompletionGuard {
    name: Arc<str>,
    status: Arc<StatusCell>,
    done: Arc<SignalChannel>,
    bus: Option<Bus>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.status.set_unless_waited(AgentStatus::Completed);
        if let Some(bus) = &self.bus {
            bus.publish(Event::new(EventKind::AgentCompleted).with_agent(Arc::clone(&self.name)));
        }
        self.done.fire();
    }
}

/// Long-running worker with a start/stop/wait lifecycle.
///
/// ## Example
/// ```rust
/// use agentvisor::{Agent, AgentError, AgentStatus, BehaviorFn, CancellationToken};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), AgentError> {
/// let agent = Agent::new(BehaviorFn::arc("idle", |token: CancellationToken| async move {
///     token.wait_for_cancellation(None).await;
///     Ok::<(), AgentError>(())
/// }));
///
/// agent.start()?;
/// agent.stop_and_wait().await;
/// assert_eq!(agent.status(), AgentStatus::Waited);
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    name: Arc<str>,
    behavior: BehaviorRef,
    source: CancellationTokenSource,
    status: Arc<StatusCell>,
    done: Arc<SignalChannel>,
    started: AtomicBool,
    stop_requested: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
    bus: Option<Bus>,
}

impl Agent {
    /// Creates an agent with its own cancellation source.
    pub fn new(behavior: BehaviorRef) -> Self {
        Self::with_source(behavior, CancellationTokenSource::new())
    }

    /// Creates an agent that is also cancelled when `parent` is cancelled.
    ///
    /// Stopping this agent never cancels the parent.
    pub fn with_parent(behavior: BehaviorRef, parent: &CancellationToken) -> Self {
        Self::with_source(behavior, CancellationTokenSource::child_of(parent))
    }

    fn with_source(behavior: BehaviorRef, source: CancellationTokenSource) -> Self {
        Self {
            name: Arc::from(behavior.name()),
            behavior,
            source,
            status: Arc::new(StatusCell::new(AgentStatus::Created)),
            done: Arc::new(SignalChannel::new()),
            started: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            handle: Mutex::new(None),
            bus: None,
        }
    }

    /// Publishes lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns the behavior name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current lifecycle state.
    pub fn status(&self) -> AgentStatus {
        self.status.load()
    }

    /// Mints a token bound to this agent's cancellation source.
    pub fn token(&self) -> CancellationToken {
        self.source.token()
    }

    /// Returns `true` once `start()` succeeded.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Returns `true` once the body is over.
    pub fn is_completed(&self) -> bool {
        self.done.try_observe()
    }

    /// Schedules the body on the current tokio runtime.
    ///
    /// ### Errors
    /// - [`AgentError::AlreadyStarted`] if called twice.
    /// - [`AgentError::NoRuntime`] outside of a tokio runtime.
    ///
    /// ### Notes
    /// Starting an agent that was already stopped is allowed: the body runs with a
    /// cancelled token and the status stays `Stopped`.
    pub fn start(&self) -> Result<(), AgentError> {
        let runtime = Handle::try_current().map_err(|_| AgentError::NoRuntime)?;
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(AgentError::AlreadyStarted {
                name: self.name.to_string(),
            });
        }
        self.status.transition(AgentStatus::Created, AgentStatus::Runnable);

        let guard = CompletionGuard {
            name: Arc::clone(&self.name),
            status: Arc::clone(&self.status),
            done: Arc::clone(&self.done),
            bus: self.bus.clone(),
        };
        let body = run_body(Arc::clone(&self.behavior), self.source.token(), guard);
        let handle = runtime.spawn(body);
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Requests cancellation of the body. Never blocks; idempotent.
    ///
    /// Legal before `start()`.
    pub fn stop(&self) {
        self.source.cancel();
        self.status.set_unless_waited(AgentStatus::Stopped);

        if !self.stop_requested.swap(true, Ordering::AcqRel) {
            debug!(agent = %self.name, "stop requested");
            self.publish(EventKind::StopRequested);
        }
    }

    /// Parks until the body is over, then sets `Waited`.
    ///
    /// Subsequent calls return immediately. Waiting on an agent that was never started
    /// returns immediately: a stopped agent becomes `Waited`, a fresh one stays `Created`.
    pub async fn wait(&self) {
        if !self.is_started() {
            if self.status.load() == AgentStatus::Created {
                warn!(agent = %self.name, "wait called on an agent that was never started");
            } else {
                self.mark_waited();
            }
            return;
        }
        self.done.wait_observe(None).await;

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                debug!(agent = %self.name, error = %err, "agent task did not finish cleanly");
            }
        }

        self.mark_waited();
    }

    fn mark_waited(&self) {
        if self.status.set_unless_waited(AgentStatus::Waited) != AgentStatus::Waited {
            self.publish(EventKind::AgentWaited);
        }
    }

    /// `stop()` followed by `wait()`.
    pub async fn stop_and_wait(&self) {
        self.stop();
        self.wait().await;
    }

    fn publish(&self, kind: EventKind) {
        if let Some(bus) = &self.bus {
            bus.publish(Event::new(kind).with_agent(Arc::clone(&self.name)));
        }
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        if self.is_started() && !self.is_completed() {
            warn!(agent = %self.name, "agent dropped while running; cancelling it");
            self.source.cancel();
        }
    }
}

/// Runs the behavior once under the completion guard.
async fn run_body(behavior: BehaviorRef, token: CancellationToken, guard: CompletionGuard) {
    if guard.status.transition(AgentStatus::Runnable, AgentStatus::Started) {
        debug!(agent = %guard.name, "agent started");
    }
    if let Some(bus) = &guard.bus {
        bus.publish(Event::new(EventKind::AgentStarted).with_agent(Arc::clone(&guard.name)));
    }

    let outcome = std::panic::AssertUnwindSafe(behavior.run(token))
        .catch_unwind()
        .await;

    let failure = match outcome {
        Ok(Ok(())) | Ok(Err(AgentError::Canceled)) => None,
        Ok(Err(err)) => {
            warn!(agent = %guard.name, error = %err, "agent body failed");
            Some((EventKind::AgentFailed, err.to_string()))
        }
        Err(panic) => {
            let info = panic_message(panic.as_ref());
            warn!(agent = %guard.name, panic = %info, "agent body panicked");
            Some((EventKind::AgentPanicked, info))
        }
    };
    if let (Some((kind, reason)), Some(bus)) = (failure, &guard.bus) {
        bus.publish(
            Event::new(kind)
                .with_agent(Arc::clone(&guard.name))
                .with_reason(reason),
        );
    }
    drop(guard);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::BehaviorFn;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn idle(name: &'static str) -> BehaviorRef {
        BehaviorFn::arc(name, |token: CancellationToken| async move {
            token.wait_for_cancellation(None).await;
            Ok::<(), AgentError>(())
        })
    }

    #[tokio::test]
    async fn test_lifecycle_statuses() {
        let agent = Agent::new(idle("idle"));
        assert_eq!(agent.status(), AgentStatus::Created);

        agent.start().expect("start failed");
        assert!(matches!(
            agent.status(),
            AgentStatus::Runnable | AgentStatus::Started
        ));

        tokio::task::yield_now().await;
        assert_eq!(agent.status(), AgentStatus::Started);

        agent.stop();
        assert_eq!(agent.status(), AgentStatus::Stopped);

        agent.wait().await;
        assert_eq!(agent.status(), AgentStatus::Waited);
        assert!(agent.is_completed());
    }

    #[tokio::test]
    async fn test_body_returning_sets_completed() {
        let agent = Agent::new(BehaviorFn::arc("once", |_token: CancellationToken| async {
            Ok::<(), AgentError>(())
        }));
        agent.start().expect("start failed");

        agent.done.wait_observe(None).await;
        assert_eq!(agent.status(), AgentStatus::Completed);

        agent.wait().await;
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let agent = Agent::new(idle("twice"));
        agent.start().expect("start failed");

        let err = agent.start().expect_err("second start accepted");
        assert_eq!(err.as_label(), "agent_already_started");
        agent.stop_and_wait().await;
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let agent = Agent::new(idle("orphan"));
        let err = agent.start().expect_err("started without runtime");
        assert!(matches!(err, AgentError::NoRuntime));
        assert_eq!(agent.status(), AgentStatus::Created);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let agent = Agent::new(idle("stopper")).with_bus(bus);
        agent.start().expect("start failed");

        for _ in 0..5 {
            agent.stop();
        }
        agent.wait().await;

        let mut stops = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::StopRequested {
                stops += 1;
            }
        }
        assert_eq!(stops, 1);
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_second_wait_returns_immediately() {
        let agent = Agent::new(idle("waiter"));
        agent.start().expect("start failed");
        agent.stop_and_wait().await;

        tokio::time::timeout(Duration::from_millis(50), agent.wait())
            .await
            .expect("second wait blocked");
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_all_return() {
        let agent = Arc::new(Agent::new(idle("shared")));
        agent.start().expect("start failed");

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let a = Arc::clone(&agent);
            waiters.push(tokio::spawn(async move { a.wait().await }));
        }
        tokio::task::yield_now().await;
        agent.stop();

        for w in waiters {
            w.await.expect("waiter panicked");
        }
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_wait_on_unstarted_agent_does_not_hang() {
        let agent = Agent::new(idle("never"));
        tokio::time::timeout(Duration::from_millis(50), agent.wait())
            .await
            .expect("wait blocked");
        assert_eq!(agent.status(), AgentStatus::Created);
    }

    #[tokio::test]
    async fn test_wait_after_stop_without_start_sets_waited() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let agent = Agent::new(idle("parked")).with_bus(bus);

        agent.stop();
        tokio::time::timeout(Duration::from_millis(50), agent.wait())
            .await
            .expect("wait blocked");
        assert_eq!(agent.status(), AgentStatus::Waited);

        agent.wait().await;
        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::StopRequested, EventKind::AgentWaited]);
    }

    #[tokio::test]
    async fn test_stop_before_start_runs_cancelled_body() {
        let runs = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&runs);
        let agent = Agent::new(BehaviorFn::arc("late", move |token: CancellationToken| {
            let seen = Arc::clone(&seen);
            async move {
                if token.is_cancellation_requested() {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok::<(), AgentError>(())
            }
        }));

        agent.stop();
        assert_eq!(agent.status(), AgentStatus::Stopped);

        agent.start().expect("start failed");
        agent.wait().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(agent.status(), AgentStatus::Waited);
    }

    #[tokio::test]
    async fn test_failing_body_still_completes() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let agent = Agent::new(BehaviorFn::arc("failing", |_token: CancellationToken| async {
            Err::<(), _>(AgentError::Failed {
                error: "boom".into(),
            })
        }))
        .with_bus(bus);

        agent.start().expect("start failed");
        agent.wait().await;
        assert_eq!(agent.status(), AgentStatus::Waited);

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|ev| ev.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::AgentStarted,
                EventKind::AgentFailed,
                EventKind::AgentCompleted,
                EventKind::AgentWaited,
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_body_still_completes() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let agent = Agent::new(BehaviorFn::arc("panicky", |_token: CancellationToken| async {
            let explode = true;
            if explode {
                panic!("body exploded");
            }
            Ok::<(), AgentError>(())
        }))
        .with_bus(bus);

        agent.start().expect("start failed");
        tokio::time::timeout(Duration::from_secs(1), agent.wait())
            .await
            .expect("wait hung on panicking body");

        let panicked = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|ev| ev.kind == EventKind::AgentPanicked)
            .expect("no panic event");
        assert_eq!(panicked.reason.as_deref(), Some("body exploded"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_source_cancels_ten_agents() {
        let group = CancellationTokenSource::new();
        let agents: Vec<_> = (0..10)
            .map(|_| Agent::with_parent(idle("member"), &group.token()))
            .collect();
        for agent in &agents {
            agent.start().expect("start failed");
        }

        group.cancel();

        for agent in &agents {
            tokio::time::timeout(Duration::from_secs(2), agent.wait())
                .await
                .expect("agent did not observe cancellation");
            assert_eq!(agent.status(), AgentStatus::Waited);
        }
    }
}
