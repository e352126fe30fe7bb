//! # AgentGroup: shared cancellation, event fan-out and graceful shutdown.
//!
//! The [`AgentGroup`] owns the event bus, a [`SubscriberSet`] and a group-level
//! [`CancellationTokenSource`]. Every agent it spawns is cancelled through a child of the
//! group's signal, so one `cancel()` stops them all.
//!
//! ## Architecture
//! ```text
//! AgentGroup::new(cfg, subscribers)
//!   Bus::new(cfg.bus_capacity) ─► listener: Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!
//! spawn(behavior) / spawn_consumer(name, source, consumer)
//!   Agent::builder(behavior)
//!       .with_parent(group token)       (child signal)
//!       .with_bus(bus)
//!       .with_lifecycle(cfg.lifecycle, start = Auto)
//!       .build()
//!
//! shutdown()
//!   └─► cancel()                  → Bus.publish(ShutdownRequested), group signal fires
//!   └─► timeout(cfg.grace, wait_all()):
//!          ├─ Ok       → Bus.publish(AllStoppedWithin)
//!          └─ Elapsed  → Bus.publish(GraceExceeded), Err(RuntimeError::GraceExceeded { stuck })
//!   └─► stop listener (forwards pending events) → SubscriberSet::shutdown() drains every queue
//! ```
//!
//! Events published after `shutdown()` returns are no longer delivered to subscribers.
//!
//! ## Example
//! ```rust
//! use agentvisor::{AgentError, AgentGroup, BehaviorFn, CancellationToken, Config};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let group = AgentGroup::new(Config::default(), Vec::new());
//!
//! for name in ["alpha", "beta"] {
//!     group.spawn(BehaviorFn::arc(name, |token: CancellationToken| async move {
//!         token.wait_for_cancellation(None).await;
//!         Ok::<(), AgentError>(())
//!     }))?;
//! }
//!
//! group.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::behaviors::{BehaviorRef, Consumer};
use crate::cancel::{CancellationToken, CancellationTokenSource, SignalChannel};
use crate::channel::Source;
use crate::config::Config;
use crate::core::agent::{Agent, AgentStatus};
use crate::core::builder::ManagedAgent;
use crate::core::draining::DrainingConsumer;
use crate::error::{AgentError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::StartPolicy;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Group of agents sharing one cancellation signal and one event bus.
pub struct AgentGroup {
    cfg: Config,
    bus: Bus,
    listener: Mutex<Option<JoinHandle<SubscriberSet>>>,
    listener_stop: Arc<SignalChannel>,
    source: CancellationTokenSource,
    agents: Mutex<Vec<Arc<ManagedAgent>>>,
    shutdown_requested: AtomicBool,
}

impl AgentGroup {
    /// Creates a group and starts forwarding bus events to `subscribers`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(subscribers, bus.clone());
        let listener_stop = Arc::new(SignalChannel::new());
        let listener = (!subs.is_empty())
            .then(|| subscriber_listener(&bus, subs, Arc::clone(&listener_stop)));

        Self {
            cfg,
            bus,
            listener: Mutex::new(listener),
            listener_stop,
            source: CancellationTokenSource::new(),
            agents: Mutex::new(Vec::new()),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// Returns the group's event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the group configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Mints a token bound to the group's signal.
    pub fn token(&self) -> CancellationToken {
        self.source.token()
    }

    /// Cancels every agent of the group. Idempotent.
    pub fn cancel(&self) {
        if !self.shutdown_requested.swap(true, Ordering::AcqRel) {
            info!(agents = self.len(), "group shutdown requested");
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
        }
        self.source.cancel();
    }

    /// Builds and starts an agent cancelled with the group.
    ///
    /// The agent inherits `Config::lifecycle` for teardown; it is always started.
    ///
    /// ### Errors
    /// Propagates [`Agent::start`] errors.
    pub fn spawn(&self, behavior: BehaviorRef) -> Result<Arc<ManagedAgent>, AgentError> {
        let managed = Agent::builder(behavior)
            .with_lifecycle(self.cfg.lifecycle)
            .with_start(StartPolicy::Auto)
            .with_parent(self.token())
            .with_bus(self.bus.clone())
            .build()?;

        let managed = Arc::new(managed);
        self.agents().push(Arc::clone(&managed));
        Ok(managed)
    }

    /// Spawns a [`DrainingConsumer`] using the group's drain policy.
    ///
    /// ### Errors
    /// Propagates [`Agent::start`] errors.
    pub fn spawn_consumer<T: Send + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
        source: impl Source<T> + 'static,
        consumer: impl Consumer<T>,
    ) -> Result<Arc<ManagedAgent>, AgentError> {
        let behavior = DrainingConsumer::new(name, source, consumer, self.cfg.drain)
            .with_bus(self.bus.clone());
        self.spawn(Arc::new(behavior))
    }

    /// Number of agents spawned so far.
    pub fn len(&self) -> usize {
        self.agents().len()
    }

    /// Returns `true` if no agent was spawned.
    pub fn is_empty(&self) -> bool {
        self.agents().is_empty()
    }

    /// Snapshot of `(name, status)` for every agent, in spawn order.
    pub fn statuses(&self) -> Vec<(String, AgentStatus)> {
        self.agents()
            .iter()
            .map(|a| (a.name().to_string(), a.status()))
            .collect()
    }

    /// Waits for every agent spawned so far.
    pub async fn wait_all(&self) {
        let agents = self.agents().clone();
        for agent in agents {
            agent.wait().await;
        }
    }

    /// Cancels the group and waits up to `Config::grace` for every agent to complete.
    ///
    /// Subscribers are then drained: every event published so far, including the final
    /// `AllStoppedWithin` or `GraceExceeded`, has been handled when this returns.
    ///
    /// ### Errors
    /// [`RuntimeError::GraceExceeded`] naming the agents still running at the deadline.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.cancel();

        let grace = self.cfg.grace;
        let outcome = match tokio::time::timeout(grace, self.wait_all()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck: Vec<String> = self
                    .agents()
                    .iter()
                    .filter(|a| !a.is_completed())
                    .map(|a| a.name().to_string())
                    .collect();
                warn!(?grace, ?stuck, "grace period exceeded");
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_timeout(grace)
                        .with_reason(stuck.join(", ")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };
        self.close_subscribers().await;
        outcome
    }

    /// Stops the listener once it forwarded everything pending, then drains subscriber queues.
    async fn close_subscribers(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(listener) = listener else {
            return;
        };
        self.listener_stop.fire();
        match listener.await {
            Ok(set) => set.shutdown().await,
            Err(err) => warn!(error = %err, "subscriber listener did not finish cleanly"),
        }
    }

    fn agents(&self) -> std::sync::MutexGuard<'_, Vec<Arc<ManagedAgent>>> {
        self.agents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AgentGroup {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            listener.abort();
        }
    }
}

/// Subscribes to the bus and forwards events to the subscriber set until `stop` fires.
///
/// Events already on the bus when `stop` fires are still forwarded. The set is handed back
/// so its queues can be drained; aborting the listener instead drops the set.
fn subscriber_listener(
    bus: &Bus,
    set: SubscriberSet,
    stop: Arc<SignalChannel>,
) -> JoinHandle<SubscriberSet> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.wait_observe(None) => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
        set
    })
}
