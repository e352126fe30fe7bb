//! # AgentBuilder: compose an agent with lifecycle automation.
//!
//! [`AgentBuilder`] assembles an [`Agent`] and a [`Lifecycle`], and returns a [`ManagedAgent`]
//! that applies the policies for you:
//!
//! ```text
//! Agent::builder(behavior)
//!     .with_lifecycle(..) / .with_start(..) / .with_stop(..) / .with_wait(..)
//!     .with_parent(token) / .with_bus(bus)
//!     .build()  ──► StartPolicy::Auto → agent.start()
//!
//! managed.close().await ──► StopPolicy::Auto → stop()
//!                       └─► WaitPolicy::Auto → wait().await
//!
//! drop(managed)         ──► StopPolicy::Auto → stop()
//!                       └─► WaitPolicy::Auto → multi-thread runtime: block_in_place(wait)
//!                                              current-thread runtime: warn, detach
//! ```
//!
//! Prefer `close().await`: teardown in `Drop` cannot await and has to block a thread.

use std::ops::Deref;

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;

use crate::behaviors::BehaviorRef;
use crate::cancel::CancellationToken;
use crate::core::agent::Agent;
use crate::error::AgentError;
use crate::events::Bus;
use crate::policies::{Lifecycle, StartPolicy, StopPolicy, WaitPolicy};

impl Agent {
    /// Starts building an agent running `behavior`.
    pub fn builder(behavior: BehaviorRef) -> AgentBuilder {
        AgentBuilder::new(behavior)
    }
}

/// Builder for a [`ManagedAgent`].
///
/// ## Example
/// ```rust
/// use agentvisor::{Agent, AgentError, AgentStatus, BehaviorFn, CancellationToken, Lifecycle};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), AgentError> {
/// let managed = Agent::builder(BehaviorFn::arc("idle", |token: CancellationToken| async move {
///     token.wait_for_cancellation(None).await;
///     Ok::<(), AgentError>(())
/// }))
/// .with_lifecycle(Lifecycle::auto_all())
/// .build()?;
///
/// assert!(managed.is_started());
/// managed.close().await;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct AgentBuilder {
    behavior: BehaviorRef,
    lifecycle: Lifecycle,
    parent: Option<CancellationToken>,
    bus: Option<Bus>,
}

impl AgentBuilder {
    /// Creates a builder with [`Lifecycle::manual`].
    pub fn new(behavior: BehaviorRef) -> Self {
        Self {
            behavior,
            lifecycle: Lifecycle::manual(),
            parent: None,
            bus: None,
        }
    }

    /// Replaces all three policies.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Sets the start policy.
    pub fn with_start(mut self, start: StartPolicy) -> Self {
        self.lifecycle.start = start;
        self
    }

    /// Sets the stop policy.
    pub fn with_stop(mut self, stop: StopPolicy) -> Self {
        self.lifecycle.stop = stop;
        self
    }

    /// Sets the wait policy.
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.lifecycle.wait = wait;
        self
    }

    /// Cancels the agent whenever `parent` is cancelled.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Publishes lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the agent and applies the start policy.
    ///
    /// ### Errors
    /// Propagates [`Agent::start`] errors when the start policy is `Auto`.
    pub fn build(self) -> Result<ManagedAgent, AgentError> {
        let mut agent = match &self.parent {
            Some(parent) => Agent::with_parent(self.behavior, parent),
            None => Agent::new(self.behavior),
        };
        if let Some(bus) = self.bus {
            agent = agent.with_bus(bus);
        }
        if self.lifecycle.start == StartPolicy::Auto {
            agent.start()?;
        }
        Ok(ManagedAgent {
            agent,
            lifecycle: self.lifecycle,
            closed: false,
        })
    }
}

/// An [`Agent`] with its [`Lifecycle`] applied on `close()` or drop.
///
/// Derefs to [`Agent`], so every manual operation stays available.
pub struct ManagedAgent {
    agent: Agent,
    lifecycle: Lifecycle,
    closed: bool,
}

impl ManagedAgent {
    /// Returns the policies this agent was built with.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Applies the stop policy, then the wait policy.
    pub async fn close(mut self) {
        self.closed = true;
        if self.lifecycle.stop == StopPolicy::Auto {
            self.agent.stop();
        }
        if self.lifecycle.wait == WaitPolicy::Auto {
            self.agent.wait().await;
        }
    }

    fn wait_blocking(&self) {
        if self.agent.is_completed() {
            futures::executor::block_on(self.agent.wait());
            return;
        }
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| futures::executor::block_on(self.agent.wait()));
            }
            Ok(_) => {
                warn!(
                    agent = %self.agent.name(),
                    "cannot block on a current-thread runtime; dropping agent without waiting"
                );
            }
            Err(_) => futures::executor::block_on(self.agent.wait()),
        }
    }
}

impl Deref for ManagedAgent {
    type Target = Agent;

    fn deref(&self) -> &Agent {
        &self.agent
    }
}

impl std::fmt::Debug for ManagedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAgent")
            .field("agent", &self.agent)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl Drop for ManagedAgent {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.lifecycle.stop == StopPolicy::Auto {
            self.agent.stop();
        }
        if self.lifecycle.wait == WaitPolicy::Auto && self.agent.is_started() {
            self.wait_blocking();
        }
    }
}
