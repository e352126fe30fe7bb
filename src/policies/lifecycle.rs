//! # Lifecycle policies for managed agents.
//!
//! A [`Lifecycle`] bundles three independent choices applied by
//! [`AgentBuilder`](crate::AgentBuilder) and [`ManagedAgent`](crate::ManagedAgent):
//!
//! ```text
//! build()  ──► StartPolicy::Auto  → start() immediately
//! close()  ──► StopPolicy::Auto   → stop()
//!          └─► WaitPolicy::Auto   → wait().await
//! drop     ──► StopPolicy::Auto   → stop()
//!          └─► WaitPolicy::Auto   → block until completed (multi-thread runtime only)
//! ```
//!
//! ## Presets
//! - [`Lifecycle::manual`] every step is explicit (default).
//! - [`Lifecycle::auto_all`] start on build, stop and wait on close/drop.

/// Whether the agent starts when it is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartPolicy {
    /// Start in `build()`.
    Auto,
    /// Caller calls `start()`.
    #[default]
    Manual,
}

/// Whether the agent is stopped on teardown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Fire cancellation on `close()` / drop.
    Auto,
    /// Caller calls `stop()`.
    #[default]
    Manual,
}

/// Whether teardown waits for the body to complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Wait on `close()` / drop.
    Auto,
    /// Caller calls `wait()`.
    #[default]
    Manual,
}

/// Start/stop/wait automation for one agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lifecycle {
    /// Applied by `AgentBuilder::build`.
    pub start: StartPolicy,
    /// Applied on `close()` and drop.
    pub stop: StopPolicy,
    /// Applied on `close()` and drop, after the stop policy.
    pub wait: WaitPolicy,
}

impl Lifecycle {
    /// Every step explicit.
    pub const fn manual() -> Self {
        Self {
            start: StartPolicy::Manual,
            stop: StopPolicy::Manual,
            wait: WaitPolicy::Manual,
        }
    }

    /// Start on build; stop and wait on teardown.
    pub const fn auto_all() -> Self {
        Self {
            start: StartPolicy::Auto,
            stop: StopPolicy::Auto,
            wait: WaitPolicy::Auto,
        }
    }
}
