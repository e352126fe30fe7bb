//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for an [`AgentGroup`](crate::AgentGroup).
//!
//! Config is used in two ways:
//! 1. **Group creation**: `AgentGroup::new(config, subscribers)`
//! 2. **Defaults**: agents spawned by the group inherit `lifecycle`, consumers built with
//!    `AgentGroup::spawn_consumer` inherit `drain`.
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown does not wait; agents still running are reported stuck.

use std::time::Duration;

use crate::policies::{DrainPolicy, Lifecycle};

/// Configuration for a group of agents.
///
/// ## Field semantics
/// - `grace`: Maximum wait for agents to complete after group cancellation
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `drain`: Default drain policy for consumers spawned by the group
/// - `lifecycle`: Default stop/wait automation for agents spawned by the group
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for agents to complete once the group is cancelled.
    ///
    /// If exceeded, `AgentGroup::shutdown` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers lagging more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Default drain policy for consumers spawned by the group.
    pub drain: DrainPolicy,

    /// Default lifecycle automation for agents spawned by the group.
    ///
    /// Group agents are always started on spawn; `stop`/`wait` apply when the group is dropped.
    pub lifecycle: Lifecycle,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `drain = DrainPolicy::RetainLastValues`
    /// - `lifecycle = Lifecycle::manual()`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            drain: DrainPolicy::default(),
            lifecycle: Lifecycle::manual(),
        }
    }
}
