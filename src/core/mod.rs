//! Runtime core: agents, draining consumers and groups.
//!
//! Internal modules:
//! - [`agent`]: the run-once agent with its start/stop/wait lifecycle and completion guard;
//! - [`builder`]: lifecycle automation (`AgentBuilder`, `ManagedAgent`);
//! - [`draining`]: consume-until-cancelled behavior with drain policy and failure isolation;
//! - [`group`]: shared cancellation, subscriber fan-out and graceful shutdown.

mod agent;
mod builder;
mod draining;
mod group;

pub use agent::{Agent, AgentStatus};
pub use builder::{AgentBuilder, ManagedAgent};
pub use draining::DrainingConsumer;
pub use group::AgentGroup;
