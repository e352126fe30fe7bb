//! # Agent body abstraction.
//!
//! A [`Behavior`] has a stable [`name`](Behavior::name) and an async [`run`](Behavior::run)
//! method that receives a [`CancellationToken`]. The agent calls `run` exactly once.
//!
//! Bodies are expected to check the token regularly (typically through
//! [`select_receive`](crate::select_receive)) and return promptly once cancellation is requested.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancellationToken;
use crate::error::AgentError;

/// Shared handle to a behavior.
pub type BehaviorRef = Arc<dyn Behavior>;

/// # Asynchronous, cancelable agent body.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use agentvisor::{AgentError, Behavior, CancellationToken};
///
/// struct Counter;
///
/// #[async_trait]
/// impl Behavior for Counter {
///     fn name(&self) -> &str { "counter" }
///
///     async fn run(&self, token: CancellationToken) -> Result<(), AgentError> {
///         let mut n = 0u64;
///         while !token.wait_for_cancellation(Some(Duration::from_millis(500))).await {
///             n += 1;
///         }
///         let _ = n;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Behavior: Send + Sync + 'static {
    /// Returns a stable, human-readable name used in events and logs.
    fn name(&self) -> &str;

    /// Runs the body until completion or cancellation.
    ///
    /// Errors and panics are reported as events; they never reach `Agent::wait`.
    async fn run(&self, token: CancellationToken) -> Result<(), AgentError>;
}
