//! # Function-backed behavior (`BehaviorFn`)
//!
//! [`BehaviorFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`.
//!
//! ## Example
//! ```rust
//! use agentvisor::{AgentError, BehaviorFn, BehaviorRef, CancellationToken};
//!
//! let b: BehaviorRef = BehaviorFn::arc("ticker", |token: CancellationToken| async move {
//!     while !token.is_cancellation_requested() {
//!         tokio::task::yield_now().await;
//!     }
//!     Ok::<_, AgentError>(())
//! });
//!
//! assert_eq!(b.name(), "ticker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::behaviors::behavior::Behavior;
use crate::cancel::CancellationToken;
use crate::error::AgentError;

/// Function-backed behavior.
#[derive(Debug)]
pub struct BehaviorFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> BehaviorFn<F> {
    /// Creates a new function-backed behavior.
    ///
    /// Prefer [`BehaviorFn::arc`] when you immediately need a [`BehaviorRef`](crate::BehaviorRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the behavior and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Behavior for BehaviorFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), AgentError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, token: CancellationToken) -> Result<(), AgentError> {
        (self.f)(token).await
    }
}
