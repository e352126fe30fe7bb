//! # User-supplied work.
//!
//! This module provides the contracts user code implements:
//! - [`Behavior`] - the body an [`Agent`](crate::Agent) runs exactly once
//! - [`BehaviorFn`] - closure-backed behavior
//! - [`BehaviorRef`] - shared reference to a behavior (`Arc<dyn Behavior>`)
//! - [`Consumer`] - per-value action of a [`DrainingConsumer`](crate::DrainingConsumer)
//! - [`ConsumerFn`] - closure-backed consumer

mod behavior;
mod behavior_fn;
mod consumer;

pub use behavior::{Behavior, BehaviorRef};
pub use behavior_fn::BehaviorFn;
pub use consumer::{Consumer, ConsumerFn};
