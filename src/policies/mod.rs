//! Configuration choices for agents and consumers.
//!
//! ## Contents
//! - [`DrainPolicy`] what a draining consumer does with values left after cancellation
//! - [`Lifecycle`] with [`StartPolicy`], [`StopPolicy`], [`WaitPolicy`] automation of
//!   start/stop/wait for managed agents
//!
//! ## Defaults
//! - `DrainPolicy::RetainLastValues` (no buffered value is lost).
//! - `Lifecycle::manual()` (nothing happens implicitly).

mod drain;
mod lifecycle;

pub use drain::DrainPolicy;
pub use lifecycle::{Lifecycle, StartPolicy, StopPolicy, WaitPolicy};
