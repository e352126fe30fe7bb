//! # agentvisor
//!
//! **Agentvisor** provides cooperative cancellation and long-running workers for tokio.
//!
//! It offers a one-shot cancellation signal, observer tokens, a receive that races a message
//! source against cancellation, and agents that run a body exactly once with a
//! start/stop/wait lifecycle. Draining consumers built on top of them process every message
//! until cancelled and then deal with what is left according to a drain policy.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   CancellationTokenSource ──token()──► CancellationToken ──► SignalChannel (one-shot, sticky)
//!            │                                  │
//!            │ cancel()                         ▼
//!            ▼                      select_receive(source, token)
//!   ┌─────────────────┐                 ├─ Received(v)
//!   │     Agent       │                 └─ Cancelled      (cancellation wins ties)
//!   │  start / stop   │
//!   │  wait / status  │──runs once──► Behavior::run(token)
//!   └────────┬────────┘                   └─ DrainingConsumer: select_receive loop
//!            │                                 ├─ consume(v) fails ─► relink input to OverwriteBuffer
//!            │ publish(Event)                  └─ cancelled ─► DrainPolicy (retain: consume the rest)
//!            ▼
//! ┌────────────────────────────────────────────┐
//! │            Bus (broadcast channel)          │
//! └──────────────────────┬─────────────────────┘
//!                        ▼
//!              AgentGroup listener ──► SubscriberSet ──► worker per subscriber ──► on_event()
//! ```
//!
//! ### Agent lifecycle
//! ```text
//! Created ──start()──► Runnable ──body begins──► Started ──body over──► Completed
//!    └───────────────────stop()─────────────────────► Stopped
//!                                           Stopped / Completed ──wait()──► Waited
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                                 |
//! |-------------------|---------------------------------------------------------------|----------------------------------------------------|
//! | **Cancellation**  | One-shot signal, sources and observer tokens.                 | [`SignalChannel`], [`CancellationTokenSource`]     |
//! | **Receive race**  | Receive a value or observe cancellation, optional timeout.    | [`select_receive`], [`select_receive_timeout`]     |
//! | **Agents**        | Run a body once with start/stop/wait and a status.            | [`Agent`], [`Behavior`], [`BehaviorFn`]            |
//! | **Consumers**     | Consume until cancelled, drain or drop the rest.              | [`DrainingConsumer`], [`Consumer`], [`DrainPolicy`]|
//! | **Lifecycle**     | Automate start/stop/wait on build, close and drop.            | [`AgentBuilder`], [`ManagedAgent`], [`Lifecycle`]  |
//! | **Groups**        | Shared cancellation and graceful shutdown with a grace period.| [`AgentGroup`], [`Config`]                         |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).        | [`Subscribe`], [`Event`]                           |
//! | **Errors**        | Typed errors for lifecycle misuse and shutdown.               | [`AgentError`], [`RuntimeError`]                   |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use agentvisor::{AgentGroup, Buffer, ConsumeError, ConsumerFn, Config, DrainPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config {
//!         drain: DrainPolicy::RetainLastValues,
//!         ..Config::default()
//!     };
//!     let group = AgentGroup::new(cfg, Vec::new());
//!
//!     let jobs = Buffer::unbounded();
//!     group.spawn_consumer(
//!         "worker",
//!         jobs.clone(),
//!         ConsumerFn::new(|job: String| async move {
//!             println!("processing {job}");
//!             Ok::<_, ConsumeError>(())
//!         }),
//!     )?;
//!
//!     for i in 0..3 {
//!         jobs.send(format!("job-{i}")).await;
//!     }
//!
//!     // Every queued job is processed before shutdown returns.
//!     group.shutdown().await?;
//!     assert!(jobs.is_empty());
//!     Ok(())
//! }
//! ```
mod behaviors;
mod cancel;
mod channel;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod util;

// ---- Public re-exports ----

pub use behaviors::{Behavior, BehaviorFn, BehaviorRef, Consumer, ConsumerFn};
pub use cancel::{
    CancellationToken, CancellationTokenSource, Selected, SignalChannel, select_receive,
    select_receive_timeout,
};
pub use channel::{Buffer, OverwriteBuffer, Source, Target};
pub use config::Config;
pub use crate::core::{Agent, AgentBuilder, AgentGroup, AgentStatus, DrainingConsumer, ManagedAgent};
pub use error::{AgentError, ConsumeError, RuntimeError, SelectError};
pub use events::{Bus, Event, EventKind};
pub use policies::{DrainPolicy, Lifecycle, StartPolicy, StopPolicy, WaitPolicy};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
