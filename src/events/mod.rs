//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by agents, draining consumers, groups
//! and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Agent` (lifecycle), `DrainingConsumer` (failure/drain),
//!   `AgentGroup` (shutdown), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the `AgentGroup` listener fanning out to a `SubscriberSet`,
//!   or any caller of [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
