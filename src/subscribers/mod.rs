//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! optional [`LogWriter`] for events broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Agent ── publish(Event) ──► Bus ──► AgentGroup listener ──► SubscriberSet::emit(&Event)
//!                                                                  │
//!                                                   ┌──────────────┼──────────────┐
//!                                                   ▼              ▼              ▼
//!                                               LogWriter       Metrics         Custom
//! ```

mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
mod log;

pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
