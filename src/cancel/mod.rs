//! Cooperative cancellation.
//!
//! ## Contents
//! - [`SignalChannel`] single-fire broadcast signal
//! - [`CancellationToken`], [`CancellationTokenSource`] read-only view and its trigger
//! - [`select_receive`], [`select_receive_timeout`] race a [`Source`](crate::Source)
//!   against a token
//!
//! ## Quick wiring
//! ```text
//! CancellationTokenSource ──token()──► CancellationToken ──► select_receive(source, token)
//!        │                                                        ├─► Selected::Received(v)
//!        └── cancel() ──► SignalChannel::fire() ─────────────────►├─► Selected::Cancelled
//!                                                                 └─► SelectError::Timeout
//! ```

mod select;
mod signal;
mod token;

pub use select::{Selected, select_receive, select_receive_timeout};
pub use signal::SignalChannel;
pub use token::{CancellationToken, CancellationTokenSource};
