//! Error types used by agents, consumers and the group runtime.
//!
//! This module defines four error enums:
//!
//! - [`SelectError`] - failures of a cancellable receive (timeout).
//! - [`AgentError`] - lifecycle misuse and failures reported by an agent body.
//! - [`ConsumeError`] - failures raised by a [`Consumer`](crate::Consumer).
//! - [`RuntimeError`] - failures of the [`AgentGroup`](crate::AgentGroup) itself.
//!
//! Cancellation is **not** an error: a cancelled receive returns
//! [`Selected::Cancelled`](crate::Selected::Cancelled).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by [`select_receive_timeout`](crate::select_receive_timeout).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// Neither a value nor a cancellation arrived within the timeout.
    #[error("receive timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

/// # Errors produced by the agent lifecycle and agent bodies.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    /// `start()` was called on an agent that was already started.
    #[error("agent {name:?} already started")]
    AlreadyStarted {
        /// Name of the agent.
        name: String,
    },

    /// `start()` was called outside of a tokio runtime.
    #[error("no tokio runtime available to start the agent")]
    NoRuntime,

    /// The body failed. Reported through events, never re-raised from `wait()`.
    #[error("agent body failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The body gave up because cancellation was requested.
    #[error("agent cancelled")]
    Canceled,
}

impl AgentError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use agentvisor::AgentError;
    ///
    /// let err = AgentError::Failed { error: "boom".into() };
    /// assert_eq!(err.as_label(), "agent_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AgentError::AlreadyStarted { .. } => "agent_already_started",
            AgentError::NoRuntime => "agent_no_runtime",
            AgentError::Failed { .. } => "agent_failed",
            AgentError::Canceled => "agent_canceled",
        }
    }
}

impl From<SelectError> for AgentError {
    fn from(err: SelectError) -> Self {
        AgentError::Failed {
            error: err.to_string(),
        }
    }
}

/// # Errors produced by a [`Consumer`](crate::Consumer).
///
/// Any error ends consumption for good: the draining consumer relinks its
/// input and completes.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConsumeError {
    /// The consumer refused the value and gives up.
    #[error("consumer rejected value: {error}")]
    Rejected {
        /// The underlying error message.
        error: String,
    },
}

impl ConsumeError {
    /// Shorthand for [`ConsumeError::Rejected`].
    pub fn rejected(error: impl Into<String>) -> Self {
        ConsumeError::Rejected {
            error: error.into(),
        }
    }
}

/// # Errors produced by the group runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some agents did not complete in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the agents that did not complete in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use agentvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck agents={stuck:?}")
            }
        }
    }
}
