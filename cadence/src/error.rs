//! Unified error types for the cadence execution core.
//!
//! Three classes of failure flow through a command execution:
//!
//! - **Accumulated errors** are recorded in an
//!   [`ErrorCollection`](crate::command::ErrorCollection) and never raised.
//!   They end a run with [`Outcome::Failure`](crate::orchestrator::Outcome).
//! - **Raised faults** ([`Error::Action`], [`Error::Callback`], ...) come out of a
//!   phase action or a callback. They are routed through every matching error
//!   callback, drive the machine to `Errored`, and are returned to the caller.
//! - **Internal faults** ([`Error::IllegalTransition`]) mean the fixed phase
//!   sequence itself was violated. They are never routed through callbacks.

use std::time::Duration;

use crate::callback::CallbackPhase;
use crate::config::ConfigError;
use crate::state::CommandState;

/// Result type alias for cadence operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the cadence crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A callback was registered after the registry was sealed.
    #[error("callback registry is sealed; no further registrations are accepted")]
    RegistrySealed,

    /// The state machine refused a transition requested by the orchestrator.
    #[error("illegal state transition from {from} to {to}")]
    IllegalTransition {
        /// State the machine was in.
        from: CommandState,
        /// Requested target state.
        to: CommandState,
    },

    /// An execution was run a second time.
    #[error("execution already started (current state: {state})")]
    AlreadyStarted {
        /// State the execution was in when `run` was called.
        state: CommandState,
    },

    /// A callback raised an error.
    #[error("callback error: {0}")]
    Callback(String),

    /// A phase action raised an error.
    #[error("action error: {0}")]
    Action(String),

    /// The transaction manager raised an error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A wrapped phase exceeded its time budget.
    #[error("transition {transition} timed out after {elapsed:?}")]
    Timeout {
        /// Transition that was being dispatched.
        transition: CallbackPhase,
        /// Budget that was exceeded.
        elapsed: Duration,
    },

    /// The `execute` phase completed without producing a value.
    #[error("execute phase completed without producing an output")]
    MissingOutput,

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Any other error raised by user code.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Create a callback error with a message.
    #[must_use]
    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }

    /// Create an action error with a message.
    #[must_use]
    pub fn action(msg: impl Into<String>) -> Self {
        Self::Action(msg.into())
    }

    /// Create a transaction error with a message.
    #[must_use]
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Wrap an arbitrary error raised by user code.
    #[must_use]
    pub fn custom(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Custom(Box::new(err))
    }

    /// Whether this error signals a broken internal invariant rather than a
    /// fault raised by user code.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. } | Self::AlreadyStarted { .. }
        )
    }

    /// Whether re-running the failed operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Callback(_)
                | Self::Action(_)
                | Self::Transaction(_)
                | Self::Timeout { .. }
                | Self::Custom(_)
        )
    }
}
