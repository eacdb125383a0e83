//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits for easy access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cadence::prelude::*;
//! ```

pub use crate::callback::{
    AfterCallback, AroundCallback, BeforeCallback, CallbackCondition, CallbackExecutor,
    CallbackKind, CallbackPhase, CallbackRegistry, ErrorCallback, LogLevel, LoggingCallbacks, Next,
    PhaseAction, PhaseMetrics, PhaseTimer, Priority, Retry, Timeout, TransitionContext, action_fn,
    after_fn, around_fn, before_fn, error_fn,
};
pub use crate::command::{
    Command, CommandError, ErrorCollection, NoopTransaction, TransactionManager,
};
pub use crate::config::{CadenceConfig, ExecutionConfig, LateRegistration, RegistryConfig};
pub use crate::error::{Error, Result};
pub use crate::orchestrator::{CommandExecution, ExecutionOrchestrator, Outcome};
pub use crate::state::{CommandState, StateMachine, TransitionHistory, TransitionTable};
