//! Context handed to every callback invocation.
//!
//! A [`TransitionContext`] identifies the execution and the transition being
//! dispatched. It is `Copy`, so callbacks can keep it past the call (for
//! example to log after an `await`) without borrowing the executor.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::CallbackPhase;
use crate::state::CommandState;

/// Identifies one dispatch: which execution, which command, which transition.
///
/// # Example
///
/// ```rust
/// use cadence::callback::{CallbackPhase, TransitionContext};
/// use cadence::state::CommandState;
///
/// let ctx = TransitionContext::new("CreateUser", CallbackPhase::Execute)
///     .with_from(CommandState::Validating);
///
/// assert_eq!(ctx.command(), "CreateUser");
/// assert_eq!(ctx.to(), CommandState::Executing);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionContext {
    execution_id: Uuid,
    command: &'static str,
    from: CommandState,
    to: CommandState,
    transition: CallbackPhase,
}

impl TransitionContext {
    /// Create a context for `transition`, entering the phase's target state.
    ///
    /// The source state defaults to the state preceding the target and the
    /// execution id is freshly generated.
    #[must_use]
    pub fn new(command: &'static str, transition: CallbackPhase) -> Self {
        let to = transition.target_state();
        Self {
            execution_id: Uuid::new_v4(),
            command,
            from: CommandState::ALL[to.ordinal() - 1],
            to,
            transition,
        }
    }

    /// Create a fully specified context.
    #[must_use]
    pub const fn for_transition(
        execution_id: Uuid,
        command: &'static str,
        from: CommandState,
        to: CommandState,
        transition: CallbackPhase,
    ) -> Self {
        Self {
            execution_id,
            command,
            from,
            to,
            transition,
        }
    }

    /// Override the source state.
    #[must_use]
    pub const fn with_from(mut self, from: CommandState) -> Self {
        self.from = from;
        self
    }

    /// Override the target state.
    #[must_use]
    pub const fn with_to(mut self, to: CommandState) -> Self {
        self.to = to;
        self
    }

    /// Override the execution id.
    #[must_use]
    pub const fn with_execution_id(mut self, execution_id: Uuid) -> Self {
        self.execution_id = execution_id;
        self
    }

    /// Id of the execution this transition belongs to.
    #[must_use]
    pub const fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// Name of the command being executed.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        self.command
    }

    /// State being left.
    #[must_use]
    pub const fn from(&self) -> CommandState {
        self.from
    }

    /// State being entered.
    #[must_use]
    pub const fn to(&self) -> CommandState {
        self.to
    }

    /// Phase being dispatched.
    #[must_use]
    pub const fn transition(&self) -> CallbackPhase {
        self.transition
    }
}

impl fmt::Display for TransitionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ({} -> {})",
            self.command, self.transition, self.from, self.to
        )
    }
}
