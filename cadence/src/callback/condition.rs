use serde::{Deserialize, Serialize};

use super::CallbackPhase;
use crate::state::CommandState;

/// Filter deciding which transitions a callback fires on.
///
/// Every field left as `None` is a wildcard. A condition matches a transition
/// when each present field equals the transition's value.
///
/// # Example
///
/// ```rust,ignore
/// use cadence::callback::{CallbackCondition, CallbackPhase};
/// use cadence::state::CommandState;
///
/// let on_execute = CallbackCondition::any().transition(CallbackPhase::Execute);
/// let into_executing = CallbackCondition::any().entering(CommandState::Executing);
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackCondition {
    from: Option<CommandState>,
    to: Option<CommandState>,
    transition: Option<CallbackPhase>,
}

impl CallbackCondition {
    /// A condition that matches every transition.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            from: None,
            to: None,
            transition: None,
        }
    }

    /// A condition that matches one phase.
    #[must_use]
    pub const fn on(phase: CallbackPhase) -> Self {
        Self::any().transition(phase)
    }

    /// Restrict to transitions leaving `state`.
    #[must_use]
    pub const fn leaving(mut self, state: CommandState) -> Self {
        self.from = Some(state);
        self
    }

    /// Restrict to transitions entering `state`.
    #[must_use]
    pub const fn entering(mut self, state: CommandState) -> Self {
        self.to = Some(state);
        self
    }

    /// Restrict to one named phase.
    #[must_use]
    pub const fn transition(mut self, phase: CallbackPhase) -> Self {
        self.transition = Some(phase);
        self
    }

    /// Required source state, if any.
    #[must_use]
    pub const fn from_state(&self) -> Option<CommandState> {
        self.from
    }

    /// Required target state, if any.
    #[must_use]
    pub const fn to_state(&self) -> Option<CommandState> {
        self.to
    }

    /// Required phase, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<CallbackPhase> {
        self.transition
    }

    /// True if every field is a wildcard.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.transition.is_none()
    }

    /// Whether this condition accepts the given transition.
    #[must_use]
    pub fn matches(&self, from: CommandState, to: CommandState, transition: CallbackPhase) -> bool {
        self.from.is_none_or(|s| s == from)
            && self.to.is_none_or(|s| s == to)
            && self.transition.is_none_or(|p| p == transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM: CommandState = CommandState::Validating;
    const TO: CommandState = CommandState::Executing;
    const PHASE: CallbackPhase = CallbackPhase::Execute;

    #[test]
    fn wildcard_matches_everything() {
        let cond = CallbackCondition::any();
        assert!(cond.is_wildcard());
        assert!(cond.matches(FROM, TO, PHASE));
        assert!(cond.matches(
            CommandState::Initialized,
            CommandState::OpeningTransaction,
            CallbackPhase::OpenTransaction
        ));
    }

    #[test]
    fn each_field_narrows_the_match() {
        assert!(CallbackCondition::any().leaving(FROM).matches(FROM, TO, PHASE));
        assert!(!CallbackCondition::any().leaving(TO).matches(FROM, TO, PHASE));

        assert!(CallbackCondition::any().entering(TO).matches(FROM, TO, PHASE));
        assert!(!CallbackCondition::any().entering(FROM).matches(FROM, TO, PHASE));

        assert!(CallbackCondition::on(PHASE).matches(FROM, TO, PHASE));
        assert!(!CallbackCondition::on(CallbackPhase::Validate).matches(FROM, TO, PHASE));
    }

    #[test]
    fn all_present_fields_must_match() {
        let cond = CallbackCondition::any().leaving(FROM).entering(TO).transition(PHASE);
        assert!(cond.matches(FROM, TO, PHASE));
        assert!(!cond.matches(FROM, TO, CallbackPhase::CommitTransaction));
        assert!(!cond.matches(CommandState::Initialized, TO, PHASE));
    }
}
