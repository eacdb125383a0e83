use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a single command execution.
///
/// Non-terminal states are visited in declaration order by the orchestrator:
/// `Initialized` first, then one state per phase, ending in
/// `CommittingTransaction`. The three terminal states end a run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Created, nothing has run yet.
    Initialized,
    /// Opening the surrounding transaction.
    OpeningTransaction,
    /// Casting raw inputs and validating them.
    CastingAndValidatingInputs,
    /// Loading records referenced by the inputs.
    LoadingRecords,
    /// Validating loaded records.
    ValidatingRecords,
    /// Running business validation.
    Validating,
    /// Running the command body.
    Executing,
    /// Committing the surrounding transaction.
    CommittingTransaction,
    /// Terminal: every phase completed without errors.
    Succeeded,
    /// Terminal: accumulated errors stopped the run.
    Failed,
    /// Terminal: a raised fault stopped the run.
    Errored,
}

impl CommandState {
    /// Every state, in ordinal order.
    pub const ALL: [Self; 11] = [
        Self::Initialized,
        Self::OpeningTransaction,
        Self::CastingAndValidatingInputs,
        Self::LoadingRecords,
        Self::ValidatingRecords,
        Self::Validating,
        Self::Executing,
        Self::CommittingTransaction,
        Self::Succeeded,
        Self::Failed,
        Self::Errored,
    ];

    /// The terminal states.
    pub const TERMINAL: [Self; 3] = [Self::Succeeded, Self::Failed, Self::Errored];

    /// Position of this state in [`CommandState::ALL`].
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// True once no further transition can succeed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Errored)
    }

    /// Stable snake-case name, used in logs and introspection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::OpeningTransaction => "opening_transaction",
            Self::CastingAndValidatingInputs => "casting_and_validating_inputs",
            Self::LoadingRecords => "loading_records",
            Self::ValidatingRecords => "validating_records",
            Self::Validating => "validating",
            Self::Executing => "executing",
            Self::CommittingTransaction => "committing_transaction",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_declaration_order() {
        for (idx, state) in CommandState::ALL.iter().enumerate() {
            assert_eq!(state.ordinal(), idx);
        }
    }

    #[test]
    fn terminal_set() {
        let terminal: Vec<_> = CommandState::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(terminal, CommandState::TERMINAL);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&CommandState::CastingAndValidatingInputs).unwrap();
        assert_eq!(json, "\"casting_and_validating_inputs\"");
        let back: CommandState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CommandState::CastingAndValidatingInputs);
    }

    #[test]
    fn display_matches_as_str() {
        for state in CommandState::ALL {
            assert_eq!(state.to_string(), state.as_str());
        }
    }
}
