use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::CommandState;

/// Named lifecycle phase a callback can be attached to.
///
/// Callbacks are registered against phases rather than raw states. Each phase
/// enters exactly one [`CommandState`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPhase {
    /// `Initialized -> OpeningTransaction`.
    OpenTransaction,
    /// `OpeningTransaction -> CastingAndValidatingInputs`.
    CastAndValidateInputs,
    /// `CastingAndValidatingInputs -> LoadingRecords`.
    LoadRecords,
    /// `LoadingRecords -> ValidatingRecords`.
    ValidateRecords,
    /// `ValidatingRecords -> Validating`.
    Validate,
    /// `Validating -> Executing`.
    Execute,
    /// `Executing -> CommittingTransaction`.
    CommitTransaction,
}

impl CallbackPhase {
    /// The phases in execution order.
    pub const ALL: [Self; 7] = [
        Self::OpenTransaction,
        Self::CastAndValidateInputs,
        Self::LoadRecords,
        Self::ValidateRecords,
        Self::Validate,
        Self::Execute,
        Self::CommitTransaction,
    ];

    /// State entered when this phase starts.
    #[must_use]
    pub const fn target_state(self) -> CommandState {
        match self {
            Self::OpenTransaction => CommandState::OpeningTransaction,
            Self::CastAndValidateInputs => CommandState::CastingAndValidatingInputs,
            Self::LoadRecords => CommandState::LoadingRecords,
            Self::ValidateRecords => CommandState::ValidatingRecords,
            Self::Validate => CommandState::Validating,
            Self::Execute => CommandState::Executing,
            Self::CommitTransaction => CommandState::CommittingTransaction,
        }
    }

    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenTransaction => "open_transaction",
            Self::CastAndValidateInputs => "cast_and_validate_inputs",
            Self::LoadRecords => "load_records",
            Self::ValidateRecords => "validate_records",
            Self::Validate => "validate",
            Self::Execute => "execute",
            Self::CommitTransaction => "commit_transaction",
        }
    }

    /// Position in [`CallbackPhase::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_enter_consecutive_states() {
        for (idx, phase) in CallbackPhase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), idx);
            assert_eq!(phase.target_state().ordinal(), idx + 1);
        }
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(CallbackPhase::Execute.to_string(), "execute");
        assert_eq!(
            CallbackPhase::CastAndValidateInputs.as_str(),
            "cast_and_validate_inputs"
        );
    }
}
