use tracing::{debug, trace};

use super::{CommandState, TransitionHistory, TransitionTable};

/// Per-execution lifecycle state machine.
///
/// Tracks the current [`CommandState`] and refuses any transition that is not
/// in the [`TransitionTable`]. A refused transition leaves the machine
/// untouched and is reported with `false`; the caller decides how severe that
/// is.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: CommandState,
    table: TransitionTable,
    history: TransitionHistory,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a machine in [`CommandState::Initialized`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: CommandState::Initialized,
            table: TransitionTable,
            history: TransitionHistory::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CommandState {
        self.current
    }

    /// Current state name.
    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        self.current.as_str()
    }

    /// Recorded transitions.
    #[must_use]
    pub const fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// True once the machine reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Whether the machine is currently in `state`.
    #[must_use]
    pub fn is_currently(&self, state: CommandState) -> bool {
        self.current == state
    }

    /// Whether the machine has ever been in `state`, including now.
    #[must_use]
    pub fn has_ever_been(&self, state: CommandState) -> bool {
        self.current == state
            || state == CommandState::Initialized
            || self.history.has_entered(state)
    }

    /// Move to `target` if the table allows it.
    ///
    /// Returns `false` and leaves the state unchanged otherwise.
    pub fn transition_to(&mut self, target: CommandState) -> bool {
        let from = self.current;
        if !self.table.allows(from, target) {
            trace!(from = %from, to = %target, "transition refused");
            return false;
        }
        self.history.record(from, target);
        self.current = target;
        debug!(from = %from, to = %target, "state transition");
        true
    }

    /// Transition to [`CommandState::Succeeded`].
    pub fn succeed(&mut self) -> bool {
        self.transition_to(CommandState::Succeeded)
    }

    /// Transition to [`CommandState::Failed`].
    pub fn fail(&mut self) -> bool {
        self.transition_to(CommandState::Failed)
    }

    /// Transition to [`CommandState::Errored`].
    pub fn error(&mut self) -> bool {
        self.transition_to(CommandState::Errored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a fresh machine into `state` along the phase sequence.
    fn machine_in(state: CommandState) -> StateMachine {
        let mut machine = StateMachine::new();
        if state == CommandState::Initialized {
            return machine;
        }
        let commit = CommandState::CommittingTransaction.ordinal();
        let path: Vec<_> = if state.is_terminal() {
            let mut path = CommandState::ALL[1..=commit].to_vec();
            path.push(state);
            path
        } else {
            CommandState::ALL[1..=state.ordinal()].to_vec()
        };
        for step in path {
            assert!(machine.transition_to(step), "cannot reach {step}");
        }
        machine
    }

    mod transitions {
        use super::*;

        #[test]
        fn starts_initialized() {
            let machine = StateMachine::new();
            assert_eq!(machine.state(), CommandState::Initialized);
            assert_eq!(machine.state_name(), "initialized");
            assert!(machine.history().is_empty());
            assert!(!machine.is_terminal());
        }

        #[test]
        fn succeeds_iff_target_is_in_table() {
            for from in CommandState::ALL {
                for to in CommandState::ALL {
                    let mut machine = machine_in(from);
                    let before = machine.history().len();
                    let legal = TransitionTable.allows(from, to);

                    assert_eq!(machine.transition_to(to), legal, "{from} -> {to}");
                    if legal {
                        assert_eq!(machine.state(), to);
                        let last = machine.history().last().copied();
                        assert_eq!(last.map(|t| (t.from, t.to)), Some((from, to)));
                        assert_eq!(machine.history().len(), before + 1);
                    } else {
                        assert_eq!(machine.state(), from);
                        assert_eq!(machine.history().len(), before);
                    }
                }
            }
        }

        #[test]
        fn terminal_states_lock_in() {
            for terminal in CommandState::TERMINAL {
                let mut machine = machine_in(CommandState::CommittingTransaction);
                assert!(machine.transition_to(terminal));
                assert!(machine.is_terminal());
                for target in CommandState::ALL {
                    assert!(!machine.transition_to(target));
                    assert_eq!(machine.state(), terminal);
                }
            }
        }
    }

    mod convenience {
        use super::*;

        #[test]
        fn fail_and_error_from_any_phase() {
            let mut machine = machine_in(CommandState::LoadingRecords);
            assert!(machine.fail());
            assert_eq!(machine.state(), CommandState::Failed);

            let mut machine = machine_in(CommandState::Executing);
            assert!(machine.error());
            assert_eq!(machine.state(), CommandState::Errored);
        }

        #[test]
        fn succeed_only_after_commit() {
            let mut machine = machine_in(CommandState::Executing);
            assert!(!machine.succeed());
            assert!(machine.transition_to(CommandState::CommittingTransaction));
            assert!(machine.succeed());
            assert_eq!(machine.state_name(), "succeeded");
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn currently_and_ever() {
            let machine = machine_in(CommandState::LoadingRecords);
            assert!(machine.is_currently(CommandState::LoadingRecords));
            assert!(!machine.is_currently(CommandState::OpeningTransaction));
            assert!(machine.has_ever_been(CommandState::Initialized));
            assert!(machine.has_ever_been(CommandState::OpeningTransaction));
            assert!(machine.has_ever_been(CommandState::LoadingRecords));
            assert!(!machine.has_ever_been(CommandState::Executing));
        }
    }
}
