use super::CommandState;

/// Legal transitions between [`CommandState`]s.
///
/// Each non-terminal state may advance to the next phase state, or abort to
/// `Failed` or `Errored`. Terminal states have no outgoing edges.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable;

/// Directed edge of the transition graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TransitionEdge {
    /// Source state.
    pub from: CommandState,
    /// Target state.
    pub to: CommandState,
}

impl TransitionTable {
    /// States reachable from `state` in one transition.
    #[must_use]
    pub const fn targets(self, state: CommandState) -> &'static [CommandState] {
        use CommandState::{
            CastingAndValidatingInputs, CommittingTransaction, Errored, Executing, Failed,
            Initialized, LoadingRecords, OpeningTransaction, Succeeded, Validating,
            ValidatingRecords,
        };

        match state {
            Initialized => &[OpeningTransaction, Failed, Errored],
            OpeningTransaction => &[CastingAndValidatingInputs, Failed, Errored],
            CastingAndValidatingInputs => &[LoadingRecords, Failed, Errored],
            LoadingRecords => &[ValidatingRecords, Failed, Errored],
            ValidatingRecords => &[Validating, Failed, Errored],
            Validating => &[Executing, Failed, Errored],
            Executing => &[CommittingTransaction, Failed, Errored],
            CommittingTransaction => &[Succeeded, Failed, Errored],
            Succeeded | Failed | Errored => &[],
        }
    }

    /// Whether `from -> to` is a legal transition.
    #[must_use]
    pub fn allows(self, from: CommandState, to: CommandState) -> bool {
        self.targets(from).contains(&to)
    }

    /// Every legal edge, grouped by source state in ordinal order.
    #[must_use]
    pub fn edges(self) -> Vec<TransitionEdge> {
        CommandState::ALL
            .into_iter()
            .flat_map(|from| {
                self.targets(from)
                    .iter()
                    .map(move |&to| TransitionEdge { from, to })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_targets() {
        for state in CommandState::TERMINAL {
            assert!(TransitionTable.targets(state).is_empty(), "{state}");
        }
    }

    #[test]
    fn every_non_terminal_state_can_abort() {
        for state in CommandState::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(TransitionTable.allows(state, CommandState::Failed));
            assert!(TransitionTable.allows(state, CommandState::Errored));
        }
    }

    #[test]
    fn phases_advance_in_ordinal_order() {
        for state in CommandState::ALL.into_iter().filter(|s| !s.is_terminal()) {
            let next = CommandState::ALL[state.ordinal() + 1];
            assert!(
                TransitionTable.allows(state, next),
                "missing edge {state} -> {next}"
            );
        }
    }

    #[test]
    fn skipping_a_phase_is_illegal() {
        assert!(!TransitionTable.allows(
            CommandState::Initialized,
            CommandState::Executing
        ));
        assert!(!TransitionTable.allows(
            CommandState::Validating,
            CommandState::Succeeded
        ));
        assert!(!TransitionTable.allows(
            CommandState::Executing,
            CommandState::Executing
        ));
    }

    #[test]
    fn edges_cover_the_table() {
        let edges = TransitionTable.edges();
        assert_eq!(edges.len(), 8 * 3);
        assert!(edges.contains(&TransitionEdge {
            from: CommandState::CommittingTransaction,
            to: CommandState::Succeeded,
        }));
        assert!(
            edges
                .iter()
                .all(|edge| TransitionTable.allows(edge.from, edge.to))
        );
    }
}
