use serde::Serialize;

use super::CommandState;

/// A recorded state change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Transition {
    /// State left.
    pub from: CommandState,
    /// State entered.
    pub to: CommandState,
}

/// Append-only log of successful transitions, for diagnostics.
///
/// Control flow never reads from the history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TransitionHistory {
    entries: Vec<Transition>,
}

impl TransitionHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, from: CommandState, to: CommandState) {
        self.entries.push(Transition { from, to });
    }

    /// Most recent transition, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Transition> {
        self.entries.last()
    }

    /// Number of recorded transitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.entries.iter()
    }

    /// Recorded transitions, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[Transition] {
        &self.entries
    }

    /// Whether the machine ever entered `state`.
    ///
    /// `Initialized` is never entered through a transition and is reported
    /// as not entered.
    #[must_use]
    pub fn has_entered(&self, state: CommandState) -> bool {
        self.entries.iter().any(|t| t.to == state)
    }
}

impl<'a> IntoIterator for &'a TransitionHistory {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
