//! Descriptors for the individual steps of a conversion.
//!
//! A `Step` says what a single forward step changed. It serializes to the
//! shape drivers animate from, tagged by `type`; the bookkeeping a session
//! needs to undo the step travels along but is not serialized.

use std::fmt;

use serde::Serialize;

use crate::dfa::Row;
use crate::nfa::Symbol;

/// The kinds of action a forward step can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Initialize,
    AddTransition,
    DeleteState,
    MergeStates,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            StepKind::Initialize => "initialize",
            StepKind::AddTransition => "add_transition",
            StepKind::DeleteState => "delete_state",
            StepKind::MergeStates => "merge_states",
        };
        f.write_str(name)
    }
}

/// Position of the next (state, symbol) pair to fill, as indices into the
/// DFA's state sequence and alphabet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Cursor {
    pub state: usize,
    pub symbol: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    Initialize {
        desc: String,
    },
    #[serde(rename_all = "camelCase")]
    AddTransition {
        desc: String,
        from_state: String,
        to_state: String,
        symbol: Symbol,
        /// Cursor before the transition was written.
        #[serde(skip)]
        cursor: Cursor,
    },
    DeleteState {
        desc: String,
        state: String,
        /// The removed state's outgoing transitions.
        #[serde(skip)]
        row: Row,
    },
    MergeStates {
        desc: String,
        states: [String; 2],
    },
}

impl Step {
    pub fn initialize(state_count: usize, start: &str) -> Self {
        Step::Initialize {
            desc: format!("Created {} DFA states from the powerset of NFA states, starting at {}",
                          state_count,
                          start),
        }
    }

    pub fn add_transition(from_state: String,
                          symbol: Symbol,
                          to_state: String,
                          cursor: Cursor)
                          -> Self {
        Step::AddTransition {
            desc: format!("Added transition from {} to {} on '{}'", from_state, to_state, symbol),
            from_state: from_state,
            to_state: to_state,
            symbol: symbol,
            cursor: cursor,
        }
    }

    pub fn delete_state(state: String, row: Row) -> Self {
        Step::DeleteState {
            desc: format!("Deleted unreachable state {}", state),
            state: state,
            row: row,
        }
    }

    pub fn merge_states(a: String, b: String) -> Self {
        Step::MergeStates {
            desc: format!("Merged redundant states {} and {}", a, b),
            states: [a, b],
        }
    }

    pub fn kind(&self) -> StepKind {
        match *self {
            Step::Initialize { .. } => StepKind::Initialize,
            Step::AddTransition { .. } => StepKind::AddTransition,
            Step::DeleteState { .. } => StepKind::DeleteState,
            Step::MergeStates { .. } => StepKind::MergeStates,
        }
    }

    pub fn desc(&self) -> &str {
        match *self {
            Step::Initialize { ref desc } |
            Step::AddTransition { ref desc, .. } |
            Step::DeleteState { ref desc, .. } |
            Step::MergeStates { ref desc, .. } => desc,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.desc())
    }
}
