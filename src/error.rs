//! Error types for building NFAs, loading definitions and running conversions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::nfa::{StateNumber, Symbol};

/// Misuse of the `Nfa` builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NfaError {
    /// State names end up inside DFA labels, so they must be non-empty,
    /// free of `,` and distinct from the empty-subset label.
    #[error("invalid state name '{0}'")]
    InvalidStateName(String),

    #[error("state '{0}' is already defined")]
    DuplicateState(String),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("state number {0} is out of range")]
    StateOutOfRange(StateNumber),

    /// Transitions may only use symbols declared in the alphabet.
    #[error("symbol '{0}' is not part of the alphabet")]
    UnknownSymbol(Symbol),

    #[error("symbol '{0}' appears more than once in the alphabet")]
    DuplicateSymbol(Symbol),
}

/// Fatal precondition violations detected while a session initializes or
/// fills transitions. A session that reports one of these keeps no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("the source automaton has no states")]
    EmptyAutomaton,

    #[error("the source automaton has {count} states, the powerset is capped at {max}")]
    TooManyStates { count: usize, max: usize },

    /// The epsilon closure of the start state did not produce a label of the
    /// generated powerset.
    #[error("start state '{label}' is not one of the generated DFA states")]
    StartStateMissing { label: String },

    #[error("DFA state '{label}' names unknown source state '{member}'")]
    UnknownMember { label: String, member: String },
}

/// Failures while reading an NFA definition.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed NFA definition: {0}")]
    Parse(#[from] serde_json::Error),

    /// Alphabet entries must be exactly one character long.
    #[error("alphabet entry '{0}' is not a single character")]
    InvalidSymbol(String),

    #[error(transparent)]
    Nfa(#[from] NfaError),
}
