//! Stepwise conversion of NFAs with epsilon edges into reduced DFAs.
//!
//! ```
//! use nfa2dfa::{Nfa, Session};
//!
//! let mut nfa = Nfa::new(vec!['a']).unwrap();
//! let q = nfa.add_state("q").unwrap();
//! nfa.add_transition(q, 'a', q).unwrap().mark_final(q).unwrap();
//!
//! let mut session = Session::new(nfa);
//! let steps = session.complete().unwrap();
//! assert_eq!(session.automaton().unwrap().states(), &["q".to_owned()][..]);
//! assert!(!steps.is_empty());
//! ```

pub mod automaton;
pub mod definition;
pub mod dfa;
pub mod error;
pub mod nfa;
pub mod search;
pub mod session;
pub mod step;

pub use automaton::Automaton;
pub use definition::NfaDefinition;
pub use dfa::Dfa;
pub use error::{ConversionError, LoadError, NfaError};
pub use nfa::{Nfa, SourceAutomaton, StateNumber, Symbol, EMPTY_LABEL};
pub use session::{AppliedStep, Phase, Session, MAX_NFA_STATES};
pub use step::{Cursor, Step, StepKind};
