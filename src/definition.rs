//! JSON definitions of NFAs.
//!
//! ```json
//! {
//!   "alphabet": ["a", "b"],
//!   "states": ["1", "2", "3"],
//!   "start": "1",
//!   "accept": ["1"],
//!   "transitions": [
//!     {"from": "1", "symbol": null, "to": "3"},
//!     {"from": "1", "symbol": "a", "to": "2"}
//!   ]
//! }
//! ```
//!
//! A `null` symbol is an epsilon edge. Without `start` the first state is the
//! start state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LoadError;
use crate::nfa::{Nfa, SourceAutomaton};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NfaDefinition {
    pub alphabet: Vec<String>,
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default)]
    pub accept: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionDefinition {
    pub from: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub to: String,
}

impl NfaDefinition {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| {
            LoadError::Io {
                path: path.to_owned(),
                source: source,
            }
        })?;
        debug!(path = %path.display(), bytes = json.len(), "read NFA definition");
        Self::from_json(&json)
    }

    /// Builds the automaton, checking names and symbols along the way.
    pub fn build(&self) -> Result<Nfa, LoadError> {
        let alphabet = self.alphabet
            .iter()
            .map(|symbol| single_char(symbol))
            .collect::<Result<Vec<_>, _>>()?;
        let mut nfa = Nfa::new(alphabet)?;
        for name in &self.states {
            nfa.add_state(name.as_str())?;
        }
        if let Some(ref start) = self.start {
            let start = nfa.state(start)?;
            nfa.set_start(start)?;
        }
        for name in &self.accept {
            let state = nfa.state(name)?;
            nfa.mark_final(state)?;
        }
        for tr in &self.transitions {
            let from = nfa.state(&tr.from)?;
            let to = nfa.state(&tr.to)?;
            match tr.symbol {
                Some(ref symbol) => nfa.add_transition(from, single_char(symbol)?, to)?,
                None => nfa.add_epsilon_transition(from, to)?,
            };
        }
        debug!(states = nfa.state_count(), edges = self.transitions.len(), "built NFA");
        Ok(nfa)
    }
}

impl<'a> From<&'a Nfa> for NfaDefinition {
    fn from(nfa: &'a Nfa) -> Self {
        let name = |st| nfa.state_name(st).unwrap_or_default().to_owned();
        NfaDefinition {
            alphabet: nfa.alphabet().iter().map(|c| c.to_string()).collect(),
            states: nfa.names().map(str::to_owned).collect(),
            start: nfa.initial_state().map(&name),
            accept: (0..nfa.state_count())
                .filter(|&st| nfa.is_accepting(st))
                .map(&name)
                .collect(),
            transitions: nfa.edges()
                .into_iter()
                .map(|(from, on, to)| {
                    TransitionDefinition {
                        from: name(from),
                        symbol: on.map(|c| c.to_string()),
                        to: name(to),
                    }
                })
                .collect(),
        }
    }
}

fn single_char(symbol: &str) -> Result<char, LoadError> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LoadError::InvalidSymbol(symbol.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::error::NfaError;

    const SAMPLE: &str = r#"{
        "alphabet": ["a", "b"],
        "states": ["1", "2", "3"],
        "accept": ["1"],
        "transitions": [
            {"from": "1", "symbol": null, "to": "3"},
            {"from": "1", "symbol": "a", "to": "2"},
            {"from": "2", "symbol": "b", "to": "1"},
            {"from": "3", "symbol": "a", "to": "3"}
        ]
    }"#;

    #[test]
    fn builds_sample() {
        let nfa = NfaDefinition::from_json(SAMPLE).unwrap().build().unwrap();
        assert_eq!(nfa.state_count(), 3);
        assert_eq!(nfa.initial_state(), Some(0));
        assert_eq!(nfa.epsilon_closure_states(0).len(), 2);
        assert!(nfa.accepts(&['a', 'b']));
        assert!(!nfa.accepts(&['a', 'a']));
    }

    #[test]
    fn definition_of_built_nfa_matches_source() {
        let definition = NfaDefinition::from_json(SAMPLE).unwrap();
        let nfa = definition.build().unwrap();
        let back = NfaDefinition::from(&nfa);
        assert_eq!(back.start.as_ref().map(String::as_str), Some("1"));
        assert_eq!(back.transitions, definition.transitions);
    }

    #[test]
    fn rejects_bad_definitions() {
        let long_symbol = r#"{"alphabet": ["ab"], "states": ["q"]}"#;
        match NfaDefinition::from_json(long_symbol).unwrap().build() {
            Err(LoadError::InvalidSymbol(symbol)) => assert_eq!(symbol, "ab"),
            other => panic!("unexpected {:?}", other),
        }

        let unknown_state = r#"{"alphabet": ["a"], "states": ["q"], "accept": ["r"]}"#;
        match NfaDefinition::from_json(unknown_state).unwrap().build() {
            Err(LoadError::Nfa(NfaError::UnknownState(name))) => assert_eq!(name, "r"),
            other => panic!("unexpected {:?}", other),
        }

        let unknown_field = r#"{"alphabet": [], "states": [], "finals": []}"#;
        assert!(matches!(NfaDefinition::from_json(unknown_field), Err(LoadError::Parse(_))));
    }
}
