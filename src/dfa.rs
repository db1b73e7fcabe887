use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::automaton::Automaton;
use crate::nfa::Symbol;

/// One state's outgoing transitions, symbol to destination label.
pub type Row = BTreeMap<Symbol, String>;

/// A deterministic automaton over labelled states.
///
/// Rows start out empty and are filled one transition at a time, so a `Dfa`
/// is only total once `is_complete` holds. Every label that appears as a
/// destination, as the start state or in the accepting set is also in
/// `states`, except that `remove_state` leaves rows pointing at the removed
/// state untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dfa {
    states: Vec<String>,
    alphabet: Vec<Symbol>,
    transitions: BTreeMap<String, Row>,
    start_state: String,
    accept_states: BTreeSet<String>,
}

impl Dfa {
    pub fn new(states: Vec<String>,
               alphabet: Vec<Symbol>,
               start_state: String,
               accept_states: BTreeSet<String>)
               -> Self {
        let transitions = states.iter().map(|st| (st.clone(), Row::new())).collect();
        Dfa {
            states: states,
            alphabet: alphabet,
            transitions: transitions,
            start_state: start_state,
            accept_states: accept_states,
        }
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    pub fn start(&self) -> &str {
        &self.start_state
    }

    pub fn accept_states(&self) -> &BTreeSet<String> {
        &self.accept_states
    }

    pub fn contains(&self, state: &str) -> bool {
        self.transitions.contains_key(state)
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept_states.contains(state)
    }

    pub fn row(&self, state: &str) -> Option<&Row> {
        self.transitions.get(state)
    }

    pub fn transition(&self, from: &str, on: Symbol) -> Option<&str> {
        self.transitions.get(from).and_then(|row| row.get(&on)).map(String::as_str)
    }

    /// Writes `from --on--> to`, replacing any earlier destination. Unknown
    /// source states are ignored.
    pub fn set_transition(&mut self, from: &str, on: Symbol, to: String) {
        if let Some(row) = self.transitions.get_mut(from) {
            row.insert(on, to);
        }
    }

    /// Whether every state has exactly one destination for every symbol.
    pub fn is_complete(&self) -> bool {
        self.transitions.values().all(|row| self.alphabet.iter().all(|on| row.contains_key(on)))
    }

    /// Removes a state along with its row and returns the row. Rows of other
    /// states are not rewritten, so this is meant for states nothing points at.
    pub fn remove_state(&mut self, state: &str) -> Option<Row> {
        let row = self.transitions.remove(state)?;
        self.states.retain(|st| st != state);
        self.accept_states.remove(state);
        Some(row)
    }

    /// Collapses `b` into `a`. Every transition into `b` now leads to `a`,
    /// `a` accepts if either did and takes over the start marker from `b`.
    pub fn merge_states(&mut self, a: &str, b: &str) {
        if a == b || !self.contains(a) || !self.contains(b) {
            return;
        }
        if self.accept_states.remove(b) {
            self.accept_states.insert(a.to_owned());
        }
        if self.start_state == b {
            self.start_state = a.to_owned();
        }
        self.transitions.remove(b);
        self.states.retain(|st| st != b);
        for to in self.transitions.values_mut().flat_map(|row| row.values_mut()) {
            if to == b {
                *to = a.to_owned();
            }
        }
    }
}

impl Automaton<Symbol> for Dfa {
    type State = Option<String>;

    fn start_state(&self) -> Self::State {
        if self.contains(&self.start_state) {
            Some(self.start_state.clone())
        } else {
            None
        }
    }

    // A missing transition is the stuck state.
    fn next_state(&self, state: &Self::State, input: &Symbol) -> Self::State {
        state.as_ref()
            .and_then(|st| self.transition(st, *input))
            .map(str::to_owned)
    }

    fn is_final(&self, state: &Self::State) -> bool {
        state.as_ref().map_or(false, |st| self.is_accepting(st))
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for state in &self.states {
            let start = if *state == self.start_state { "->" } else { "  " };
            let accept = if self.is_accepting(state) { "*" } else { " " };
            write!(f, "{}{} {:<8}", start, accept, state)?;
            for on in &self.alphabet {
                let to = self.transition(state, *on).unwrap_or("-");
                write!(f, " | {} -> {:<8}", on, to)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| n.to_owned()).collect()
    }

    // p -a-> q, q -a-> r, r -a-> r
    fn chain() -> Dfa {
        let mut dfa = Dfa::new(labels(&["p", "q", "r"]),
                               vec!['a'],
                               "p".to_owned(),
                               ["r".to_owned()].iter().cloned().collect());
        dfa.set_transition("p", 'a', "q".to_owned());
        dfa.set_transition("q", 'a', "r".to_owned());
        dfa.set_transition("r", 'a', "r".to_owned());
        dfa
    }

    #[test]
    fn completeness_tracks_filled_rows() {
        let mut dfa = chain();
        assert!(dfa.is_complete());
        dfa = Dfa::new(labels(&["p"]), vec!['a', 'b'], "p".to_owned(), BTreeSet::new());
        dfa.set_transition("p", 'a', "p".to_owned());
        assert!(!dfa.is_complete());
        dfa.set_transition("p", 'b', "p".to_owned());
        assert!(dfa.is_complete());
    }

    #[test]
    fn remove_state_drops_row_only() {
        let mut dfa = chain();
        let row = dfa.remove_state("r").unwrap();
        assert_eq!(row.get(&'a').map(String::as_str), Some("r"));
        assert_eq!(dfa.states(), &labels(&["p", "q"])[..]);
        assert!(!dfa.is_accepting("r"));
        // q still points at the removed state
        assert_eq!(dfa.transition("q", 'a'), Some("r"));
        assert_eq!(dfa.remove_state("r"), None);
    }

    #[test]
    fn merge_redirects_and_accepts() {
        let mut dfa = chain();
        dfa.merge_states("q", "r");
        assert_eq!(dfa.states(), &labels(&["p", "q"])[..]);
        assert_eq!(dfa.transition("p", 'a'), Some("q"));
        assert_eq!(dfa.transition("q", 'a'), Some("q"));
        assert!(dfa.is_accepting("q"));
    }

    #[test]
    fn merge_moves_start() {
        let mut dfa = chain();
        dfa.merge_states("q", "p");
        assert_eq!(dfa.start(), "q");
        assert_eq!(dfa.transition("q", 'a'), Some("r"));
    }

    #[test]
    fn simulation() {
        let dfa = chain();
        assert!(!dfa.accepts(&['a']));
        assert!(dfa.accepts(&['a', 'a']));
        assert!(dfa.accepts(&['a', 'a', 'a']));
        assert!(!dfa.accepts(&['b']));
        let visited: Vec<_> = dfa.run(&['a', 'a']).collect();
        assert_eq!(visited, vec![Some("q".to_owned()), Some("r".to_owned())]);

        let mut run = dfa.run(&['a', 'b', 'a']);
        assert_eq!((run.state(), run.offset()), (&Some("p".to_owned()), 0));
        run.next();
        run.next();
        // no 'b' edge out of q: stuck for the rest of the word
        assert_eq!((run.state(), run.offset()), (&None, 2));
        assert_eq!(run.next(), Some(None));
        assert_eq!(run.next(), None);
        assert_eq!(run.offset(), 3);
    }

    #[test]
    fn display_marks_start_and_accept() {
        let shown = chain().to_string();
        let lines: Vec<&str> = shown.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("->  p"));
        assert!(lines[2].starts_with("  * r"));
        assert!(lines[1].contains("a -> r"));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(chain()).unwrap();
        assert_eq!(json["startState"], "p");
        assert_eq!(json["acceptStates"], serde_json::json!(["r"]));
        assert_eq!(json["transitions"]["q"]["a"], "r");
    }
}
