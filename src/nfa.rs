use std::collections::HashMap;

use bit_set::BitSet;
use bit_vec::BitVec;

use crate::automaton::Automaton;
use crate::error::NfaError;

pub type StateNumber = usize;
pub type Symbol = char;

/// Label of the empty subset, the dead state of every converted DFA.
pub const EMPTY_LABEL: &str = "Ø";

/// Separator between member names in a subset label.
pub const LABEL_SEPARATOR: char = ',';

/// The queries a conversion needs from its source automaton.
///
/// State numbers are dense, `0..state_count()`. Subsets are `BitSet`s over
/// those numbers, and a subset's label lists its member names sorted.
pub trait SourceAutomaton {
    fn alphabet(&self) -> &[Symbol];

    fn state_count(&self) -> usize;

    fn state_name(&self, state: StateNumber) -> Option<&str>;

    fn state_number(&self, name: &str) -> Option<StateNumber>;

    fn initial_state(&self) -> Option<StateNumber>;

    fn is_accepting(&self, state: StateNumber) -> bool;

    /// States reachable from `state` over epsilon edges only, `state` included.
    fn epsilon_closure_states(&self, state: StateNumber) -> BitSet;

    /// States reachable from `state` by consuming exactly one `symbol`,
    /// closed under epsilon edges on both sides of the move.
    fn reachable_states(&self, state: StateNumber, symbol: Symbol) -> BitSet;

    /// Every subset of the states, in binary counting order over the state
    /// numbering: the empty subset first, the full set last.
    fn powerset_of_states(&self) -> Vec<BitSet> {
        let n = self.state_count();
        (0..1usize << n)
            .map(|mask| (0..n).filter(|&bit| mask & (1 << bit) != 0).collect())
            .collect()
    }

    fn subset_label(&self, subset: &BitSet) -> String {
        if subset.is_empty() {
            return EMPTY_LABEL.to_owned();
        }
        let mut names: Vec<&str> = subset.iter().filter_map(|st| self.state_name(st)).collect();
        names.sort();
        names.join(LABEL_SEPARATOR.to_string().as_str())
    }
}

#[derive(Clone, Debug)]
struct NfaState {
    name: String,
    // `None` keys are epsilon edges
    transitions: HashMap<Option<Symbol>, BitSet>,
}

impl NfaState {
    fn new(name: String) -> Self {
        NfaState {
            name: name,
            transitions: HashMap::new(),
        }
    }
}

/// A nondeterministic finite automaton with epsilon edges and named states.
///
/// The first state added is the start state unless `set_start` says otherwise.
#[derive(Clone, Debug)]
pub struct Nfa {
    alphabet: Vec<Symbol>,
    states: Vec<NfaState>,
    names: HashMap<String, StateNumber>,
    start: StateNumber,
    finals: BitVec,
}

impl Nfa {
    pub fn new<I: IntoIterator<Item = Symbol>>(alphabet: I) -> Result<Self, NfaError> {
        let mut symbols = Vec::new();
        for symbol in alphabet {
            if symbols.contains(&symbol) {
                return Err(NfaError::DuplicateSymbol(symbol));
            }
            symbols.push(symbol);
        }
        Ok(Nfa {
            alphabet: symbols,
            states: Vec::new(),
            names: HashMap::new(),
            start: 0,
            finals: BitVec::new(),
        })
    }

    pub fn add_state<S: Into<String>>(&mut self, name: S) -> Result<StateNumber, NfaError> {
        let name = name.into();
        if name.is_empty() || name == EMPTY_LABEL || name.contains(LABEL_SEPARATOR) {
            return Err(NfaError::InvalidStateName(name));
        }
        if self.names.contains_key(&name) {
            return Err(NfaError::DuplicateState(name));
        }
        let state = self.states.len();
        self.names.insert(name.clone(), state);
        self.states.push(NfaState::new(name));
        self.finals.push(false);
        Ok(state)
    }

    pub fn add_transition(&mut self,
                          from: StateNumber,
                          on: Symbol,
                          to: StateNumber)
                          -> Result<&mut Self, NfaError> {
        if !self.alphabet.contains(&on) {
            return Err(NfaError::UnknownSymbol(on));
        }
        self.add_edge(from, Some(on), to)
    }

    pub fn add_epsilon_transition(&mut self,
                                  from: StateNumber,
                                  to: StateNumber)
                                  -> Result<&mut Self, NfaError> {
        self.add_edge(from, None, to)
    }

    fn add_edge(&mut self,
                from: StateNumber,
                on: Option<Symbol>,
                to: StateNumber)
                -> Result<&mut Self, NfaError> {
        self.check(to)?;
        self.check(from)?;
        self.states[from].transitions.entry(on).or_insert_with(BitSet::new).insert(to);
        Ok(self)
    }

    pub fn set_start(&mut self, state: StateNumber) -> Result<&mut Self, NfaError> {
        self.check(state)?;
        self.start = state;
        Ok(self)
    }

    pub fn mark_final(&mut self, state: StateNumber) -> Result<&mut Self, NfaError> {
        self.check(state)?;
        self.finals.set(state, true);
        Ok(self)
    }

    /// Looks a state up by name, for builders that work with names.
    pub fn state(&self, name: &str) -> Result<StateNumber, NfaError> {
        self.names.get(name).cloned().ok_or_else(|| NfaError::UnknownState(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(|st| st.name.as_str())
    }

    /// All edges in state order; epsilon edges carry `None` and come first
    /// for each source state.
    pub fn edges(&self) -> Vec<(StateNumber, Option<Symbol>, StateNumber)> {
        let mut edges = Vec::new();
        for (from, state) in self.states.iter().enumerate() {
            let mut row: Vec<_> = state.transitions.iter().collect();
            row.sort_by_key(|&(on, _)| *on);
            for (&on, targets) in row {
                edges.extend(targets.iter().map(|to| (from, on, to)));
            }
        }
        edges
    }

    fn check(&self, state: StateNumber) -> Result<(), NfaError> {
        if state < self.states.len() {
            Ok(())
        } else {
            Err(NfaError::StateOutOfRange(state))
        }
    }

    #[inline]
    fn _targets(&self, state: StateNumber, on: Option<Symbol>) -> Option<&BitSet> {
        self.states.get(state).and_then(|st| st.transitions.get(&on))
    }
}

impl SourceAutomaton for Nfa {
    fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    fn state_count(&self) -> usize {
        self.states.len()
    }

    fn state_name(&self, state: StateNumber) -> Option<&str> {
        self.states.get(state).map(|st| st.name.as_str())
    }

    fn state_number(&self, name: &str) -> Option<StateNumber> {
        self.names.get(name).cloned()
    }

    fn initial_state(&self) -> Option<StateNumber> {
        if self.states.is_empty() {
            None
        } else {
            Some(self.start)
        }
    }

    fn is_accepting(&self, state: StateNumber) -> bool {
        self.finals.get(state).unwrap_or(false)
    }

    fn epsilon_closure_states(&self, state: StateNumber) -> BitSet {
        let mut closure = BitSet::with_capacity(self.states.len());
        if state >= self.states.len() {
            return closure;
        }
        closure.insert(state);
        let mut worklist = vec![state];
        while let Some(st) = worklist.pop() {
            if let Some(targets) = self._targets(st, None) {
                for to in targets {
                    if closure.insert(to) {
                        worklist.push(to);
                    }
                }
            }
        }
        closure
    }

    fn reachable_states(&self, state: StateNumber, symbol: Symbol) -> BitSet {
        let mut reachable = BitSet::with_capacity(self.states.len());
        for st in &self.epsilon_closure_states(state) {
            if let Some(targets) = self._targets(st, Some(symbol)) {
                for to in targets {
                    if !reachable.contains(to) {
                        reachable.union_with(&self.epsilon_closure_states(to));
                    }
                }
            }
        }
        reachable
    }
}

impl Automaton<Symbol> for Nfa {
    type State = BitSet;

    fn start_state(&self) -> Self::State {
        self.initial_state()
            .map(|start| self.epsilon_closure_states(start))
            .unwrap_or_default()
    }

    fn next_state(&self, states: &Self::State, symbol: &Symbol) -> Self::State {
        let mut nxt_states = BitSet::with_capacity(self.states.len());
        for st in states {
            nxt_states.union_with(&self.reachable_states(st, *symbol));
        }
        nxt_states
    }

    fn is_final(&self, states: &Self::State) -> bool {
        states.iter().any(|st| self.is_accepting(st))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1 -ε-> 3, 1 -a-> 2, 2 -b-> 1, 3 -a-> 3
    fn sample() -> Nfa {
        let mut nfa = Nfa::new(vec!['a', 'b']).unwrap();
        let one = nfa.add_state("1").unwrap();
        let two = nfa.add_state("2").unwrap();
        let three = nfa.add_state("3").unwrap();
        nfa.add_epsilon_transition(one, three).unwrap()
            .add_transition(one, 'a', two).unwrap()
            .add_transition(two, 'b', one).unwrap()
            .add_transition(three, 'a', three).unwrap()
            .mark_final(one).unwrap();
        nfa
    }

    fn set(states: &[usize]) -> BitSet {
        states.iter().cloned().collect()
    }

    #[test]
    fn epsilon_closure_includes_state() {
        let nfa = sample();
        assert_eq!(nfa.epsilon_closure_states(0), set(&[0, 2]));
        assert_eq!(nfa.epsilon_closure_states(1), set(&[1]));
    }

    #[test]
    fn reachable_folds_in_closures() {
        let nfa = sample();
        // from 1 through its closure {1, 3} on 'a'
        assert_eq!(nfa.reachable_states(0, 'a'), set(&[1, 2]));
        // 2 -b-> 1 and then 1 -ε-> 3
        assert_eq!(nfa.reachable_states(1, 'b'), set(&[0, 2]));
        assert!(nfa.reachable_states(2, 'b').is_empty());
    }

    #[test]
    fn powerset_counts_in_binary() {
        let nfa = sample();
        let labels: Vec<String> =
            nfa.powerset_of_states().iter().map(|s| nfa.subset_label(s)).collect();
        assert_eq!(labels, vec!["Ø", "1", "2", "1,2", "3", "1,3", "2,3", "1,2,3"]);
    }

    #[test]
    fn labels_sort_member_names() {
        // states added out of name order: b first, then a
        let mut nfa = Nfa::new(vec!['x']).unwrap();
        let b = nfa.add_state("b").unwrap();
        let a = nfa.add_state("a").unwrap();
        let c = nfa.add_state("c").unwrap();
        nfa.add_epsilon_transition(b, a).unwrap();
        let labels: Vec<String> =
            nfa.powerset_of_states().iter().map(|s| nfa.subset_label(s)).collect();
        assert_eq!(labels, vec!["Ø", "b", "a", "a,b", "c", "b,c", "a,c", "a,b,c"]);
        assert_eq!(nfa.subset_label(&nfa.epsilon_closure_states(b)), "a,b");
        assert_eq!(nfa.subset_label(&set(&[c, a])), "a,c");
    }

    #[test]
    fn builder_rejects_bad_input() {
        let mut nfa = Nfa::new(vec!['a']).unwrap();
        assert_eq!(nfa.add_state("x,y"), Err(NfaError::InvalidStateName("x,y".to_owned())));
        assert_eq!(nfa.add_state(EMPTY_LABEL),
                   Err(NfaError::InvalidStateName(EMPTY_LABEL.to_owned())));
        let q = nfa.add_state("q").unwrap();
        assert_eq!(nfa.add_state("q"), Err(NfaError::DuplicateState("q".to_owned())));
        assert_eq!(nfa.add_transition(q, 'b', q).err(), Some(NfaError::UnknownSymbol('b')));
        assert_eq!(nfa.mark_final(7).err(), Some(NfaError::StateOutOfRange(7)));
        assert_eq!(Nfa::new(vec!['a', 'a']).err(), Some(NfaError::DuplicateSymbol('a')));
    }

    #[test]
    fn simulation() {
        let nfa = sample();
        assert!(nfa.accepts(&[]));
        assert!(nfa.accepts(&['a', 'b']));
        assert!(!nfa.accepts(&['a']));
        assert!(!nfa.accepts(&['b']));
        assert!(nfa.accepts(&['a', 'b', 'a', 'b']));
    }

    #[test]
    fn edges_are_ordered() {
        let nfa = sample();
        assert_eq!(nfa.edges(),
                   vec![(0, None, 2), (0, Some('a'), 1), (1, Some('b'), 0), (2, Some('a'), 2)]);
    }
}
