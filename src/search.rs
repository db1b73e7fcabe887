//! Fixed-point searches over a filled-in DFA.
//!
//! Both searches run on a scratch copy that shrinks as states are found, so
//! later rounds see the effect of earlier ones.

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::dfa::Dfa;

/// Finds the states that can never be entered, in the order they would be
/// removed.
///
/// A state is unreachable when no other state has a transition into it; the
/// start state is always kept. Removing a batch can leave further states
/// without incoming transitions, so rounds repeat until a round finds none.
pub fn find_unreachable_states(dfa: &Dfa) -> VecDeque<String> {
    let mut scratch = dfa.clone();
    let mut found: VecDeque<String> = VecDeque::new();
    let mut round = 0;
    loop {
        let mut entered: HashSet<&str> = HashSet::new();
        for from in scratch.states() {
            if let Some(row) = scratch.row(from) {
                entered.extend(row.values().filter(|to| *to != from).map(String::as_str));
            }
        }
        let batch: Vec<String> = scratch.states()
            .iter()
            .filter(|st| st.as_str() != scratch.start() && !entered.contains(st.as_str()))
            .cloned()
            .collect();
        if batch.is_empty() {
            break;
        }
        round += 1;
        trace!(round, removed = batch.len(), "unreachable states found");
        for state in batch {
            scratch.remove_state(&state);
            if !found.contains(&state) {
                found.push_back(state);
            }
        }
    }
    found
}

/// Whether `a` and `b` can be merged: both accept or both reject, and on every
/// symbol each of them moves to `a` or to `b`.
pub fn is_redundant_pair(dfa: &Dfa, a: &str, b: &str) -> bool {
    if a == b || dfa.is_accepting(a) != dfa.is_accepting(b) {
        return false;
    }
    let stays_inside = |from: &str, on| match dfa.transition(from, on) {
        Some(to) => to == a || to == b,
        None => false,
    };
    dfa.alphabet().iter().all(|&on| stays_inside(a, on) && stays_inside(b, on))
}

/// Finds the merges that remove every redundant pair, in the order they would
/// be applied.
///
/// Pairs are scanned in state order and the first redundant one is merged
/// before scanning again, so each pair names states as they are labelled at
/// the time of its merge.
pub fn find_redundant_pairs(dfa: &Dfa) -> VecDeque<(String, String)> {
    let mut scratch = dfa.clone();
    let mut found = VecDeque::new();
    while let Some((a, b)) = first_redundant_pair(&scratch) {
        trace!(a = %a, b = %b, "redundant pair found");
        scratch.merge_states(&a, &b);
        found.push_back((a, b));
    }
    found
}

fn first_redundant_pair(dfa: &Dfa) -> Option<(String, String)> {
    let states = dfa.states();
    for (i, a) in states.iter().enumerate() {
        for b in &states[i + 1..] {
            if is_redundant_pair(dfa, a, b) {
                return Some((a.clone(), b.clone()));
            }
        }
    }
    None
}
