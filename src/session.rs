//! The stepwise conversion engine.
//!
//! A `Session` turns its source NFA into a DFA one small step at a time:
//!
//! 1. build every powerset state at once,
//! 2. fill in one (state, symbol) transition per step,
//! 3. delete one unreachable state per step,
//! 4. merge one redundant pair of states per step.
//!
//! Steps 3 and 4 repeat while merging leaves states without incoming
//! transitions.
//!
//! Every step is logged together with the automaton it produced, and
//! `step_backward` undoes the most recent one. Undo restores the whole logged
//! automaton and only has to invert the cursor and queue bookkeeping.

use std::collections::{BTreeSet, VecDeque};

use bit_set::BitSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::dfa::Dfa;
use crate::error::ConversionError;
use crate::nfa::{Nfa, SourceAutomaton, Symbol, EMPTY_LABEL, LABEL_SEPARATOR};
use crate::search::{find_redundant_pairs, find_unreachable_states};
use crate::step::{Cursor, Step, StepKind};

/// Largest source automaton a session will expand into its powerset.
pub const MAX_NFA_STATES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    FillingTransitions,
    PruningUnreachable,
    MergingRedundant,
    Done,
}

impl Phase {
    /// The action a forward step takes in this phase.
    pub fn step_kind(self) -> Option<StepKind> {
        match self {
            Phase::Uninitialized => Some(StepKind::Initialize),
            Phase::FillingTransitions => Some(StepKind::AddTransition),
            Phase::PruningUnreachable => Some(StepKind::DeleteState),
            Phase::MergingRedundant => Some(StepKind::MergeStates),
            Phase::Done => None,
        }
    }
}

/// The outcome of one forward step: the automaton after the step and what
/// the step did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedStep {
    pub automaton: Dfa,
    pub step: Step,
}

// Queues a step (re)computed before taking its action, each with the value
// it replaced. Undoing the step puts those values back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Replaced {
    unreachable: Option<Option<VecDeque<String>>>,
    redundant: Option<Option<VecDeque<(String, String)>>>,
}

#[derive(Clone, Debug)]
struct Entry {
    snapshot: Dfa,
    step: Step,
    replaced: Replaced,
}

#[derive(Clone, Debug)]
pub struct Session<N = Nfa> {
    source: N,
    working: Option<Dfa>,
    history: Vec<Entry>,
    cursor: Cursor,
    pending_unreachable: Option<VecDeque<String>>,
    pending_redundant: Option<VecDeque<(String, String)>>,
}

impl<N: SourceAutomaton> Session<N> {
    pub fn new(source: N) -> Self {
        Session {
            source: source,
            working: None,
            history: Vec::new(),
            cursor: Cursor::default(),
            pending_unreachable: None,
            pending_redundant: None,
        }
    }

    pub fn source(&self) -> &N {
        &self.source
    }

    /// The DFA as of the latest step, `None` before initialization.
    pub fn automaton(&self) -> Option<&Dfa> {
        self.working.as_ref()
    }

    /// Every applied step with the automaton it produced, oldest first.
    pub fn history(&self) -> impl Iterator<Item = (&Dfa, &Step)> + '_ {
        self.history.iter().map(|entry| (&entry.snapshot, &entry.step))
    }

    /// The fill cursor as left by the latest step. After a state's last
    /// symbol is written it reads `(state, alphabet length)` and only wraps to
    /// the next state when the following step is evaluated.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// States still to be deleted, `None` until the search has run.
    pub fn pending_unreachable(&self) -> Option<&VecDeque<String>> {
        self.pending_unreachable.as_ref()
    }

    /// Pairs still to be merged, `None` until the search has run.
    pub fn pending_redundant(&self) -> Option<&VecDeque<(String, String)>> {
        self.pending_redundant.as_ref()
    }

    /// Works out the current phase. Queues that are not computed yet are
    /// searched for on the fly without being stored.
    pub fn phase(&self) -> Phase {
        let dfa = match self.working {
            None => return Phase::Uninitialized,
            Some(ref dfa) => dfa,
        };
        if self.is_filling(dfa) {
            return Phase::FillingTransitions;
        }
        let unreachable = match self.pending_unreachable {
            Some(ref queue) if !queue.is_empty() => true,
            Some(_) if !self.round_finished() => false,
            _ => !find_unreachable_states(dfa).is_empty(),
        };
        if unreachable {
            return Phase::PruningUnreachable;
        }
        let redundant = match self.pending_redundant {
            Some(ref queue) => !queue.is_empty(),
            None => !find_redundant_pairs(dfa).is_empty(),
        };
        if redundant {
            Phase::MergingRedundant
        } else {
            Phase::Done
        }
    }

    pub fn next_step_kind(&self) -> Option<StepKind> {
        self.phase().step_kind()
    }

    /// Applies the next step, if any. Once the conversion is done this returns
    /// `Ok(None)` and leaves the session untouched.
    pub fn step_forward(&mut self) -> Result<Option<AppliedStep>, ConversionError> {
        let mut dfa = match self.working.take() {
            Some(dfa) => dfa,
            None => return self.initialize().map(Some),
        };
        let advanced = self.advance(&mut dfa);
        let applied = match advanced {
            Ok(Some((step, replaced))) => Ok(Some(self.record(&dfa, step, replaced))),
            other => other.map(|_| None),
        };
        self.working = Some(dfa);
        applied
    }

    /// Undoes the latest step and returns it, or `None` if nothing was done.
    pub fn step_backward(&mut self) -> Option<Step> {
        let entry = self.history.pop()?;
        match entry.step {
            Step::Initialize { .. } => {
                self.history.clear();
                self.cursor = Cursor::default();
                self.pending_unreachable = None;
                self.pending_redundant = None;
            }
            Step::AddTransition { cursor, .. } => self.cursor = cursor,
            Step::DeleteState { ref state, .. } => {
                self.pending_unreachable
                    .get_or_insert_with(VecDeque::new)
                    .push_front(state.clone());
            }
            Step::MergeStates { ref states, .. } => {
                self.pending_redundant
                    .get_or_insert_with(VecDeque::new)
                    .push_front((states[0].clone(), states[1].clone()));
            }
        }
        self.restore(entry.replaced);
        self.working = self.history.last().map(|top| top.snapshot.clone());
        debug!(step = %entry.step.kind(), history = self.history.len(), "undid step");
        Some(entry.step)
    }

    /// Applies `n` forward steps and returns the automaton afterwards.
    pub fn step(&mut self, n: usize) -> Result<Option<Dfa>, ConversionError> {
        for _ in 0..n {
            self.step_forward()?;
        }
        Ok(self.working.clone())
    }

    /// Runs the conversion to the end, returning every step taken on the way.
    pub fn complete(&mut self) -> Result<Vec<AppliedStep>, ConversionError> {
        let mut applied = Vec::new();
        while let Some(step) = self.step_forward()? {
            applied.push(step);
        }
        info!(steps = applied.len(),
              states = self.working.as_ref().map_or(0, |dfa| dfa.states().len()),
              "conversion complete");
        Ok(applied)
    }

    fn is_filling(&self, dfa: &Dfa) -> bool {
        let width = dfa.alphabet().len();
        width > 0 && wrapped(self.cursor, width).state < dfa.states().len()
    }

    /// Whether both queues were computed and have been worked off.
    fn round_finished(&self) -> bool {
        let drained = |queue: Option<usize>| queue == Some(0);
        drained(self.pending_unreachable.as_ref().map(VecDeque::len)) &&
        drained(self.pending_redundant.as_ref().map(VecDeque::len))
    }

    fn restore(&mut self, replaced: Replaced) {
        if let Some(queue) = replaced.unreachable {
            self.pending_unreachable = queue;
        }
        if let Some(queue) = replaced.redundant {
            self.pending_redundant = queue;
        }
    }

    fn record(&mut self, dfa: &Dfa, step: Step, replaced: Replaced) -> AppliedStep {
        debug!(step = %step.kind(), history = self.history.len() + 1, "{}", step);
        self.history.push(Entry {
            snapshot: dfa.clone(),
            step: step.clone(),
            replaced: replaced,
        });
        AppliedStep {
            automaton: dfa.clone(),
            step: step,
        }
    }

    fn initialize(&mut self) -> Result<AppliedStep, ConversionError> {
        let start = self.source.initial_state().ok_or(ConversionError::EmptyAutomaton)?;
        let count = self.source.state_count();
        if count > MAX_NFA_STATES {
            return Err(ConversionError::TooManyStates {
                count: count,
                max: MAX_NFA_STATES,
            });
        }

        let subsets = self.source.powerset_of_states();
        let mut states = Vec::with_capacity(subsets.len());
        let mut accept_states = BTreeSet::new();
        for subset in &subsets {
            let label = self.source.subset_label(subset);
            if subset.iter().any(|st| self.source.is_accepting(st)) {
                accept_states.insert(label.clone());
            }
            states.push(label);
        }

        let start = self.source.subset_label(&self.source.epsilon_closure_states(start));
        if !states.contains(&start) {
            return Err(ConversionError::StartStateMissing { label: start });
        }

        let dfa = Dfa::new(states, self.source.alphabet().to_vec(), start, accept_states);
        info!(states = dfa.states().len(), start = %dfa.start(), "built powerset states");
        let step = Step::initialize(dfa.states().len(), dfa.start());
        self.cursor = Cursor::default();
        let applied = self.record(&dfa, step, Replaced::default());
        self.working = Some(dfa);
        Ok(applied)
    }

    /// Performs the action of the current phase on `dfa`, computing the
    /// pending queues first if they are due.
    ///
    /// Merging can leave a state with no way in, so once both queues are
    /// worked off the unreachable search runs again and, if it finds anything,
    /// starts another round of pruning and merging.
    fn advance(&mut self, dfa: &mut Dfa) -> Result<Option<(Step, Replaced)>, ConversionError> {
        if self.is_filling(dfa) {
            return self.add_transition(dfa).map(|step| Some((step, Replaced::default())));
        }

        let mut replaced = Replaced::default();
        if self.pending_unreachable.is_none() {
            let found = find_unreachable_states(dfa);
            debug!(count = found.len(), "queued unreachable states");
            replaced.unreachable = Some(self.pending_unreachable.replace(found));
        } else if self.round_finished() {
            let found = find_unreachable_states(dfa);
            if !found.is_empty() {
                debug!(count = found.len(), "merging cut states off, starting another round");
                replaced.unreachable = Some(self.pending_unreachable.replace(found));
                replaced.redundant = Some(self.pending_redundant.take());
            }
        }
        if let Some(state) = self.pending_unreachable.as_mut().and_then(VecDeque::pop_front) {
            let row = dfa.remove_state(&state).unwrap_or_default();
            return Ok(Some((Step::delete_state(state, row), replaced)));
        }

        if self.pending_redundant.is_none() {
            let found = find_redundant_pairs(dfa);
            debug!(count = found.len(), "queued redundant pairs");
            replaced.redundant = Some(self.pending_redundant.replace(found));
        }
        if let Some((a, b)) = self.pending_redundant.as_mut().and_then(VecDeque::pop_front) {
            dfa.merge_states(&a, &b);
            return Ok(Some((Step::merge_states(a, b), replaced)));
        }

        // done: nothing may change, including the queues just computed
        self.restore(replaced);
        Ok(None)
    }

    fn add_transition(&mut self, dfa: &mut Dfa) -> Result<Step, ConversionError> {
        let cursor = self.cursor;
        let at = wrapped(cursor, dfa.alphabet().len());
        let from = dfa.states()[at.state].clone();
        let on = dfa.alphabet()[at.symbol];
        let to = if from == EMPTY_LABEL {
            EMPTY_LABEL.to_owned()
        } else {
            self.destination(&from, on)?
        };
        dfa.set_transition(&from, on, to.clone());

        self.cursor = Cursor {
            state: at.state,
            symbol: at.symbol + 1,
        };
        Ok(Step::add_transition(from, on, to, cursor))
    }

    /// Label of the states reachable from any member of `label` on `on`.
    fn destination(&self, label: &str, on: Symbol) -> Result<String, ConversionError> {
        let mut reachable = BitSet::with_capacity(self.source.state_count());
        for member in label.split(LABEL_SEPARATOR) {
            let state = self.source.state_number(member).ok_or_else(|| {
                ConversionError::UnknownMember {
                    label: label.to_owned(),
                    member: member.to_owned(),
                }
            })?;
            reachable.union_with(&self.source.reachable_states(state, on));
        }
        Ok(self.source.subset_label(&reachable))
    }
}

// A cursor past the last symbol stands for the first symbol of the next state.
fn wrapped(cursor: Cursor, width: usize) -> Cursor {
    if cursor.symbol < width {
        cursor
    } else {
        Cursor {
            state: cursor.state + 1,
            symbol: 0,
        }
    }
}
