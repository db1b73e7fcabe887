use std::fmt::Debug;

/// Anything that can be run over a word one symbol at a time.
pub trait Automaton<Input> {
    type State: Debug;

    fn start_state(&self) -> Self::State;

    fn next_state(&self, state: &Self::State, input: &Input) -> Self::State;

    fn is_final(&self, state: &Self::State) -> bool;

    /// Iterates over the states visited while consuming `s`, excluding the
    /// start state.
    fn run<'i, 'a>(&'a self, s: &'i [Input]) -> Run<'i, 'a, Input, Self>
        where Self: Sized
    {
        Run {
            aut: self,
            input: s,
            offset: 0,
            state: self.start_state(),
        }
    }

    fn accepts(&self, s: &[Input]) -> bool {
        let mut state = self.start_state();
        for input in s {
            state = self.next_state(&state, input);
        }
        self.is_final(&state)
    }
}

/// An iterator over the states an automaton passes through on some input.
#[derive(Debug)]
pub struct Run<'i, 'a, Input: 'i, A: 'a + Automaton<Input>> {
    aut: &'a A,
    input: &'i [Input],
    offset: usize,
    state: A::State,
}

impl<'i, 'a, Input, A: Automaton<Input>> Run<'i, 'a, Input, A> {
    /// The state reached so far.
    pub fn state(&self) -> &A::State {
        &self.state
    }

    /// Number of symbols consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'i, 'a, Input, A: Automaton<Input>> Iterator for Run<'i, 'a, Input, A>
    where A::State: Clone
{
    type Item = A::State;

    fn next(&mut self) -> Option<Self::Item> {
        let input = self.input.get(self.offset)?;
        self.state = self.aut.next_state(&self.state, input);
        self.offset += 1;
        Some(self.state.clone())
    }
}
