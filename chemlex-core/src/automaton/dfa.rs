//! Deterministic finite automaton over grammar symbols
//!
//! Transitions are stored per state as sorted, disjoint code point intervals,
//! which keeps character classes like `[^ ]` compact.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{CoreError, Result};

/// DFA state identifier
pub type StateId = u32;

/// Transition on an inclusive code point interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// First code point
    pub start: u32,
    /// Last code point (inclusive)
    pub end: u32,
    /// Destination state
    pub target: StateId,
}

impl Transition {
    /// Whether the interval covers `symbol`
    #[inline]
    pub fn contains(&self, symbol: char) -> bool {
        let c = symbol as u32;
        self.start <= c && c <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DfaState {
    pub(crate) accept: bool,
    pub(crate) transitions: SmallVec<[Transition; 4]>,
}

/// Immutable compiled automaton
///
/// Safe to share across threads; every query takes `&self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dfa {
    initial: StateId,
    states: Vec<DfaState>,
}

impl Dfa {
    pub(crate) fn from_parts(initial: StateId, states: Vec<DfaState>) -> Self {
        Self { initial, states }
    }

    /// Start state
    #[inline]
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// Follow the transition on `symbol`, if any
    #[inline]
    pub fn step(&self, state: StateId, symbol: char) -> Option<StateId> {
        let transitions = &self.states.get(state as usize)?.transitions;
        let c = symbol as u32;
        let idx = transitions.partition_point(|t| t.end < c);
        transitions
            .get(idx)
            .filter(|t| t.contains(symbol))
            .map(|t| t.target)
    }

    /// Whether `state` accepts
    #[inline]
    pub fn is_accept(&self, state: StateId) -> bool {
        self.states
            .get(state as usize)
            .is_some_and(|s| s.accept)
    }

    /// Outgoing transitions of `state`, sorted by interval
    pub fn transitions(&self, state: StateId) -> &[Transition] {
        self.states
            .get(state as usize)
            .map_or(&[], |s| s.transitions.as_slice())
    }

    /// Number of states
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Run the automaton over a whole symbol sequence
    pub fn accepts(&self, symbols: impl IntoIterator<Item = char>) -> bool {
        let mut state = self.initial;
        for symbol in symbols {
            match self.step(state, symbol) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accept(state)
    }

    /// Structural check for automata obtained from outside the compiler
    pub fn validate(&self) -> Result<()> {
        let count = self.states.len();
        if (self.initial as usize) >= count {
            return Err(CoreError::CorruptAutomaton(format!(
                "initial state {} out of {count} states",
                self.initial
            )));
        }
        for (id, state) in self.states.iter().enumerate() {
            let mut previous_end: Option<u32> = None;
            for t in &state.transitions {
                if (t.target as usize) >= count {
                    return Err(CoreError::CorruptAutomaton(format!(
                        "state {id} targets missing state {}",
                        t.target
                    )));
                }
                if t.start > t.end || previous_end.is_some_and(|end| t.start <= end) {
                    return Err(CoreError::CorruptAutomaton(format!(
                        "state {id} has unsorted or overlapping transitions"
                    )));
                }
                previous_end = Some(t.end);
            }
        }
        Ok(())
    }
}
