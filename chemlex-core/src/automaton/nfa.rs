//! Thompson construction
//!
//! Intermediate representation between [`Ast`] and [`Dfa`]. Never exposed.

use std::collections::{BTreeSet, HashMap, VecDeque};

use smallvec::SmallVec;

use crate::automaton::dfa::{Dfa, DfaState, StateId, Transition};
use crate::automaton::syntax::{Ast, CharSet};

#[derive(Debug, Default, Clone)]
struct NfaState {
    epsilon: Vec<usize>,
    edges: Vec<(u32, u32, usize)>,
}

#[derive(Debug, Default)]
pub(crate) struct Nfa {
    states: Vec<NfaState>,
}

impl Nfa {
    /// Build an NFA for the tree; returns the automaton with its start and
    /// accepting state
    pub(crate) fn build(ast: &Ast) -> (Self, usize, usize) {
        let mut nfa = Nfa::default();
        let (start, end) = nfa.fragment(ast);
        (nfa, start, end)
    }

    fn add_state(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    fn class(&mut self, from: usize, to: usize, set: &CharSet) {
        for &(lo, hi) in set.ranges() {
            self.states[from].edges.push((lo, hi, to));
        }
    }

    fn fragment(&mut self, ast: &Ast) -> (usize, usize) {
        match ast {
            Ast::Empty => {
                let s = self.add_state();
                let e = self.add_state();
                self.epsilon(s, e);
                (s, e)
            }
            Ast::Class(set) => {
                let s = self.add_state();
                let e = self.add_state();
                self.class(s, e, set);
                (s, e)
            }
            Ast::Concat(items) => {
                let s = self.add_state();
                let mut tail = s;
                for item in items {
                    let (fs, fe) = self.fragment(item);
                    self.epsilon(tail, fs);
                    tail = fe;
                }
                (s, tail)
            }
            Ast::Alternate(branches) => {
                let s = self.add_state();
                let e = self.add_state();
                for branch in branches {
                    let (bs, be) = self.fragment(branch);
                    self.epsilon(s, bs);
                    self.epsilon(be, e);
                }
                (s, e)
            }
            Ast::Repeat { inner, min, max } => {
                let s = self.add_state();
                let mut tail = s;
                for _ in 0..*min {
                    let (fs, fe) = self.fragment(inner);
                    self.epsilon(tail, fs);
                    tail = fe;
                }
                match max {
                    None => {
                        let (fs, fe) = self.fragment(inner);
                        let e = self.add_state();
                        self.epsilon(tail, fs);
                        self.epsilon(tail, e);
                        self.epsilon(fe, fs);
                        self.epsilon(fe, e);
                        (s, e)
                    }
                    Some(max) => {
                        let e = self.add_state();
                        self.epsilon(tail, e);
                        for _ in *min..*max {
                            let (fs, fe) = self.fragment(inner);
                            self.epsilon(tail, fs);
                            self.epsilon(fe, e);
                            tail = fe;
                        }
                        (s, e)
                    }
                }
            }
        }
    }

    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> Vec<usize> {
        let mut seen: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<usize> = seeds.into_iter().collect();
        while let Some(s) = stack.pop() {
            if seen.insert(s) {
                stack.extend(self.states[s].epsilon.iter().copied());
            }
        }
        seen.into_iter().collect()
    }

    /// Subset construction
    ///
    /// State numbering follows breadth-first discovery order over sorted
    /// symbol intervals, so identical input always yields an identical DFA.
    pub(crate) fn determinize(&self, start: usize, accept: usize) -> Dfa {
        let initial = self.closure([start]);
        let mut ids: HashMap<Vec<usize>, StateId> = HashMap::new();
        let mut sets: Vec<Vec<usize>> = Vec::new();
        let mut queue: VecDeque<StateId> = VecDeque::new();
        ids.insert(initial.clone(), 0);
        sets.push(initial);
        queue.push_back(0);

        let mut states: Vec<DfaState> = Vec::new();
        while let Some(id) = queue.pop_front() {
            let members = sets[id as usize].clone();
            let edges: Vec<(u32, u32, usize)> = members
                .iter()
                .flat_map(|&m| self.states[m].edges.iter().copied())
                .collect();

            let mut cuts: Vec<u32> = edges
                .iter()
                .flat_map(|&(lo, hi, _)| [lo, hi.saturating_add(1)])
                .collect();
            cuts.sort_unstable();
            cuts.dedup();

            let mut transitions: SmallVec<[Transition; 4]> = SmallVec::new();
            for window in cuts.windows(2) {
                let (lo, hi) = (window[0], window[1] - 1);
                let targets: Vec<usize> = edges
                    .iter()
                    .filter(|&&(elo, ehi, _)| elo <= lo && hi <= ehi)
                    .map(|&(_, _, to)| to)
                    .collect();
                if targets.is_empty() {
                    continue;
                }
                let target_set = self.closure(targets);
                let target = match ids.get(&target_set) {
                    Some(&existing) => existing,
                    None => {
                        let fresh = sets.len() as StateId;
                        ids.insert(target_set.clone(), fresh);
                        sets.push(target_set);
                        queue.push_back(fresh);
                        fresh
                    }
                };
                match transitions.last_mut() {
                    Some(last) if last.target == target && last.end + 1 == lo => last.end = hi,
                    _ => transitions.push(Transition {
                        start: lo,
                        end: hi,
                        target,
                    }),
                }
            }

            states.push(DfaState {
                accept: members.binary_search(&accept).is_ok(),
                transitions,
            });
        }

        Dfa::from_parts(0, states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::syntax::{parse, Syntax};

    fn dfa(pattern: &str) -> Dfa {
        let parsed = parse(pattern, Syntax::Strict).unwrap();
        let (nfa, start, end) = Nfa::build(&parsed.ast);
        nfa.determinize(start, end)
    }

    #[test]
    fn test_states_are_discovered_in_order() {
        let automaton = dfa("ab");
        assert_eq!(automaton.state_count(), 3);
        assert!(automaton.accepts("ab".chars()));
        assert!(!automaton.accepts("a".chars()));
    }

    #[test]
    fn test_overlapping_ranges_are_split() {
        let automaton = dfa("[a-m]x|[h-z]y");
        assert!(automaton.accepts("cx".chars()));
        assert!(automaton.accepts("hx".chars()));
        assert!(automaton.accepts("hy".chars()));
        assert!(automaton.accepts("zy".chars()));
        assert!(!automaton.accepts("cy".chars()));
        assert!(!automaton.accepts("zx".chars()));
    }

    #[test]
    fn test_bounded_repetition() {
        let automaton = dfa("a{2,3}");
        assert!(!automaton.accepts("a".chars()));
        assert!(automaton.accepts("aa".chars()));
        assert!(automaton.accepts("aaa".chars()));
        assert!(!automaton.accepts("aaaa".chars()));
    }
}
