//! Search nodes for the backtracking tokenizer
//!
//! Branches share their common history through reference-counted cons lists,
//! so extending one branch never disturbs its siblings.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::automaton::StateId;
use crate::parse::ParseTokens;

/// Immutable singly linked list, newest element first
#[derive(Debug)]
pub(crate) struct Trail<T> {
    head: Option<Rc<Link<T>>>,
    len: usize,
}

#[derive(Debug)]
struct Link<T> {
    value: T,
    next: Option<Rc<Link<T>>>,
}

impl<T> Clone for Trail<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T: Clone> Trail<T> {
    pub(crate) fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub(crate) fn push(&self, value: T) -> Self {
        Self {
            head: Some(Rc::new(Link {
                value,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Oldest element first
    pub(crate) fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head.as_deref();
        while let Some(link) = cursor {
            out.push(link.value.clone());
            cursor = link.next.as_deref();
        }
        out.reverse();
        out
    }
}

/// One branch of the search
#[derive(Debug, Clone)]
pub(crate) struct AnnotatorState<'w> {
    pub(crate) dfa_state: StateId,
    annotations: Trail<char>,
    tokens: Trail<&'w str>,
    /// States entered by zero-width steps since input was last consumed
    zero_width: SmallVec<[StateId; 4]>,
}

impl<'w> AnnotatorState<'w> {
    pub(crate) fn initial(dfa_state: StateId) -> Self {
        Self {
            dfa_state,
            annotations: Trail::new(),
            tokens: Trail::new(),
            zero_width: SmallVec::new(),
        }
    }

    /// Branch that consumed `token` under `symbol`
    pub(crate) fn consume(&self, next: StateId, symbol: char, token: &'w str) -> Self {
        Self {
            dfa_state: next,
            annotations: self.annotations.push(symbol),
            tokens: self.tokens.push(token),
            zero_width: SmallVec::new(),
        }
    }

    /// Branch that took a zero-width step, or `None` if that would revisit a
    /// state without consuming input
    pub(crate) fn zero_width(&self, next: StateId, symbol: char) -> Option<Self> {
        if next == self.dfa_state || self.zero_width.contains(&next) {
            return None;
        }
        let mut visited = self.zero_width.clone();
        visited.push(self.dfa_state);
        visited.push(next);
        Some(Self {
            dfa_state: next,
            annotations: self.annotations.push(symbol),
            tokens: self.tokens.push(""),
            zero_width: visited,
        })
    }

    /// Terminal annotation appended at end of input
    pub(crate) fn end_of_word(&self, next: StateId, symbol: char) -> Self {
        Self {
            dfa_state: next,
            annotations: self.annotations.push(symbol),
            tokens: self.tokens.push(""),
            zero_width: self.zero_width.clone(),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.annotations.len()
    }

    pub(crate) fn into_parse_tokens(self) -> ParseTokens {
        ParseTokens::from_parts(
            self.tokens.to_vec().into_iter().map(str::to_string).collect(),
            self.annotations.to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_sharing() {
        let base = Trail::new().push('a').push('b');
        let left = base.push('c');
        let right = base.push('d');
        assert_eq!(base.to_vec(), vec!['a', 'b']);
        assert_eq!(left.to_vec(), vec!['a', 'b', 'c']);
        assert_eq!(right.to_vec(), vec!['a', 'b', 'd']);
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn test_zero_width_guard() {
        let start = AnnotatorState::initial(0);
        let first = start.zero_width(1, 'S').unwrap();
        assert!(first.zero_width(0, 'S').is_none());
        assert!(first.zero_width(1, 'S').is_none());
        let second = first.zero_width(2, 'T').unwrap();
        assert!(second.zero_width(1, 'S').is_none());

        let consumed = second.consume(3, 'a', "eth");
        assert!(consumed.zero_width(1, 'S').is_some());
    }

    #[test]
    fn test_into_parse_tokens_keeps_order() {
        let state = AnnotatorState::initial(0)
            .consume(1, 'a', "eth")
            .consume(2, 'y', "yl");
        let tokens = state.into_parse_tokens();
        assert_eq!(tokens.tokens(), &["eth".to_string(), "yl".to_string()]);
        assert_eq!(tokens.annotations(), &['a', 'y']);
    }
}
