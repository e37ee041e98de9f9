//! Word tokenizer
//!
//! Exhaustive depth-first search for every way of splitting a word into
//! registry tokens whose symbol sequence the automaton accepts. No
//! longest-match pruning happens here; all ambiguity is preserved and
//! bounded later by the parser.

mod state;

use tracing::trace;

use crate::automaton::Dfa;
use crate::parse::ParseTokens;
use crate::registry::{fold_case, TokenRegistry};
use state::AnnotatorState;

/// Symbols with special meaning to the search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerSymbols {
    /// Taken once, without consuming input, when the word is exhausted
    pub end_of_word: Option<char>,
    /// Probed on dead ends to decide whether the word could continue after a hyphen
    pub inter_word_hyphen: Option<char>,
    /// Boundary markers allowed to match zero characters
    pub zero_width: Vec<char>,
}

impl TokenizerSymbols {
    fn allows_zero_width(&self, symbol: char) -> bool {
        self.zero_width.contains(&symbol)
    }
}

/// Outcome of tokenizing one word
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenization {
    /// Every accepted tokenization, in search order
    pub results: Vec<ParseTokens>,
    /// Some exhausted branch could have continued with an inter-word hyphen
    pub hyphen_continuable: bool,
}

impl Tokenization {
    /// Whether the word failed to lex
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Backtracking tokenizer over a shared registry
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'g> {
    registry: &'g TokenRegistry,
    symbols: &'g TokenizerSymbols,
}

struct Search<'d> {
    dfa: &'d Dfa,
    results: Vec<ParseTokens>,
    hyphen_continuable: bool,
}

impl<'g> Tokenizer<'g> {
    /// Create a tokenizer
    pub fn new(registry: &'g TokenRegistry, symbols: &'g TokenizerSymbols) -> Self {
        Self { registry, symbols }
    }

    /// Every tokenization of `word` accepted by `dfa`
    ///
    /// An empty result is the normal signal that the word does not lex.
    pub fn tokenize(&self, word: &str, dfa: &Dfa) -> Tokenization {
        let folded = fold_case(word);
        let mut search = Search {
            dfa,
            results: Vec::new(),
            hyphen_continuable: false,
        };
        self.explore(&mut search, word, &folded, AnnotatorState::initial(dfa.initial()));
        trace!(
            word,
            results = search.results.len(),
            hyphen_continuable = search.hyphen_continuable,
            "tokenized word"
        );
        Tokenization {
            results: search.results,
            hyphen_continuable: search.hyphen_continuable,
        }
    }

    fn explore<'w>(
        &self,
        search: &mut Search<'_>,
        text: &'w str,
        folded: &str,
        state: AnnotatorState<'w>,
    ) {
        // Zero-width boundaries may still follow once the text is used up
        if text.is_empty() {
            self.finish(search, state.clone());
        }

        for &symbol in self.registry.symbols() {
            let Some(next) = search.dfa.step(state.dfa_state, symbol) else {
                continue;
            };

            for literal in self.registry.literal_candidates(symbol, folded) {
                if folded.starts_with(literal) {
                    let len = literal.len();
                    let branch = state.consume(next, symbol, &text[..len]);
                    self.explore(search, &text[len..], &folded[len..], branch);
                }
            }

            match self.registry.match_pattern(symbol, text) {
                Some(0) if self.symbols.allows_zero_width(symbol) => {
                    if let Some(branch) = state.zero_width(next, symbol) {
                        self.explore(search, text, folded, branch);
                    }
                }
                Some(len) if len > 0 => {
                    let branch = state.consume(next, symbol, &text[..len]);
                    self.explore(search, &text[len..], &folded[len..], branch);
                }
                _ => {}
            }
        }
    }

    fn finish(&self, search: &mut Search<'_>, state: AnnotatorState<'_>) {
        let dfa = search.dfa;
        let end_step = self
            .symbols
            .end_of_word
            .and_then(|eow| dfa.step(state.dfa_state, eow).map(|next| (eow, next)));

        let completed = match end_step {
            Some((eow, next)) => state.end_of_word(next, eow),
            None => state.clone(),
        };

        if dfa.is_accept(completed.dfa_state) {
            trace!(depth = completed.depth(), "branch accepted");
            search.results.push(completed.into_parse_tokens());
        } else if self
            .symbols
            .inter_word_hyphen
            .is_some_and(|hyphen| dfa.step(state.dfa_state, hyphen).is_some())
        {
            search.hyphen_continuable = true;
        }
    }
}
