//! Name parser and builder
//!
//! Segments a name into words, tokenizes every non-literal word, enumerates
//! the cartesian product of per-word tokenizations and ranks the resulting
//! trees, simplest first.

use std::collections::VecDeque;
use std::sync::Arc;

use chemlex_core::automaton::{AutomatonCache, NoCache};
use chemlex_core::{Parse, ParseTokens, ParseWord, WordRole, BINARY_OR_OTHER_RULE};
use tracing::{debug, warn};

use crate::config::{GrammarConfig, DEFAULT_MAX_TOKENIZATIONS};
use crate::context::GrammarContext;
use crate::error::{EngineError, Result};
use crate::loader;
use crate::output::{ChunkKind, ChunkNode, OutputTree, WordContent, WordNode};

/// Per-parser limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Ceiling on tokenizations of a single word (explosion guard)
    pub max_tokenizations: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_tokenizations: DEFAULT_MAX_TOKENIZATIONS,
        }
    }
}

/// Parses chemical names against one grammar
///
/// Cheap to clone; clones share the compiled grammar.
#[derive(Debug, Clone)]
pub struct NameParser {
    context: Arc<GrammarContext>,
    config: ParserConfig,
}

impl NameParser {
    /// Parser for the default grammar
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start a builder
    pub fn builder() -> NameParserBuilder {
        NameParserBuilder::new()
    }

    /// Parser over an already compiled grammar
    pub fn with_context(context: Arc<GrammarContext>, config: ParserConfig) -> Self {
        Self { context, config }
    }

    /// The compiled grammar
    pub fn context(&self) -> &GrammarContext {
        &self.context
    }

    /// Per-parser limits
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Word split and rule selection only
    pub fn segment(&self, name: &str) -> Result<Parse> {
        Ok(self.context.word_rules().segment(name)?)
    }

    /// Segmentation with every non-literal word tokenized
    ///
    /// `None` when some word does not lex, even after merging.
    pub fn tokenize(&self, name: &str) -> Result<Option<Parse>> {
        let skeleton = self.segment(name)?;
        let mergeable = skeleton.rule == BINARY_OR_OTHER_RULE;
        let tokenizer = self.context.tokenizer();
        let limit = self.config.max_tokenizations;

        let mut pending: VecDeque<ParseWord> = skeleton.words.into();
        let mut words = Vec::with_capacity(pending.len());

        while let Some(mut word) = pending.pop_front() {
            if word.role == WordRole::Literal {
                words.push(word);
                continue;
            }
            let dfa = self.context.automaton(word.role).ok_or_else(|| {
                EngineError::Internal(format!("no automaton for role {}", word.role))
            })?;

            loop {
                let result = tokenizer.tokenize(&word.text, dfa);
                if result.results.len() > limit {
                    warn!(
                        word = %word.text,
                        count = result.results.len(),
                        limit,
                        "explosion guard tripped"
                    );
                    return Err(EngineError::TooAmbiguous {
                        word: word.text,
                        count: result.results.len(),
                        limit,
                    });
                }
                if !result.is_empty() {
                    word.tokenizations = result.results;
                    break;
                }

                // Only a word that ran out of text where a hyphen could follow
                // absorbs the next one
                let can_merge = mergeable
                    && result.hyphen_continuable
                    && pending.front().is_some_and(|next| !next.text.starts_with('-'));
                match pending.pop_front() {
                    Some(next) if can_merge => {
                        let merged = format!("{}-{}", word.text, next.text);
                        debug!(first = %word.text, second = %next.text, %merged, "merging words");
                        word.text = merged;
                    }
                    _ => {
                        debug!(name, word = %word.text, "word does not lex");
                        return Ok(None);
                    }
                }
            }
            words.push(word);
        }

        Ok(Some(Parse {
            name: skeleton.name,
            rule: skeleton.rule,
            words,
        }))
    }

    /// Every interpretation of `name`, simplest first
    ///
    /// An empty list means the name could not be parsed; errors are reserved
    /// for the explosion guard and internal faults.
    pub fn parse(&self, name: &str) -> Result<Vec<OutputTree>> {
        let Some(parse) = self.tokenize(name)? else {
            return Ok(Vec::new());
        };

        let choices = parse
            .words
            .iter()
            .map(|word| self.word_nodes(word))
            .collect::<Result<Vec<_>>>()?;

        let total = choices
            .iter()
            .try_fold(1usize, |acc, nodes| acc.checked_mul(nodes.len()))
            .ok_or_else(|| EngineError::TooAmbiguous {
                word: parse.name.clone(),
                count: usize::MAX,
                limit: self.config.max_tokenizations,
            })?;

        let mut trees = Vec::with_capacity(total.min(1024));
        let mut odometer = vec![0usize; choices.len()];
        for _ in 0..total {
            trees.push(OutputTree {
                name: parse.name.clone(),
                rule: parse.rule.clone(),
                words: odometer
                    .iter()
                    .zip(&choices)
                    .map(|(&pick, nodes)| nodes[pick].clone())
                    .collect(),
            });
            advance(&mut odometer, &choices);
        }

        trees.sort_by_key(OutputTree::node_count);
        debug!(name, rule = %parse.rule, trees = trees.len(), "parsed");
        Ok(trees)
    }

    /// Parse many names, in parallel when the `parallel` feature is enabled
    #[cfg(feature = "parallel")]
    pub fn parse_all<S>(&self, names: &[S]) -> Vec<Result<Vec<OutputTree>>>
    where
        S: AsRef<str> + Sync,
    {
        use rayon::prelude::*;
        names.par_iter().map(|name| self.parse(name.as_ref())).collect()
    }

    /// Parse many names
    #[cfg(not(feature = "parallel"))]
    pub fn parse_all<S>(&self, names: &[S]) -> Vec<Result<Vec<OutputTree>>>
    where
        S: AsRef<str>,
    {
        names.iter().map(|name| self.parse(name.as_ref())).collect()
    }

    /// One node per tokenization of `word`
    fn word_nodes(&self, word: &ParseWord) -> Result<Vec<WordNode>> {
        if word.role == WordRole::Literal {
            return Ok(vec![WordNode {
                role: word.role,
                text: word.text.clone(),
                content: WordContent::Text(word.text.clone()),
            }]);
        }
        word.tokenizations
            .iter()
            .map(|tokens| {
                Ok(WordNode {
                    role: word.role,
                    text: word.text.clone(),
                    content: WordContent::Chunks(self.chunks(tokens, word.role)?),
                })
            })
            .collect()
    }

    /// Split a tokenization into chunks at boundary symbols
    fn chunks(&self, tokens: &ParseTokens, role: WordRole) -> Result<Vec<ChunkNode>> {
        let context = &self.context;
        let end_of_substituent = context.end_of_substituent();
        let end_of_main_group = context.end_of_main_group();
        let end_of_word = context.tokenizer_symbols().end_of_word;

        let mut chunks = Vec::new();
        let mut current = Vec::new();
        for (text, symbol) in tokens.iter() {
            let closes = if Some(symbol) == end_of_substituent {
                Some(ChunkKind::Substituent)
            } else if Some(symbol) == end_of_main_group {
                Some(ChunkKind::Head)
            } else {
                None
            };

            if let Some(kind) = closes {
                if !current.is_empty() {
                    chunks.push(ChunkNode {
                        kind,
                        tokens: std::mem::take(&mut current),
                    });
                }
            } else if Some(symbol) != end_of_word {
                if let Some(node) = context.registry().make_node(text, symbol)? {
                    current.push(node);
                }
            }
        }
        if !current.is_empty() {
            chunks.push(ChunkNode {
                kind: ChunkKind::Substituent,
                tokens: current,
            });
        }

        if role == WordRole::Full {
            if let Some(last) = chunks.last_mut() {
                last.kind = ChunkKind::Head;
            }
        }
        Ok(chunks)
    }
}

/// Step to the next combination, last word fastest
fn advance(odometer: &mut [usize], choices: &[Vec<WordNode>]) {
    for (pick, nodes) in odometer.iter_mut().zip(choices).rev() {
        *pick += 1;
        if *pick < nodes.len() {
            return;
        }
        *pick = 0;
    }
}

/// Builder for [`NameParser`]
#[derive(Default)]
pub struct NameParserBuilder {
    grammar: Option<GrammarConfig>,
    grammar_name: Option<String>,
    context: Option<Arc<GrammarContext>>,
    cache: Option<Arc<dyn AutomatonCache>>,
    config: ParserConfig,
}

impl NameParserBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this grammar instead of the default
    pub fn grammar(mut self, grammar: GrammarConfig) -> Self {
        self.grammar = Some(grammar);
        self
    }

    /// Use an embedded grammar by name
    pub fn grammar_name(mut self, name: impl Into<String>) -> Self {
        self.grammar_name = Some(name.into());
        self
    }

    /// Share an already compiled grammar; overrides any grammar setting
    pub fn context(mut self, context: Arc<GrammarContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Store and look up compiled automata here
    pub fn cache(mut self, cache: Arc<dyn AutomatonCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the per-word tokenization ceiling
    pub fn max_tokenizations(mut self, limit: usize) -> Self {
        self.config.max_tokenizations = limit;
        self
    }

    /// Build the parser
    pub fn build(self) -> Result<NameParser> {
        if self.config.max_tokenizations == 0 {
            return Err(EngineError::ConfigError(
                "max_tokenizations must be at least 1".to_string(),
            ));
        }

        let context = match self.context {
            Some(context) => context,
            None => {
                let grammar = match (self.grammar, self.grammar_name) {
                    (Some(grammar), _) => grammar,
                    (None, Some(name)) => loader::embedded_grammar(&name)?,
                    (None, None) => loader::default_grammar()?,
                };
                let cache = self.cache.unwrap_or_else(|| Arc::new(NoCache));
                Arc::new(GrammarContext::from_config(&grammar, cache.as_ref())?)
            }
        };

        Ok(NameParser::with_context(context, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> NameParser {
        NameParser::new().unwrap()
    }

    fn annotations(parse: &Parse) -> Vec<Vec<String>> {
        parse
            .words
            .iter()
            .map(|w| {
                w.tokenizations
                    .iter()
                    .map(|t| t.annotations().iter().collect())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_ambiguous_single_word() {
        let parse = parser().tokenize("ethylmethylamine").unwrap().unwrap();
        assert_eq!(parse.rule, "simple");
        assert_eq!(annotations(&parse), vec![vec!["aySafW", "aySaySgW"]]);
    }

    #[test]
    fn test_merge_hyphen_continuable_words() {
        let parse = parser().tokenize("methyl amine").unwrap().unwrap();
        assert_eq!(parse.rule, BINARY_OR_OTHER_RULE);
        assert_eq!(parse.words.len(), 1);
        assert_eq!(parse.words[0].text, "methyl-amine");
        assert_eq!(annotations(&parse), vec![vec!["ayhSgW"]]);
    }

    #[test]
    fn test_dead_end_word_is_not_merged() {
        // `wat` stops lexing before its text runs out, so no hyphen can follow
        let parser = parser();
        assert!(parser.tokenize("wat er").unwrap().is_none());
        assert!(parser.parse("wat er").unwrap().is_empty());
    }

    #[test]
    fn test_no_merge_before_leading_hyphen() {
        assert!(parser().tokenize("methyl -amine").unwrap().is_none());
    }

    #[test]
    fn test_unlexable_word_gives_no_parse() {
        assert!(parser().tokenize("xyzzy").unwrap().is_none());
        assert!(parser().parse("xyzzy").unwrap().is_empty());
    }

    #[test]
    fn test_chunks_and_head() {
        let trees = parser().parse("2,3-dimethylbutane").unwrap();
        assert_eq!(trees.len(), 1);
        let tree = &trees[0];
        assert_eq!(tree.rule, "hydrocarbon");

        let chunks = tree.words[0].chunks();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].kind, ChunkKind::Substituent);
        assert_eq!(chunks[0].text(), "2,3-dimethyl");
        assert_eq!(chunks[1].kind, ChunkKind::Head);
        // the elided `e` is suppressed
        assert_eq!(chunks[1].text(), "butan");
    }

    #[test]
    fn test_substituent_word_has_no_head() {
        let trees = parser().parse("methyl ethanoate").unwrap();
        assert_eq!(trees.len(), 1);
        let words = &trees[0].words;
        assert_eq!(words[0].role, WordRole::Substituent);
        assert!(words[0]
            .chunks()
            .iter()
            .all(|c| c.kind == ChunkKind::Substituent));
        assert_eq!(words[1].chunks().last().map(|c| c.kind), Some(ChunkKind::Head));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(NameParser::builder().max_tokenizations(0).build().is_err());
    }

    #[test]
    fn test_advance_odometer() {
        let node = |text: &str| WordNode {
            role: WordRole::Literal,
            text: text.to_string(),
            content: WordContent::Text(text.to_string()),
        };
        let choices = vec![vec![node("a"), node("b")], vec![node("x"), node("y"), node("z")]];
        let mut odometer = vec![0, 0];
        let mut seen = vec![odometer.clone()];
        for _ in 1..6 {
            advance(&mut odometer, &choices);
            seen.push(odometer.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
        advance(&mut odometer, &choices);
        assert_eq!(odometer, vec![0, 0]);
    }
}
