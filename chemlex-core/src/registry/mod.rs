//! Token registry
//!
//! Maps grammar symbols to the literal strings and regex patterns that may
//! realize them, and turns matched text back into typed [`TokenNode`]s.
//! Literals are bucketed by their first two characters so a search step only
//! scans the handful of literals that can possibly match.

mod kind;

pub use kind::{TokenKind, TokenNode, TokenTemplate};

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Number of leading characters used as literal bucket key
const BUCKET_WIDTH: usize = 2;

/// How a declaration matches input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMatcher {
    /// Case-insensitive literal
    Literal(String),
    /// Regex anchored at the current position (case-sensitive)
    Pattern(String),
}

/// One registry declaration
#[derive(Debug, Clone)]
pub struct TokenDecl {
    /// Grammar symbol
    pub symbol: char,
    /// Literal or pattern
    pub matcher: TokenMatcher,
    /// Output template
    pub template: TokenTemplate,
}

#[derive(Debug, Clone)]
struct LiteralEntry {
    text: String,
}

#[derive(Debug, Clone)]
struct PatternEntry {
    anchored: Regex,
    whole: Regex,
    template: usize,
}

/// Immutable symbol → token table
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    symbols: Vec<char>,
    templates: Vec<TokenTemplate>,
    buckets: HashMap<char, HashMap<String, Vec<LiteralEntry>>>,
    exact: HashMap<(char, String), usize>,
    patterns: HashMap<char, Vec<PatternEntry>>,
}

impl TokenRegistry {
    /// Start a builder
    pub fn builder() -> TokenRegistryBuilder {
        TokenRegistryBuilder::default()
    }

    /// Build from declarations, in order
    pub fn from_decls(decls: impl IntoIterator<Item = TokenDecl>) -> Result<Self> {
        let mut registry = TokenRegistry {
            symbols: Vec::new(),
            templates: Vec::new(),
            buckets: HashMap::new(),
            exact: HashMap::new(),
            patterns: HashMap::new(),
        };

        for decl in decls {
            let template = registry.templates.len();
            registry.templates.push(decl.template);
            registry.symbols.push(decl.symbol);

            match decl.matcher {
                TokenMatcher::Literal(text) => {
                    let text = fold_case(&text);
                    let key = (decl.symbol, text.clone());
                    if registry.exact.contains_key(&key) {
                        debug!(symbol = %decl.symbol, literal = %text, "ignoring duplicate literal");
                        continue;
                    }
                    registry.exact.insert(key, template);
                    registry
                        .buckets
                        .entry(decl.symbol)
                        .or_default()
                        .entry(prefix(&text, BUCKET_WIDTH).to_string())
                        .or_default()
                        .push(LiteralEntry { text });
                }
                TokenMatcher::Pattern(pattern) => {
                    let compile = |source: String| {
                        Regex::new(&source).map_err(|e| CoreError::InvalidTokenPattern {
                            symbol: decl.symbol,
                            pattern: pattern.clone(),
                            source: e,
                        })
                    };
                    let anchored = compile(format!("^(?:{pattern})"))?;
                    let whole = compile(format!("^(?:{pattern})$"))?;
                    registry
                        .patterns
                        .entry(decl.symbol)
                        .or_default()
                        .push(PatternEntry {
                            anchored,
                            whole,
                            template,
                        });
                }
            }
        }

        registry.symbols.sort_unstable();
        registry.symbols.dedup();
        Ok(registry)
    }

    /// Every symbol with at least one declaration, sorted
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// Whether `symbol` has any declaration
    pub fn has_symbol(&self, symbol: char) -> bool {
        self.symbols.binary_search(&symbol).is_ok()
    }

    /// Literals for `symbol` that share a bucket with the start of `folded`
    ///
    /// `folded` must already be case-folded with [`fold_case`]. Candidates are
    /// not guaranteed to be prefixes of `folded`; callers still compare.
    pub fn literal_candidates<'a>(
        &'a self,
        symbol: char,
        folded: &str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let table = self.buckets.get(&symbol);
        let mut keys: Vec<String> = Vec::with_capacity(BUCKET_WIDTH);
        for width in (1..=BUCKET_WIDTH).rev() {
            let key = prefix(folded, width);
            if !key.is_empty() && !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        keys.into_iter()
            .filter_map(move |key| table.and_then(|t| t.get(&key)))
            .flatten()
            .map(|entry| entry.text.as_str())
    }

    /// Byte length matched by the first pattern for `symbol` that matches at
    /// the start of `text`
    pub fn match_pattern(&self, symbol: char, text: &str) -> Option<usize> {
        self.patterns
            .get(&symbol)?
            .iter()
            .find_map(|entry| entry.anchored.find(text).map(|m| m.end()))
    }

    /// Whether any pattern is declared for `symbol`
    pub fn has_patterns(&self, symbol: char) -> bool {
        self.patterns.contains_key(&symbol)
    }

    /// Turn matched text into an output node; `None` for suppressed tokens
    pub fn make_node(&self, text: &str, symbol: char) -> Result<Option<TokenNode>> {
        let template = self
            .exact
            .get(&(symbol, fold_case(text)))
            .copied()
            .or_else(|| {
                self.patterns.get(&symbol).and_then(|entries| {
                    entries
                        .iter()
                        .find(|entry| entry.whole.is_match(text))
                        .map(|entry| entry.template)
                })
            })
            .ok_or_else(|| CoreError::UnknownToken {
                text: text.to_string(),
                symbol,
            })?;

        let template = &self.templates[template];
        if template.suppressed {
            return Ok(None);
        }
        Ok(Some(TokenNode {
            kind: template.kind,
            text: text.to_string(),
            attributes: template.attributes.clone(),
        }))
    }
}

/// Incremental registry construction
#[derive(Debug, Default)]
pub struct TokenRegistryBuilder {
    decls: Vec<TokenDecl>,
}

impl TokenRegistryBuilder {
    /// Declare a literal
    pub fn literal(mut self, symbol: char, text: &str, template: TokenTemplate) -> Self {
        self.decls.push(TokenDecl {
            symbol,
            matcher: TokenMatcher::Literal(text.to_string()),
            template,
        });
        self
    }

    /// Declare a pattern
    pub fn pattern(mut self, symbol: char, pattern: &str, template: TokenTemplate) -> Self {
        self.decls.push(TokenDecl {
            symbol,
            matcher: TokenMatcher::Pattern(pattern.to_string()),
            template,
        });
        self
    }

    /// Declare anything
    pub fn declare(mut self, decl: TokenDecl) -> Self {
        self.decls.push(decl);
        self
    }

    /// Finish
    pub fn build(self) -> Result<TokenRegistry> {
        TokenRegistry::from_decls(self.decls)
    }
}

/// Lowercase without changing byte offsets
///
/// Characters whose lowercase form has a different UTF-8 length are left as
/// they are, so positions in the folded string index the original.
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Single-character step of [`fold_case`]
pub fn fold_char(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) if l.len_utf8() == ch.len_utf8() => l,
        _ => ch,
    }
}

fn prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
