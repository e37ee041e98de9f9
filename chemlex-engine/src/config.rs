//! Grammar configuration schema

use std::collections::{BTreeMap, HashSet};

use chemlex_core::automaton::{RESERVED_END, RESERVED_START};
use chemlex_core::macros;
use chemlex_core::{TokenKind, WordRole};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default per-word tokenization ceiling
pub const DEFAULT_MAX_TOKENIZATIONS: usize = 128;

/// A complete grammar: automata, tokens and word rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarConfig {
    /// Grammar identity
    pub metadata: MetadataConfig,
    /// Named fragments referenced as `%name%`
    #[serde(default)]
    pub macros: BTreeMap<String, String>,
    /// Per-role grammar text, before macro expansion
    pub grammars: GrammarsConfig,
    /// Designated symbols
    #[serde(default)]
    pub symbols: SymbolsConfig,
    /// Token declarations
    #[serde(default)]
    pub tokens: Vec<TokenGroupConfig>,
    /// Word rules, most specific first
    #[serde(default)]
    pub word_rules: Vec<WordRuleConfig>,
}

/// Grammar identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Name used for cache keys and lookup
    pub name: String,
    /// Free-form version
    #[serde(default)]
    pub version: Option<String>,
}

/// One grammar per tokenized word role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarsConfig {
    /// Grammar for substituent words
    pub substituent: String,
    /// Grammar for full words
    pub full: String,
}

/// Symbols with structural meaning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolsConfig {
    /// Stepped without input once a word is used up
    #[serde(default)]
    pub end_of_word: Option<char>,
    /// Probed to decide whether a failed word may absorb the next
    #[serde(default)]
    pub inter_word_hyphen: Option<char>,
    /// Closes a substituent chunk
    #[serde(default)]
    pub end_of_substituent: Option<char>,
    /// Closes the head chunk
    #[serde(default)]
    pub end_of_main_group: Option<char>,
}

/// Literals and patterns sharing a symbol and output tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGroupConfig {
    /// Grammar symbol the tokens annotate
    pub symbol: char,
    /// Output node kind
    pub tag: TokenKind,
    /// `type` attribute on every node
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    /// `subtype` attribute on every node
    #[serde(default)]
    pub subtype: Option<String>,
    /// Matched but never emitted
    #[serde(default)]
    pub suppressed: bool,
    /// Case-insensitive literal texts
    #[serde(default)]
    pub literals: Vec<LiteralConfig>,
    /// Regexes anchored at the current position, tried in order
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A literal, optionally carrying a `value` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralConfig {
    /// Bare text
    Plain(String),
    /// Text with a `value` attribute
    Valued {
        /// Literal text
        text: String,
        /// Attribute value
        value: String,
    },
}

impl LiteralConfig {
    /// Literal text
    pub fn text(&self) -> &str {
        match self {
            LiteralConfig::Plain(text) => text,
            LiteralConfig::Valued { text, .. } => text,
        }
    }

    /// `value` attribute, if any
    pub fn value(&self) -> Option<&str> {
        match self {
            LiteralConfig::Plain(_) => None,
            LiteralConfig::Valued { value, .. } => Some(value),
        }
    }
}

/// A word rule as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRuleConfig {
    /// Rule name reported in parses
    pub name: String,
    /// Regex over the whole name; capture groups become words
    pub regex: String,
    /// Role of each capture group; missing labels mean `full`
    #[serde(default)]
    pub roles: Vec<WordRole>,
}

impl GrammarConfig {
    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| EngineError::ConfigError(format!("failed to parse grammar: {e}")))
    }

    /// Grammar text for a role with macros expanded; `None` for literal words
    pub fn expanded_grammar(&self, role: WordRole) -> Result<Option<String>> {
        let text = match role {
            WordRole::Literal => return Ok(None),
            WordRole::Substituent => &self.grammars.substituent,
            WordRole::Full => &self.grammars.full,
        };
        Ok(Some(macros::expand(text, &self.macros)?))
    }

    /// Check everything that does not need compilation
    pub fn validate(&self) -> Result<()> {
        let designated = [
            ("end_of_word", self.symbols.end_of_word),
            ("inter_word_hyphen", self.symbols.inter_word_hyphen),
            ("end_of_substituent", self.symbols.end_of_substituent),
            ("end_of_main_group", self.symbols.end_of_main_group),
        ];
        for (field, symbol) in designated {
            if let Some(symbol) = symbol {
                if (RESERVED_START..=RESERVED_END).contains(&symbol) {
                    return Err(EngineError::ConfigError(format!(
                        "symbol {field} uses reserved code point U+{:04X}",
                        symbol as u32
                    )));
                }
            }
        }
        if self.symbols.inter_word_hyphen.is_some()
            && (self.symbols.inter_word_hyphen == self.symbols.end_of_substituent
                || self.symbols.inter_word_hyphen == self.symbols.end_of_main_group)
        {
            return Err(EngineError::ConfigError(
                "inter_word_hyphen cannot also be a chunk boundary".to_string(),
            ));
        }

        let substituent = self.expanded_grammar(WordRole::Substituent)?.unwrap_or_default();
        let full = self.expanded_grammar(WordRole::Full)?.unwrap_or_default();

        for group in &self.tokens {
            if group.literals.is_empty() && group.patterns.is_empty() {
                return Err(EngineError::ConfigError(format!(
                    "token group for symbol '{}' declares no literals or patterns",
                    group.symbol
                )));
            }
            if !substituent.contains(group.symbol) && !full.contains(group.symbol) {
                return Err(EngineError::ConfigError(format!(
                    "symbol '{}' is not used by any grammar",
                    group.symbol
                )));
            }
            if group.literals.iter().any(|literal| literal.text().is_empty()) {
                return Err(EngineError::ConfigError(format!(
                    "empty literal for symbol '{}'",
                    group.symbol
                )));
            }
        }

        let mut names = HashSet::new();
        for rule in &self.word_rules {
            if !names.insert(rule.name.as_str()) {
                return Err(EngineError::ConfigError(format!(
                    "duplicate word rule `{}`",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}
