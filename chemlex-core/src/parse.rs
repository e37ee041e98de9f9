//! Parse data model: tokenizations, words and whole-name segmentations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Rule name used when a name without internal whitespace matches no rule
pub const SIMPLE_RULE: &str = "simple";
/// Rule name used when a name with internal whitespace matches no rule
pub const BINARY_OR_OTHER_RULE: &str = "binaryOrOther";

/// Grammatical role of a word within a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordRole {
    /// Passed through untokenized, e.g. `acid`
    Literal,
    /// A substituent prefix standing as its own word, e.g. `ethyl`
    Substituent,
    /// A complete word with a head unit
    Full,
}

impl WordRole {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            WordRole::Literal => "literal",
            WordRole::Substituent => "substituent",
            WordRole::Full => "full",
        }
    }
}

impl fmt::Display for WordRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One successful tokenization of a word
///
/// `tokens[i]` was consumed under grammar symbol `annotations[i]`; zero-width
/// annotations carry an empty token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParseTokens {
    tokens: Vec<String>,
    annotations: Vec<char>,
}

impl ParseTokens {
    /// Build, checking that both lists have the same length
    pub fn new(tokens: Vec<String>, annotations: Vec<char>) -> Result<Self> {
        if tokens.len() != annotations.len() {
            return Err(CoreError::MismatchedAnnotations {
                tokens: tokens.len(),
                annotations: annotations.len(),
            });
        }
        Ok(Self {
            tokens,
            annotations,
        })
    }

    /// Lists produced in lockstep by the tokenizer
    pub(crate) fn from_parts(tokens: Vec<String>, annotations: Vec<char>) -> Self {
        debug_assert_eq!(tokens.len(), annotations.len());
        Self {
            tokens,
            annotations,
        }
    }

    /// Consumed substrings
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Grammar symbols
    pub fn annotations(&self) -> &[char] {
        &self.annotations
    }

    /// `(token, symbol)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, char)> {
        self.tokens
            .iter()
            .map(String::as_str)
            .zip(self.annotations.iter().copied())
    }

    /// Concatenation of all tokens
    pub fn text(&self) -> String {
        self.tokens.concat()
    }
}

/// A word of a name together with its candidate tokenizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWord {
    /// Word text
    pub text: String,
    /// Role assigned by the word rule
    pub role: WordRole,
    /// Candidate tokenizations (always empty for literal words)
    pub tokenizations: Vec<ParseTokens>,
}

impl ParseWord {
    /// Untokenized word
    pub fn new(text: impl Into<String>, role: WordRole) -> Self {
        Self {
            text: text.into(),
            role,
            tokenizations: Vec::new(),
        }
    }
}

/// A whole name split into words under one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parse {
    /// The name
    pub name: String,
    /// Selected word rule
    pub rule: String,
    /// Words in order
    pub words: Vec<ParseWord>,
}

impl Parse {
    /// Whether the segmentation came from a fallback rather than a word rule
    pub fn is_fallback(&self) -> bool {
        self.rule == SIMPLE_RULE || self.rule == BINARY_OR_OTHER_RULE
    }
}
