//! Token kinds and output nodes

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical token kinds emitted by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    /// Position numbers, e.g. `2,3-`
    Locant,
    /// Numeric prefixes, e.g. `di`, `tetra`
    Multiplier,
    /// Chain length stems, e.g. `meth`, `but`
    AlkaneStem,
    /// Degree of saturation, e.g. `an`, `en`
    Unsaturator,
    /// Suffixes, e.g. `yl`, `ol`, `amine`
    Suffix,
    /// Standalone groups with a trivial name, e.g. `water`
    Group,
    /// Connective hyphens
    Hyphen,
    /// Elided or structural letters with no meaning of their own
    Connective,
    /// Zero-width boundary markers
    Boundary,
}

impl TokenKind {
    /// Tag name used in serialized output
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Locant => "locant",
            TokenKind::Multiplier => "multiplier",
            TokenKind::AlkaneStem => "alkaneStem",
            TokenKind::Unsaturator => "unsaturator",
            TokenKind::Suffix => "suffix",
            TokenKind::Group => "group",
            TokenKind::Hyphen => "hyphen",
            TokenKind::Connective => "connective",
            TokenKind::Boundary => "boundary",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What a registry entry turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTemplate {
    /// Token kind
    pub kind: TokenKind,
    /// Role/subrole/value attributes
    pub attributes: BTreeMap<String, String>,
    /// Consumes input and advances the automaton but produces no node
    pub suppressed: bool,
}

impl TokenTemplate {
    /// Template with no attributes
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            suppressed: false,
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Mark as suppressed
    pub fn suppressed(mut self) -> Self {
        self.suppressed = true;
        self
    }
}

/// Typed token in an output tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenNode {
    /// Token kind
    pub kind: TokenKind,
    /// Text as it appeared in the name
    pub text: String,
    /// Attributes copied from the registry entry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl TokenNode {
    /// Attribute lookup
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}
