//! Core error types (deterministic only)

use thiserror::Error;

/// Core errors: grammar configuration problems and internal invariant violations.
///
/// Ordinary lexical failure (a word that does not tokenize, a name that matches
/// no word rule) is not represented here; it surfaces as an empty result.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Grammar text could not be parsed
    #[error("malformed grammar at offset {offset} in `{pattern}`: {reason}")]
    MalformedGrammar {
        /// The offending grammar text
        pattern: String,
        /// Byte offset of the problem
        offset: usize,
        /// What went wrong
        reason: String,
    },

    /// A `%name%` reference with no definition
    #[error("undefined macro `%{name}%`")]
    UndefinedMacro {
        /// Macro name
        name: String,
    },

    /// A macro that expands to itself
    #[error("macro `%{name}%` is defined in terms of itself")]
    RecursiveMacro {
        /// Macro name
        name: String,
    },

    /// A token pattern rejected by the regex engine
    #[error("invalid pattern `{pattern}` for symbol '{symbol}': {source}")]
    InvalidTokenPattern {
        /// Grammar symbol the pattern was declared under
        symbol: char,
        /// The pattern text
        pattern: String,
        /// Regex engine error
        #[source]
        source: regex::Error,
    },

    /// A word rule whose regex is rejected by the regex engine
    #[error("invalid word rule `{name}`: {source}")]
    InvalidWordRule {
        /// Rule name
        name: String,
        /// Regex engine error
        #[source]
        source: fancy_regex::Error,
    },

    /// A word rule regex that gave up while matching (backtrack limit)
    #[error("word rule `{name}` failed while matching: {source}")]
    WordRuleMatch {
        /// Rule name
        name: String,
        /// Regex engine error
        #[source]
        source: fancy_regex::Error,
    },

    /// Two word rules with the same name
    #[error("duplicate word rule `{0}`")]
    DuplicateWordRule(String),

    /// A word rule labels more words than it captures
    #[error("word rule `{name}` labels {labels} words but captures only {groups}")]
    TooManyRoleLabels {
        /// Rule name
        name: String,
        /// Number of role labels
        labels: usize,
        /// Number of capture groups
        groups: usize,
    },

    /// An automaton with dangling state references
    #[error("corrupt automaton: {0}")]
    CorruptAutomaton(String),

    /// No registry entry produces a node for this token
    #[error("no token registered for `{text}` under symbol '{symbol}'")]
    UnknownToken {
        /// Token text
        text: String,
        /// Annotation symbol
        symbol: char,
    },

    /// Tokens and annotations out of step
    #[error("{tokens} tokens but {annotations} annotations")]
    MismatchedAnnotations {
        /// Token count
        tokens: usize,
        /// Annotation count
        annotations: usize,
    },

    /// The combined word-rule automaton and a rule's true regex disagree
    #[error("word rule `{rule}` accepted by the automaton at offset {offset} but rejected by its regex")]
    AutomatonDivergence {
        /// Rule name
        rule: String,
        /// Start offset in the name
        offset: usize,
    },
}

impl CoreError {
    /// Whether this error signals an implementation or grammar bug rather than
    /// a configuration mistake
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownToken { .. }
                | CoreError::MismatchedAnnotations { .. }
                | CoreError::AutomatonDivergence { .. }
        )
    }

    pub(crate) fn malformed(pattern: &str, offset: usize, reason: impl Into<String>) -> Self {
        CoreError::MalformedGrammar {
            pattern: pattern.to_string(),
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        let divergence = CoreError::AutomatonDivergence {
            rule: "ester".to_string(),
            offset: 0,
        };
        assert!(divergence.is_internal());

        let config = CoreError::UndefinedMacro {
            name: "locant".to_string(),
        };
        assert!(!config.is_internal());
    }

    #[test]
    fn test_display_messages() {
        let error = CoreError::malformed("(ab", 3, "unclosed group");
        assert_eq!(
            error.to_string(),
            "malformed grammar at offset 3 in `(ab`: unclosed group"
        );

        let error = CoreError::UndefinedMacro {
            name: "stem".to_string(),
        };
        assert_eq!(error.to_string(), "undefined macro `%stem%`");
    }
}
