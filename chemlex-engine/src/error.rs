//! Layered error types
//!
//! Core failures are wrapped unchanged; the engine adds configuration,
//! I/O and explosion-guard failures on top.

use chemlex_core::CoreError;
use thiserror::Error;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Core algorithm or grammar error
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A word has more tokenizations than the configured ceiling
    #[error("word `{word}` is too ambiguous: {count} tokenizations exceed the limit of {limit}")]
    TooAmbiguous {
        /// The offending word, or the whole name when combinations overflow
        word: String,
        /// Number of tokenizations found
        count: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// No embedded grammar with this name
    #[error("grammar '{0}' not available")]
    UnknownGrammar(String),

    /// Configuration error
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Engine invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether this is the explosion guard
    pub fn is_too_ambiguous(&self) -> bool {
        matches!(self, EngineError::TooAmbiguous { .. })
    }

    /// Whether this signals a grammar or implementation bug rather than bad input
    pub fn is_internal(&self) -> bool {
        match self {
            EngineError::Core(e) => e.is_internal(),
            EngineError::Internal(_) => true,
            _ => false,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::IoError(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
