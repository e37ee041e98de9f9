//! Grammar loading and ranked parsing of chemical names
//!
//! This crate wires the deterministic pieces of `chemlex-core` together: it
//! reads grammar configurations, compiles them once into an immutable
//! [`GrammarContext`] and exposes [`NameParser`], which turns a name into a
//! ranked list of [`OutputTree`]s.
//!
//! # Example
//!
//! ```rust
//! use chemlex_engine::NameParser;
//!
//! let parser = NameParser::new().unwrap();
//! let trees = parser.parse("2,3-dimethylbutane").unwrap();
//! assert_eq!(trees[0].rule, "hydrocarbon");
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod loader;
pub mod output;
pub mod parser;

pub use config::{GrammarConfig, DEFAULT_MAX_TOKENIZATIONS};
pub use context::GrammarContext;
pub use error::{EngineError, Result};
pub use loader::{default_grammar, embedded_grammar, grammar_from_path, grammar_from_str};
pub use output::{ChunkKind, ChunkNode, OutputTree, WordContent, WordNode};
pub use parser::{NameParser, NameParserBuilder, ParserConfig};

// Re-export from core for convenience
pub use chemlex_core::{
    AutomatonCache, MemoryCache, NoCache, Parse, ParseTokens, ParseWord, TokenKind, TokenNode,
    WordRole,
};
