//! Automaton-driven lexical front end for chemical names
//!
//! This crate holds the deterministic core of the name parser: a small
//! regex-to-DFA compiler over grammar symbols, the token registry, an
//! exhaustive backtracking word tokenizer and the word grammar selector that
//! splits a whole name into role-labelled words. Nothing here performs I/O;
//! loading grammars from configuration lives in `chemlex-engine`.
//!
//! # Example
//!
//! ```rust
//! use chemlex_core::automaton::compile;
//! use chemlex_core::registry::{TokenKind, TokenRegistry, TokenTemplate};
//! use chemlex_core::tokenizer::{Tokenizer, TokenizerSymbols};
//!
//! let registry = TokenRegistry::builder()
//!     .literal('a', "eth", TokenTemplate::new(TokenKind::AlkaneStem))
//!     .literal('u', "an", TokenTemplate::new(TokenKind::Unsaturator))
//!     .literal('e', "e", TokenTemplate::new(TokenKind::Connective).suppressed())
//!     .build()
//!     .unwrap();
//! let symbols = TokenizerSymbols::default();
//! let dfa = compile("aue").unwrap();
//!
//! let result = Tokenizer::new(&registry, &symbols).tokenize("Ethane", &dfa);
//! assert_eq!(result.results.len(), 1);
//! assert_eq!(result.results[0].annotations(), &['a', 'u', 'e']);
//! ```

pub mod automaton;
pub mod error;
pub mod macros;
pub mod parse;
pub mod registry;
pub mod tokenizer;
pub mod word_rules;

pub use automaton::{compile, get_or_compile, AutomatonCache, CacheError, Dfa, MemoryCache, NoCache};
pub use error::{CoreError, Result};
pub use parse::{Parse, ParseTokens, ParseWord, WordRole, BINARY_OR_OTHER_RULE, SIMPLE_RULE};
pub use registry::{TokenKind, TokenNode, TokenRegistry, TokenTemplate};
pub use tokenizer::{Tokenization, Tokenizer, TokenizerSymbols};
pub use word_rules::{WordRule, WordRules};
