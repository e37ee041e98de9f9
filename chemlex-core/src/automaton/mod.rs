//! Automaton compiler
//!
//! Grammar text → [`syntax::Ast`] → Thompson NFA → [`Dfa`]. Compilation is a
//! pure function of its input.

pub mod cache;
pub mod dfa;
mod nfa;
pub mod syntax;

pub use cache::{get_or_build, get_or_compile, AutomatonCache, CacheError, MemoryCache, NoCache};
pub use dfa::{Dfa, StateId, Transition};
pub use syntax::{Ast, CharSet, Syntax};

use crate::error::Result;
use nfa::Nfa;

/// First code point of the block reserved for internal marker symbols
pub const RESERVED_START: char = '\u{E000}';
/// Last code point of the reserved block
pub const RESERVED_END: char = '\u{E0FF}';

/// Compile grammar text, rejecting constructs a DFA cannot express
pub fn compile(grammar: &str) -> Result<Dfa> {
    let parsed = syntax::parse(grammar, Syntax::Strict)?;
    Ok(compile_ast(&parsed.ast))
}

/// Compile an already parsed tree
pub fn compile_ast(ast: &Ast) -> Dfa {
    let (nfa, start, accept) = Nfa::build(ast);
    nfa.determinize(start, accept)
}
