//! Content-addressed automaton cache
//!
//! Compiling grammars is deterministic, so a compiled [`Dfa`] can be reused
//! whenever the grammar text is byte-for-byte identical. The cache itself is
//! an external concern; failures there never prevent compilation.

use std::collections::HashMap;
use std::sync::RwLock;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::automaton::{compile, Dfa};
use crate::error::Result;

/// Cache-side failures (always recoverable)
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store could not be reached
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The stored entry could not be decoded
    #[error("corrupt cache entry `{key}`: {reason}")]
    Corrupt {
        /// Entry key
        key: String,
        /// Decoding failure
        reason: String,
    },
}

/// Key/value store for compiled automata
pub trait AutomatonCache: Send + Sync {
    /// Look up a previously stored automaton
    fn get(&self, key: &str) -> std::result::Result<Option<Dfa>, CacheError>;

    /// Offer an automaton for storage
    fn put(&self, key: &str, dfa: &Dfa) -> std::result::Result<(), CacheError>;
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl AutomatonCache for NoCache {
    fn get(&self, _key: &str) -> std::result::Result<Option<Dfa>, CacheError> {
        Ok(None)
    }

    fn put(&self, _key: &str, _dfa: &Dfa) -> std::result::Result<(), CacheError> {
        Ok(())
    }
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Dfa>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored automata
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AutomatonCache for MemoryCache {
    fn get(&self, key: &str) -> std::result::Result<Option<Dfa>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, dfa: &Dfa) -> std::result::Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), dfa.clone());
        Ok(())
    }
}

/// Hex SHA-256 of grammar text
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Cache key for a named grammar
pub fn cache_key(name: &str, text: &str) -> String {
    format!("{name}:{}", content_hash(text))
}

/// Fetch the automaton for `text` from the cache, compiling it on a miss
pub fn get_or_compile(name: &str, text: &str, cache: &dyn AutomatonCache) -> Result<Dfa> {
    get_or_build(name, text, cache, || compile(text))
}

/// Like [`get_or_compile`] with a custom build step; `text` is only hashed
pub fn get_or_build<F>(name: &str, text: &str, cache: &dyn AutomatonCache, build: F) -> Result<Dfa>
where
    F: FnOnce() -> Result<Dfa>,
{
    let key = cache_key(name, text);
    match cache.get(&key) {
        Ok(Some(dfa)) => match dfa.validate() {
            Ok(()) => {
                debug!(grammar = name, "automaton cache hit");
                return Ok(dfa);
            }
            Err(e) => warn!(grammar = name, error = %e, "discarding corrupt cached automaton"),
        },
        Ok(None) => debug!(grammar = name, "automaton cache miss"),
        Err(e) => warn!(grammar = name, error = %e, "automaton cache lookup failed"),
    }

    let dfa = build()?;
    if let Err(e) = cache.put(&key, &dfa) {
        warn!(grammar = name, error = %e, "failed to store compiled automaton");
    }
    Ok(dfa)
}
