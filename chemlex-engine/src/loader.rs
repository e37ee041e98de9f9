//! Grammar sources: embedded defaults, files and strings

use std::path::Path;

use tracing::debug;

use crate::config::GrammarConfig;
use crate::error::{EngineError, Result};

macro_rules! embed_grammar {
    ($name:expr, $path:expr) => {
        ($name, include_str!($path))
    };
}

const EMBEDDED_GRAMMARS: &[(&str, &str)] =
    &[embed_grammar!("default", "../configs/grammar/default.toml")];

/// Names of the grammars compiled into the crate
pub fn available_grammars() -> Vec<&'static str> {
    EMBEDDED_GRAMMARS.iter().map(|(name, _)| *name).collect()
}

/// Load and validate an embedded grammar
pub fn embedded_grammar(name: &str) -> Result<GrammarConfig> {
    let (_, text) = EMBEDDED_GRAMMARS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| EngineError::UnknownGrammar(name.to_string()))?;

    let config = GrammarConfig::from_toml_str(text)?;
    if config.metadata.name != name {
        return Err(EngineError::ConfigError(format!(
            "grammar name mismatch: expected {name}, got {}",
            config.metadata.name
        )));
    }
    config.validate()?;
    Ok(config)
}

/// The default chemical grammar
pub fn default_grammar() -> Result<GrammarConfig> {
    embedded_grammar("default")
}

/// Load and validate a grammar from TOML text
pub fn grammar_from_str(text: &str) -> Result<GrammarConfig> {
    let config = GrammarConfig::from_toml_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a grammar file
pub fn grammar_from_path(path: impl AsRef<Path>) -> Result<GrammarConfig> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading grammar file");
    let text = std::fs::read_to_string(path)?;
    grammar_from_str(&text).map_err(|e| match e {
        EngineError::ConfigError(msg) => {
            EngineError::ConfigError(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grammar_loads() {
        let config = default_grammar().unwrap();
        assert_eq!(config.metadata.name, "default");
        assert_eq!(config.symbols.end_of_word, Some('W'));
        assert_eq!(config.word_rules.len(), 4);
    }

    #[test]
    fn test_unknown_grammar() {
        match embedded_grammar("nonexistent") {
            Err(EngineError::UnknownGrammar(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected UnknownGrammar, got {other:?}"),
        }
    }

    #[test]
    fn test_available_grammars() {
        assert_eq!(available_grammars(), vec!["default"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = grammar_from_path("/nonexistent/grammar.toml");
        assert!(matches!(result, Err(EngineError::IoError(_))));
    }
}
