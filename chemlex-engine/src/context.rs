//! Immutable grammar bundle shared by every parse

use chemlex_core::automaton::{get_or_compile, AutomatonCache, Dfa};
use chemlex_core::registry::{TokenDecl, TokenMatcher, TokenRegistry, TokenTemplate};
use chemlex_core::tokenizer::{Tokenizer, TokenizerSymbols};
use chemlex_core::{TokenKind, WordRole, WordRule, WordRules};
use tracing::{debug, info};

use crate::config::{GrammarConfig, TokenGroupConfig};
use crate::error::{EngineError, Result};

/// Compiled automata, token registry and word rules
///
/// Built once and only read afterwards, so it can be shared freely across
/// threads.
#[derive(Debug)]
pub struct GrammarContext {
    name: String,
    registry: TokenRegistry,
    substituent: Dfa,
    full: Dfa,
    word_rules: WordRules,
    symbols: TokenizerSymbols,
    end_of_substituent: Option<char>,
    end_of_main_group: Option<char>,
}

impl GrammarContext {
    /// Compile a validated configuration, reusing cached automata when possible
    pub fn from_config(config: &GrammarConfig, cache: &dyn AutomatonCache) -> Result<Self> {
        config.validate()?;
        let name = config.metadata.name.clone();

        let registry = TokenRegistry::from_decls(config.tokens.iter().flat_map(declarations))?;

        let compile_role = |role: WordRole| -> Result<Dfa> {
            let text = config.expanded_grammar(role)?.ok_or_else(|| {
                EngineError::Internal(format!("no grammar for role {role}"))
            })?;
            Ok(get_or_compile(&format!("{name}.{role}"), &text, cache)?)
        };
        let substituent = compile_role(WordRole::Substituent)?;
        let full = compile_role(WordRole::Full)?;

        let rules = config
            .word_rules
            .iter()
            .map(|rule| WordRule::new(rule.name.as_str(), &rule.regex, rule.roles.clone()))
            .collect::<chemlex_core::Result<Vec<_>>>()?;
        let word_rules = WordRules::new(rules, cache)?;

        let symbols = TokenizerSymbols {
            end_of_word: config.symbols.end_of_word,
            inter_word_hyphen: config.symbols.inter_word_hyphen,
            zero_width: config
                .tokens
                .iter()
                .filter(|group| group.tag == TokenKind::Boundary)
                .map(|group| group.symbol)
                .collect(),
        };

        info!(
            grammar = %name,
            symbols = registry.symbols().len(),
            word_rules = word_rules.rules().len(),
            "grammar context ready"
        );
        debug!(
            substituent_states = substituent.state_count(),
            full_states = full.state_count(),
            "compiled word automata"
        );

        Ok(Self {
            name,
            registry,
            substituent,
            full,
            word_rules,
            symbols,
            end_of_substituent: config.symbols.end_of_substituent,
            end_of_main_group: config.symbols.end_of_main_group,
        })
    }

    /// Grammar name from the configuration metadata
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Automaton for words of `role`; literal words have none
    pub fn automaton(&self, role: WordRole) -> Option<&Dfa> {
        match role {
            WordRole::Literal => None,
            WordRole::Substituent => Some(&self.substituent),
            WordRole::Full => Some(&self.full),
        }
    }

    /// Token declarations of this grammar
    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    /// Compiled word rules
    pub fn word_rules(&self) -> &WordRules {
        &self.word_rules
    }

    /// Designated symbols seen by the tokenizer
    pub fn tokenizer_symbols(&self) -> &TokenizerSymbols {
        &self.symbols
    }

    /// Tokenizer bound to this grammar's registry
    pub fn tokenizer(&self) -> Tokenizer<'_> {
        Tokenizer::new(&self.registry, &self.symbols)
    }

    /// Symbol closing a substituent chunk
    pub fn end_of_substituent(&self) -> Option<char> {
        self.end_of_substituent
    }

    /// Symbol closing the head chunk
    pub fn end_of_main_group(&self) -> Option<char> {
        self.end_of_main_group
    }
}

fn declarations(group: &TokenGroupConfig) -> Vec<TokenDecl> {
    let mut template = TokenTemplate::new(group.tag);
    if let Some(token_type) = &group.token_type {
        template = template.with_attribute("type", token_type.as_str());
    }
    if let Some(subtype) = &group.subtype {
        template = template.with_attribute("subtype", subtype.as_str());
    }
    if group.suppressed {
        template = template.suppressed();
    }

    let literals = group.literals.iter().map(|literal| {
        let template = match literal.value() {
            Some(value) => template.clone().with_attribute("value", value),
            None => template.clone(),
        };
        TokenDecl {
            symbol: group.symbol,
            matcher: TokenMatcher::Literal(literal.text().to_string()),
            template,
        }
    });
    let patterns = group.patterns.iter().map(|pattern| TokenDecl {
        symbol: group.symbol,
        matcher: TokenMatcher::Pattern(pattern.clone()),
        template: template.clone(),
    });
    literals.chain(patterns).collect()
}
