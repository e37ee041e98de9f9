//! Property tests for the automaton compiler and the word tokenizer

use chemlex_core::automaton::compile;
use chemlex_core::registry::{TokenKind, TokenRegistry, TokenTemplate};
use chemlex_core::tokenizer::{Tokenizer, TokenizerSymbols};
use proptest::prelude::*;

const PIECES: &[&str] = &[
    "a", "b", "c", "(?:a|b)", "c*", "d?", "[a-c]+", "(?:ab)*", "e{1,2}", "[^a]",
];

fn grammar() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 1..6).prop_map(|parts| parts.concat())
}

fn chemical_registry() -> TokenRegistry {
    let stem = TokenTemplate::new(TokenKind::AlkaneStem);
    TokenRegistry::builder()
        .literal('a', "meth", stem.clone())
        .literal('a', "eth", stem.clone())
        .literal('a', "prop", stem.clone())
        .literal('a', "but", stem)
        .literal('m', "di", TokenTemplate::new(TokenKind::Multiplier))
        .literal('m', "tri", TokenTemplate::new(TokenKind::Multiplier))
        .literal('u', "an", TokenTemplate::new(TokenKind::Unsaturator))
        .literal('u', "en", TokenTemplate::new(TokenKind::Unsaturator))
        .literal('y', "yl", TokenTemplate::new(TokenKind::Suffix))
        .literal('f', "ol", TokenTemplate::new(TokenKind::Suffix))
        .literal('g', "amine", TokenTemplate::new(TokenKind::Group))
        .literal('f', "ylamine", TokenTemplate::new(TokenKind::Suffix))
        .literal('e', "e", TokenTemplate::new(TokenKind::Connective).suppressed())
        .pattern('l', r"[1-9][0-9]*-", TokenTemplate::new(TokenKind::Locant))
        .pattern('S', "", TokenTemplate::new(TokenKind::Boundary).suppressed())
        .build()
        .unwrap()
}

const FULL: &str = "(?:l?m?a(?:u)?yS)*(?:l?a(?:u)?(?:f|e)|g)W";

const WORD_PIECES: &[&str] = &[
    "meth", "Eth", "prop", "but", "di", "an", "en", "yl", "ol", "e", "amine", "2-", "ETH",
];

fn word() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORD_PIECES), 0..7).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn compile_is_deterministic(grammar in grammar(), input in "[a-e]{0,8}") {
        let first = compile(&grammar).unwrap();
        let second = compile(&grammar).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.accepts(input.chars()), second.accepts(input.chars()));
        prop_assert!(first.validate().is_ok());
    }

    #[test]
    fn tokenizations_reconstruct_word(word in word()) {
        let registry = chemical_registry();
        let symbols = TokenizerSymbols {
            end_of_word: Some('W'),
            inter_word_hyphen: None,
            zero_width: vec!['S'],
        };
        let dfa = compile(FULL).unwrap();
        let result = Tokenizer::new(&registry, &symbols).tokenize(&word, &dfa);

        for parse in &result.results {
            prop_assert_eq!(parse.tokens().len(), parse.annotations().len());
            prop_assert_eq!(parse.text().to_lowercase(), word.to_lowercase());
            prop_assert!(dfa.accepts(parse.annotations().iter().copied()));
        }
    }

    #[test]
    fn tokenize_never_duplicates_results(word in word()) {
        let registry = chemical_registry();
        let symbols = TokenizerSymbols {
            end_of_word: Some('W'),
            inter_word_hyphen: None,
            zero_width: vec!['S'],
        };
        let dfa = compile(FULL).unwrap();
        let result = Tokenizer::new(&registry, &symbols).tokenize(&word, &dfa);

        let mut seen = std::collections::HashSet::new();
        for parse in &result.results {
            prop_assert!(seen.insert(parse.clone()));
        }
    }
}

#[test]
fn known_word_lexes() {
    let registry = chemical_registry();
    let symbols = TokenizerSymbols {
        end_of_word: Some('W'),
        inter_word_hyphen: None,
        zero_width: vec!['S'],
    };
    let dfa = compile(FULL).unwrap();
    let result = Tokenizer::new(&registry, &symbols).tokenize("2-methylpropane", &dfa);
    assert_eq!(result.results.len(), 1);
    assert_eq!(
        result.results[0].annotations(),
        &['l', 'a', 'y', 'S', 'a', 'u', 'e', 'W']
    );
}
