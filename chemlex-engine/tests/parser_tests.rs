//! End-to-end parsing with the default grammar

use chemlex_engine::{
    ChunkKind, MemoryCache, NameParser, OutputTree, WordContent, WordRole,
};
use std::sync::Arc;

fn parser() -> NameParser {
    NameParser::new().unwrap()
}

fn roles(tree: &OutputTree) -> Vec<(&str, WordRole)> {
    tree.words
        .iter()
        .map(|w| (w.text.as_str(), w.role))
        .collect()
}

#[test]
fn test_ambiguous_substituent_boundary() {
    let trees = parser().parse("ethylmethylamine").unwrap();
    assert_eq!(trees.len(), 2);
    assert!(trees.iter().all(|t| t.rule == "simple"));

    // `...meth` + `ylamine` needs fewer nodes than `...methyl` + `amine`
    assert_eq!(trees[0].words[0].chunks().len(), 2);
    assert_eq!(trees[0].words[0].chunks()[1].text(), "methylamine");
    assert_eq!(trees[1].words[0].chunks().len(), 3);
    assert_eq!(trees[1].words[0].chunks()[2].text(), "amine");
    assert!(trees[0].node_count() < trees[1].node_count());
}

#[test]
fn test_hydrocarbon_rule_not_simple() {
    let parser = parser();
    let parse = parser.segment("2,3-dimethylbutane").unwrap();
    assert_eq!(parse.rule, "hydrocarbon");
    assert!(!parse.is_fallback());

    let trees = parser.parse("2,3-dimethylbutane").unwrap();
    assert_eq!(trees.len(), 1);
    let head = trees[0].words[0].chunks().last().unwrap();
    assert_eq!(head.kind, ChunkKind::Head);
}

#[test]
fn test_two_unrelated_words_fall_back() {
    let trees = parser().parse("water ammonia").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].rule, "binaryOrOther");
    assert_eq!(
        roles(&trees[0]),
        vec![("water", WordRole::Full), ("ammonia", WordRole::Full)]
    );
}

#[test]
fn test_acid_keeps_literal_word() {
    let trees = parser().parse("Ethanoic Acid").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].rule, "acid");
    assert_eq!(
        trees[0].words[1].content,
        WordContent::Text("Acid".to_string())
    );
    let head = &trees[0].words[0].chunks()[0];
    assert_eq!(head.text(), "Ethanoic");
    assert_eq!(head.tokens[0].attribute("value"), Some("2"));
}

#[test]
fn test_functional_class_name() {
    let trees = parser().parse("ethyl chloride").unwrap();
    assert_eq!(trees[0].rule, "functionalClass");
    assert_eq!(
        roles(&trees[0]),
        vec![
            ("ethyl", WordRole::Substituent),
            ("chloride", WordRole::Literal)
        ]
    );
}

#[test]
fn test_internal_locants() {
    let parser = parser();
    assert_eq!(parser.parse("but-2-ene").unwrap().len(), 1);

    let trees = parser.parse("propan-2-ol").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].rule, "simple");
    let tokens = &trees[0].words[0].chunks()[0].tokens;
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["prop", "an", "2-", "ol"]);
}

#[test]
fn test_hyphen_elided_compound_is_merged() {
    let trees = parser().parse("methyl amine").unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].words.len(), 1);
    assert_eq!(trees[0].words[0].text, "methyl-amine");
}

#[test]
fn test_unparseable_names_are_empty_not_errors() {
    let parser = parser();
    assert!(parser.parse("").unwrap().is_empty());
    assert!(parser.parse("xyzzy").unwrap().is_empty());
    assert!(parser.parse("ethyl xyzzy").unwrap().is_empty());
}

#[test]
fn test_parse_all_matches_parse() {
    let parser = parser();
    let names = ["ethylmethylamine", "water ammonia", "xyzzy", "ethanoic acid"];
    let batch = parser.parse_all(&names);
    assert_eq!(batch.len(), names.len());
    for (name, result) in names.iter().zip(batch) {
        assert_eq!(result.unwrap(), parser.parse(name).unwrap());
    }
}

#[test]
fn test_shared_cache_and_context() {
    let cache = Arc::new(MemoryCache::new());
    let first = NameParser::builder().cache(cache.clone()).build().unwrap();
    let second = NameParser::builder().cache(cache.clone()).build().unwrap();
    assert_eq!(cache.len(), 3);
    assert_eq!(
        first.parse("methyl ethanoate").unwrap(),
        second.parse("methyl ethanoate").unwrap()
    );

    let shared = NameParser::builder()
        .context(Arc::new(
            chemlex_engine::GrammarContext::from_config(
                &chemlex_engine::default_grammar().unwrap(),
                cache.as_ref(),
            )
            .unwrap(),
        ))
        .build()
        .unwrap();
    assert_eq!(shared.context().name(), "default");
}

#[test]
fn test_json_output() {
    let trees = parser().parse("ethanoic acid").unwrap();
    let json = serde_json::to_string(&trees).unwrap();
    assert!(json.contains("\"rule\":\"acid\""));
    assert!(json.contains("\"alkaneStem\""));
}
