//! Word grammar selector
//!
//! All word rules are compiled into one automaton over the characters of a
//! name. Rule `i` is followed by a marker, the decimal digits of `i` and a
//! terminator, each drawn from the reserved private-use block, so walking the
//! automaton over a prefix and then over the marker reveals every rule whose
//! language contains that prefix. Candidates are confirmed with the rule's
//! full regex before being accepted.

use std::collections::HashSet;

use fancy_regex::Regex;
use tracing::{debug, trace};

use crate::automaton::syntax::{self, Ast, CharSet, Syntax};
use crate::automaton::{compile_ast, get_or_build, AutomatonCache, Dfa, StateId};
use crate::error::{CoreError, Result};
use crate::parse::{Parse, ParseWord, WordRole, BINARY_OR_OTHER_RULE, SIMPLE_RULE};
use crate::registry::{fold_case, fold_char};

/// Separates a rule's language from its id
const RULE_MARKER: char = '\u{E000}';
/// Closes a rule id
const RULE_END: char = '\u{E001}';
/// Symbol for decimal digit 0; digits 1..=9 follow contiguously
const RULE_DIGIT_ZERO: u32 = 0xE010;

/// Cache name for the combined automaton
const COMBINED_NAME: &str = "word_rules";

/// Class ranges wider than this are not case-folded member by member
const FOLD_SPAN: u32 = 0x1000;

fn digit_symbol(digit: usize) -> char {
    char::from_u32(RULE_DIGIT_ZERO + digit as u32).unwrap_or(RULE_END)
}

fn id_symbols(id: usize) -> Vec<char> {
    id.to_string()
        .bytes()
        .map(|b| digit_symbol(usize::from(b - b'0')))
        .collect()
}

/// A named pattern over a whole name, labelling its capture groups with roles
#[derive(Debug, Clone)]
pub struct WordRule {
    name: String,
    pattern: String,
    roles: Vec<WordRole>,
    regex: Regex,
    ast: Ast,
    approximate: bool,
}

impl WordRule {
    /// Compile a rule
    ///
    /// The regex is matched case-insensitively and may use look-around.
    /// Constructs the automaton cannot express are dropped from its copy of
    /// the rule and the rule is marked as [approximate](Self::is_approximate).
    pub fn new(name: impl Into<String>, pattern: &str, roles: Vec<WordRole>) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(&format!("(?i)(?:{pattern})")).map_err(|source| {
            CoreError::InvalidWordRule {
                name: name.clone(),
                source,
            }
        })?;

        let groups = regex.captures_len() - 1;
        if roles.len() > groups {
            return Err(CoreError::TooManyRoleLabels {
                name,
                labels: roles.len(),
                groups,
            });
        }

        let parsed = syntax::parse(pattern, Syntax::Relaxed)?;
        Ok(Self {
            name,
            pattern: pattern.to_string(),
            roles,
            regex,
            ast: fold_ast(parsed.ast),
            approximate: parsed.approximate,
        })
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source regex
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Role labels for the capture groups, in order
    pub fn roles(&self) -> &[WordRole] {
        &self.roles
    }

    /// Whether the automaton only over-approximates this rule
    pub fn is_approximate(&self) -> bool {
        self.approximate
    }

    fn role(&self, group: usize) -> WordRole {
        self.roles.get(group).copied().unwrap_or(WordRole::Full)
    }
}

/// Every word rule, in priority order, with their combined automaton
#[derive(Debug, Clone)]
pub struct WordRules {
    rules: Vec<WordRule>,
    dfa: Dfa,
    id_width: usize,
}

impl WordRules {
    /// Combine rules; earlier rules win ties
    pub fn new(rules: Vec<WordRule>, cache: &dyn AutomatonCache) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(CoreError::DuplicateWordRule(rule.name.clone()));
            }
        }

        let canonical: String = rules
            .iter()
            .map(|rule| format!("{}\u{1f}{}\n", rule.name, rule.pattern))
            .collect();
        let dfa = get_or_build(COMBINED_NAME, &canonical, cache, || {
            Ok(compile_ast(&combined_ast(&rules)))
        })?;

        let id_width = rules.len().saturating_sub(1).to_string().len();
        debug!(
            rules = rules.len(),
            states = dfa.state_count(),
            "word rule automaton ready"
        );
        Ok(Self {
            rules,
            dfa,
            id_width,
        })
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[WordRule] {
        &self.rules
    }

    /// The combined automaton
    pub fn automaton(&self) -> &Dfa {
        &self.dfa
    }

    /// Split `name` into role-labelled words under the most specific rule
    /// that matches, falling back to `simple` / `binaryOrOther`
    pub fn segment(&self, name: &str) -> Result<Parse> {
        let folded = fold_case(name);
        let mut tried = HashSet::new();

        for offset in start_offsets(name) {
            let ends = self.marker_ends(&folded[offset..]);
            trace!(offset, candidates = ends.len(), "probing word rules");

            for (_, state) in ends.into_iter().rev() {
                for id in self.rule_ids(state) {
                    if !tried.insert((offset, id)) {
                        continue;
                    }
                    if let Some(parse) = self.verify(name, offset, id)? {
                        debug!(name, rule = %parse.rule, offset, "word rule selected");
                        return Ok(parse);
                    }
                }
            }
        }

        Ok(fallback(name))
    }

    /// `(prefix length, state)` for every prefix after which a rule may end,
    /// shortest first
    fn marker_ends(&self, text: &str) -> Vec<(usize, StateId)> {
        let dfa = &self.dfa;
        let mut ends = Vec::new();
        let mut state = dfa.initial();
        if let Some(next) = dfa.step(state, RULE_MARKER) {
            ends.push((0, next));
        }
        for (index, ch) in text.char_indices() {
            let Some(next) = dfa.step(state, ch) else {
                break;
            };
            state = next;
            if let Some(marked) = dfa.step(state, RULE_MARKER) {
                ends.push((index + ch.len_utf8(), marked));
            }
        }
        ends
    }

    /// Rule ids spelled out from a post-marker state, ascending
    fn rule_ids(&self, state: StateId) -> Vec<usize> {
        let mut ids = Vec::new();
        self.collect_ids(state, 0, 0, &mut ids);
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn collect_ids(&self, state: StateId, value: usize, depth: usize, ids: &mut Vec<usize>) {
        if depth > 0 {
            if let Some(end) = self.dfa.step(state, RULE_END) {
                if self.dfa.is_accept(end) && value < self.rules.len() {
                    ids.push(value);
                }
            }
        }
        if depth == self.id_width {
            return;
        }
        for digit in 0..10 {
            if let Some(next) = self.dfa.step(state, digit_symbol(digit)) {
                self.collect_ids(next, value * 10 + digit, depth + 1, ids);
            }
        }
    }

    fn verify(&self, name: &str, offset: usize, id: usize) -> Result<Option<Parse>> {
        let rule = &self.rules[id];
        // Searching the whole name keeps look-behind able to see earlier words
        let captures = rule
            .regex
            .captures_from_pos(name, offset)
            .map_err(|source| CoreError::WordRuleMatch {
                name: rule.name.clone(),
                source,
            })?
            .filter(|captures| captures.get(0).is_some_and(|m| m.start() == offset));
        let Some(captures) = captures else {
            if rule.approximate {
                trace!(rule = %rule.name, offset, "approximate rule rejected by regex");
                return Ok(None);
            }
            return Err(CoreError::AutomatonDivergence {
                rule: rule.name.clone(),
                offset,
            });
        };

        let end = captures.get(0).map_or(offset, |m| m.end());
        if end < name.len() && !name[end..].starts_with(' ') {
            trace!(rule = %rule.name, offset, end, "rule match ends mid-word");
            return Ok(None);
        }

        let mut words: Vec<ParseWord> = full_words(&name[..offset]).collect();
        for group in 1..captures.len() {
            if let Some(m) = captures.get(group) {
                words.push(ParseWord::new(m.as_str(), rule.role(group - 1)));
            }
        }
        words.extend(full_words(&name[end..]));

        Ok(Some(Parse {
            name: name.to_string(),
            rule: rule.name.clone(),
            words,
        }))
    }
}

/// Names are folded before they reach the automaton, so every class also
/// admits the folded form of its members
fn fold_ast(ast: Ast) -> Ast {
    match ast {
        Ast::Class(set) => Ast::Class(fold_class(&set)),
        Ast::Concat(items) => Ast::Concat(items.into_iter().map(fold_ast).collect()),
        Ast::Alternate(items) => Ast::Alternate(items.into_iter().map(fold_ast).collect()),
        Ast::Repeat { inner, min, max } => Ast::Repeat {
            inner: Box::new(fold_ast(*inner)),
            min,
            max,
        },
        Ast::Empty => Ast::Empty,
    }
}

fn fold_class(set: &CharSet) -> CharSet {
    let mut ranges = set.ranges().to_vec();
    for &(lo, hi) in set.ranges() {
        if hi - lo > FOLD_SPAN {
            continue;
        }
        for ch in (lo..=hi).filter_map(char::from_u32) {
            let folded = fold_char(ch);
            if folded != ch {
                ranges.push((folded as u32, folded as u32));
            }
        }
    }
    CharSet::from_ranges(ranges)
}

fn combined_ast(rules: &[WordRule]) -> Ast {
    let symbol = |ch: char| Ast::Class(CharSet::single(ch));
    Ast::Alternate(
        rules
            .iter()
            .enumerate()
            .map(|(id, rule)| {
                let mut parts = vec![rule.ast.clone(), symbol(RULE_MARKER)];
                parts.extend(id_symbols(id).into_iter().map(symbol));
                parts.push(symbol(RULE_END));
                Ast::Concat(parts)
            })
            .collect(),
    )
}

fn start_offsets(name: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        name.char_indices()
            .filter(|&(_, ch)| ch == ' ')
            .map(|(index, _)| index + 1),
    )
}

fn full_words(text: &str) -> impl Iterator<Item = ParseWord> + '_ {
    text.split_whitespace()
        .map(|word| ParseWord::new(word, WordRole::Full))
}

fn fallback(name: &str) -> Parse {
    let trimmed = name.trim();
    let (rule, words) = if trimmed.contains(char::is_whitespace) {
        (BINARY_OR_OTHER_RULE, full_words(trimmed).collect())
    } else {
        (SIMPLE_RULE, vec![ParseWord::new(trimmed, WordRole::Full)])
    };
    debug!(name, rule, "no word rule matched");
    Parse {
        name: name.to_string(),
        rule: rule.to_string(),
        words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{MemoryCache, NoCache};

    fn rules() -> WordRules {
        use WordRole::*;
        WordRules::new(
            vec![
                WordRule::new("acid", r"([^ ]+ic) (acid)", vec![Full, Literal]).unwrap(),
                WordRule::new("ester", r"([^ ]+yl) ([^ ]+oate)", vec![Substituent, Full]).unwrap(),
                WordRule::new(
                    "functionalClass",
                    r"([^ ]+yl) (alcohol|chloride)",
                    vec![Substituent, Literal],
                )
                .unwrap(),
                WordRule::new("hydrocarbon", r"\b([^ ]*(?:an|en|yn)e)\b", vec![Full]).unwrap(),
            ],
            &NoCache,
        )
        .unwrap()
    }

    fn roles(parse: &Parse) -> Vec<(&str, WordRole)> {
        parse
            .words
            .iter()
            .map(|w| (w.text.as_str(), w.role))
            .collect()
    }

    #[test]
    fn test_acid_rule() {
        let parse = rules().segment("ethanoic acid").unwrap();
        assert_eq!(parse.rule, "acid");
        assert_eq!(
            roles(&parse),
            vec![("ethanoic", WordRole::Full), ("acid", WordRole::Literal)]
        );
    }

    #[test]
    fn test_case_insensitive_match_keeps_original_text() {
        let parse = rules().segment("Ethyl Chloride").unwrap();
        assert_eq!(parse.rule, "functionalClass");
        assert_eq!(
            roles(&parse),
            vec![("Ethyl", WordRole::Substituent), ("Chloride", WordRole::Literal)]
        );
    }

    #[test]
    fn test_ester_rule() {
        let parse = rules().segment("methyl ethanoate").unwrap();
        assert_eq!(parse.rule, "ester");
        assert_eq!(
            roles(&parse),
            vec![("methyl", WordRole::Substituent), ("ethanoate", WordRole::Full)]
        );
    }

    #[test]
    fn test_lower_id_wins_at_same_length() {
        let set = WordRules::new(
            vec![
                WordRule::new("specific", "(meth)(ane)", vec![WordRole::Full]).unwrap(),
                WordRule::new("generic", "([a-z]+)", vec![]).unwrap(),
            ],
            &NoCache,
        )
        .unwrap();
        let parse = set.segment("methane").unwrap();
        assert_eq!(parse.rule, "specific");
        assert_eq!(
            roles(&parse),
            vec![("meth", WordRole::Full), ("ane", WordRole::Full)]
        );
    }

    #[test]
    fn test_approximate_rule_single_word() {
        let parse = rules().segment("2,3-dimethylbutane").unwrap();
        assert_eq!(parse.rule, "hydrocarbon");
        assert_eq!(roles(&parse), vec![("2,3-dimethylbutane", WordRole::Full)]);
        assert!(rules().rules()[3].is_approximate());
    }

    #[test]
    fn test_match_at_later_offset_keeps_leading_words() {
        let parse = rules().segment("crude butane").unwrap();
        assert_eq!(parse.rule, "hydrocarbon");
        assert_eq!(
            roles(&parse),
            vec![("crude", WordRole::Full), ("butane", WordRole::Full)]
        );
    }

    #[test]
    fn test_match_must_end_at_word_boundary() {
        let parse = rules().segment("ethanoic acidic").unwrap();
        assert_eq!(parse.rule, BINARY_OR_OTHER_RULE);
    }

    #[test]
    fn test_fallbacks() {
        let rules = rules();
        let simple = rules.segment("ethylmethylamine").unwrap();
        assert_eq!(simple.rule, SIMPLE_RULE);
        assert_eq!(roles(&simple), vec![("ethylmethylamine", WordRole::Full)]);
        assert!(simple.is_fallback());

        let binary = rules.segment("water ammonia").unwrap();
        assert_eq!(binary.rule, BINARY_OR_OTHER_RULE);
        assert_eq!(
            roles(&binary),
            vec![("water", WordRole::Full), ("ammonia", WordRole::Full)]
        );
    }

    #[test]
    fn test_many_rules_ids_roundtrip() {
        let rules: Vec<WordRule> = (0..12)
            .map(|i| WordRule::new(format!("r{i}"), &format!("(x{{{}}})", i + 1), vec![]).unwrap())
            .collect();
        let set = WordRules::new(rules, &NoCache).unwrap();
        // the longest prefix is tried first
        let parse = set.segment(&"x".repeat(11)).unwrap();
        assert_eq!(parse.rule, "r10");
        let ends = set.marker_ends(&"x".repeat(12));
        assert_eq!(ends.len(), 12);
        assert_eq!(set.rule_ids(ends[11].1), vec![11]);
    }

    #[test]
    fn test_lookbehind_rule_rejected_falls_through() {
        use WordRole::*;
        let set = WordRules::new(
            vec![
                WordRule::new("notMethyl", r"([^ ]+(?<!meth)yl)", vec![Substituent]).unwrap(),
                WordRule::new("generic", r"([^ ]+)", vec![Full]).unwrap(),
            ],
            &NoCache,
        )
        .unwrap();
        assert!(set.rules()[0].is_approximate());
        assert!(!set.rules()[1].is_approximate());

        // both rules are proposed for `methyl`; only the regex sees the look-behind
        let ends = set.marker_ends("methyl");
        assert_eq!(set.rule_ids(ends.last().unwrap().1), vec![0, 1]);
        let parse = set.segment("methyl").unwrap();
        assert_eq!(parse.rule, "generic");
        assert_eq!(roles(&parse), vec![("methyl", Full)]);

        let parse = set.segment("Ethyl").unwrap();
        assert_eq!(parse.rule, "notMethyl");
        assert_eq!(roles(&parse), vec![("Ethyl", Substituent)]);
    }

    #[test]
    fn test_lookbehind_sees_earlier_words() {
        let set = WordRules::new(
            vec![WordRule::new("afterAcid", r"(?<=acid )([^ ]+)", vec![WordRole::Full]).unwrap()],
            &NoCache,
        )
        .unwrap();
        let parse = set.segment("acid ethanol").unwrap();
        assert_eq!(parse.rule, "afterAcid");
        assert_eq!(
            roles(&parse),
            vec![("acid", WordRole::Full), ("ethanol", WordRole::Full)]
        );
    }

    #[test]
    fn test_exact_rule_divergence_is_internal_error() {
        let mut rule = WordRule::new("x", "(x)", vec![]).unwrap();
        assert!(!rule.is_approximate());
        // an automaton that disagrees with the rule's regex
        rule.ast = Ast::literal("y");
        let set = WordRules::new(vec![rule], &NoCache).unwrap();

        let err = set.segment("y").unwrap_err();
        assert!(err.is_internal());
        assert!(matches!(
            err,
            CoreError::AutomatonDivergence { ref rule, offset: 0 } if rule == "x"
        ));
        // names the automaton rejects are ordinary fallbacks
        assert_eq!(set.segment("z").unwrap().rule, SIMPLE_RULE);
    }

    #[test]
    fn test_unicode_classes_agree_with_regex() {
        let set = WordRules::new(
            vec![WordRule::new("sub", r"(\S+yl)", vec![WordRole::Substituent]).unwrap()],
            &NoCache,
        )
        .unwrap();
        // no-break space is whitespace to both the automaton and the regex
        let parse = set.segment("meth\u{a0}yl").unwrap();
        assert!(parse.is_fallback());
        assert_eq!(set.segment("méthyl").unwrap().rule, "sub");
    }

    #[test]
    fn test_uppercase_pattern_matches_any_case() {
        let set = WordRules::new(
            vec![WordRule::new("chloride", r"([^ ]+yl) (Chloride)", vec![]).unwrap()],
            &NoCache,
        )
        .unwrap();
        assert_eq!(set.segment("ethyl chloride").unwrap().rule, "chloride");
        assert_eq!(set.segment("ETHYL CHLORIDE").unwrap().rule, "chloride");
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let rules = vec![
            WordRule::new("a", "(x)", vec![]).unwrap(),
            WordRule::new("a", "(y)", vec![]).unwrap(),
        ];
        assert!(matches!(
            WordRules::new(rules, &NoCache),
            Err(CoreError::DuplicateWordRule(name)) if name == "a"
        ));
    }

    #[test]
    fn test_too_many_labels_rejected() {
        let result = WordRule::new("x", "(a)b", vec![WordRole::Full, WordRole::Full]);
        assert!(matches!(
            result,
            Err(CoreError::TooManyRoleLabels { labels: 2, groups: 1, .. })
        ));
    }

    #[test]
    fn test_combined_automaton_is_cached() {
        let cache = MemoryCache::new();
        let first = WordRules::new(vec![WordRule::new("a", "(x)", vec![]).unwrap()], &cache).unwrap();
        assert_eq!(cache.len(), 1);
        let second = WordRules::new(vec![WordRule::new("a", "(x)", vec![]).unwrap()], &cache).unwrap();
        assert_eq!(first.automaton(), second.automaton());
    }
}
