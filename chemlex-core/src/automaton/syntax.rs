//! Grammar regex syntax
//!
//! Parses the regex dialect used by grammar strings and word rules into an
//! [`Ast`]. Only constructs a DFA can express exactly are accepted in
//! [`Syntax::Strict`] mode; [`Syntax::Relaxed`] drops assertions and
//! lookaround groups and reports that the result over-approximates the
//! original pattern.

use regex_syntax::hir::{Class, Hir, HirKind};

use crate::automaton::{RESERVED_END, RESERVED_START};
use crate::error::{CoreError, Result};

/// Largest repetition bound accepted in `{n,m}`
const MAX_REPEAT: u32 = 256;

/// Inclusive code point range
pub type Range = (u32, u32);

/// Sorted, non-overlapping set of code point ranges
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharSet {
    ranges: Vec<Range>,
}

impl CharSet {
    /// Set containing a single character
    pub fn single(ch: char) -> Self {
        Self::from_ranges(vec![(ch as u32, ch as u32)])
    }

    /// Build from arbitrary ranges (normalized on construction)
    pub fn from_ranges(mut ranges: Vec<Range>) -> Self {
        ranges.sort_unstable();
        let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        Self { ranges: merged }
    }

    /// Every character a name may contain: all code points outside the
    /// reserved marker block
    pub fn universe() -> Self {
        Self {
            ranges: vec![
                (0, RESERVED_START as u32 - 1),
                (RESERVED_END as u32 + 1, char::MAX as u32),
            ],
        }
    }

    /// `.`: the universe minus newline
    pub fn any() -> Self {
        Self::universe().difference(&Self::single('\n'))
    }

    /// Characters in `self` but not in `other`
    pub fn difference(&self, other: &CharSet) -> Self {
        let mut out = Vec::new();
        for &(lo, hi) in &self.ranges {
            let mut cursor = lo;
            for &(olo, ohi) in &other.ranges {
                if ohi < cursor || olo > hi {
                    continue;
                }
                if olo > cursor {
                    out.push((cursor, olo - 1));
                }
                cursor = ohi.saturating_add(1);
                if cursor > hi {
                    break;
                }
            }
            if cursor <= hi {
                out.push((cursor, hi));
            }
        }
        Self { ranges: out }
    }

    /// Complement relative to [`CharSet::universe`]
    pub fn negate(&self) -> Self {
        Self::universe().difference(self)
    }

    /// Union of two sets
    pub fn union(&self, other: &CharSet) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::from_ranges(ranges)
    }

    /// Normalized ranges
    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// Membership test
    pub fn contains(&self, ch: char) -> bool {
        let c = ch as u32;
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Regular expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// Matches the empty string
    Empty,
    /// Matches one character from the set
    Class(CharSet),
    /// Sequence
    Concat(Vec<Ast>),
    /// Choice
    Alternate(Vec<Ast>),
    /// Bounded or unbounded repetition
    Repeat {
        /// Repeated expression
        inner: Box<Ast>,
        /// Minimum count
        min: u32,
        /// Maximum count (`None` = unbounded)
        max: Option<u32>,
    },
}

impl Ast {
    /// Literal string
    pub fn literal(text: &str) -> Self {
        Ast::Concat(text.chars().map(|c| Ast::Class(CharSet::single(c))).collect())
    }
}

/// How to treat constructs a DFA cannot express
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Reject them
    Strict,
    /// Drop them, accepting a superset of the original language
    Relaxed,
}

/// A parsed pattern
#[derive(Debug, Clone)]
pub struct Parsed {
    /// The expression tree
    pub ast: Ast,
    /// True when unsupported constructs were dropped
    pub approximate: bool,
}

/// Parse a pattern
pub fn parse(pattern: &str, syntax: Syntax) -> Result<Parsed> {
    let mut parser = Parser {
        pattern,
        chars: pattern.char_indices().collect(),
        pos: 0,
        syntax,
        approximate: false,
    };
    let ast = parser.alternation()?;
    if let Some(&(offset, ch)) = parser.chars.get(parser.pos) {
        return Err(CoreError::malformed(
            pattern,
            offset,
            format!("unexpected '{ch}'"),
        ));
    }
    Ok(Parsed {
        ast,
        approximate: parser.approximate,
    })
}

struct Parser<'a> {
    pattern: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    syntax: Syntax,
    approximate: bool,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.pattern.len(), |&(offset, _)| offset)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn error(&self, reason: impl Into<String>) -> CoreError {
        CoreError::malformed(self.pattern, self.offset(), reason)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        let matches = prefix
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += prefix.chars().count();
        }
        matches
    }

    /// An assertion or lookaround was found
    fn unsupported(&mut self, what: &str) -> Result<()> {
        match self.syntax {
            Syntax::Strict => {
                Err(self.error(format!("{what} cannot be compiled to an automaton")))
            }
            Syntax::Relaxed => {
                self.approximate = true;
                Ok(())
            }
        }
    }

    fn alternation(&mut self) -> Result<Ast> {
        let mut branches = vec![self.concat()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.concat()?);
        }
        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or(Ast::Empty)
        } else {
            Ast::Alternate(branches)
        })
    }

    fn concat(&mut self) -> Result<Ast> {
        let mut items = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == '|' || ch == ')' {
                break;
            }
            let atom = self.repeat()?;
            if atom != Ast::Empty {
                items.push(atom);
            }
        }
        Ok(match items.len() {
            0 => Ast::Empty,
            1 => items.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(items),
        })
    }

    fn repeat(&mut self) -> Result<Ast> {
        let mut ast = self.atom()?;
        loop {
            let (min, max) = match self.peek() {
                Some('*') => {
                    self.bump();
                    (0, None)
                }
                Some('+') => {
                    self.bump();
                    (1, None)
                }
                Some('?') => {
                    self.bump();
                    (0, Some(1))
                }
                Some('{') => match self.bounds()? {
                    Some(bounds) => bounds,
                    None => break,
                },
                _ => break,
            };
            // Laziness changes capture boundaries, not the accepted language
            if self.peek() == Some('?') {
                self.bump();
            }
            ast = Ast::Repeat {
                inner: Box::new(ast),
                min,
                max,
            };
        }
        Ok(ast)
    }

    /// `{n}`, `{n,}` or `{n,m}`; a `{` not followed by a bound is a literal
    fn bounds(&mut self) -> Result<Option<(u32, Option<u32>)>> {
        let start = self.pos;
        self.bump();
        let min = self.number();
        let Some(min) = min else {
            self.pos = start;
            return Ok(None);
        };
        let max = if self.peek() == Some(',') {
            self.bump();
            self.number()
        } else {
            Some(min)
        };
        if self.bump() != Some('}') {
            self.pos = start;
            return Ok(None);
        }
        if let Some(max) = max {
            if max < min {
                return Err(self.error(format!("repetition {{{min},{max}}} is inverted")));
            }
        }
        if min > MAX_REPEAT || max.is_some_and(|m| m > MAX_REPEAT) {
            return Err(self.error(format!("repetition bound exceeds {MAX_REPEAT}")));
        }
        Ok(Some((min, max)))
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            self.bump();
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit));
        }
        value
    }

    fn atom(&mut self) -> Result<Ast> {
        let Some(ch) = self.bump() else {
            return Err(self.error("unexpected end of pattern"));
        };
        match ch {
            '(' => self.group(),
            '[' => Ok(Ast::Class(self.class()?)),
            '.' => Ok(Ast::Class(CharSet::any())),
            '^' | '$' => {
                self.unsupported("anchor")?;
                Ok(Ast::Empty)
            }
            '\\' => self.escape(),
            '*' | '+' | '?' => Err(self.error(format!("dangling quantifier '{ch}'"))),
            other => Ok(Ast::Class(CharSet::single(other))),
        }
    }

    fn group(&mut self) -> Result<Ast> {
        let lookaround = self.eat("?=") || self.eat("?!") || self.eat("?<=") || self.eat("?<!");
        if lookaround {
            self.unsupported("lookaround")?;
            self.alternation()?;
            self.close_group()?;
            return Ok(Ast::Empty);
        }
        if self.eat("?:") {
            // non-capturing
        } else if self.eat("?P<") || self.eat("?<") {
            while let Some(ch) = self.bump() {
                if ch == '>' {
                    break;
                }
            }
        } else if self.peek() == Some('?') {
            return Err(self.error("inline flags are not supported"));
        }
        let inner = self.alternation()?;
        self.close_group()?;
        Ok(inner)
    }

    fn close_group(&mut self) -> Result<()> {
        match self.bump() {
            Some(')') => Ok(()),
            _ => Err(self.error("unclosed group")),
        }
    }

    fn escape(&mut self) -> Result<Ast> {
        let Some(ch) = self.bump() else {
            return Err(self.error("trailing backslash"));
        };
        if matches!(ch, 'b' | 'B') {
            self.unsupported("word boundary")?;
            return Ok(Ast::Empty);
        }
        Ok(Ast::Class(escape_class(ch)))
    }

    fn class(&mut self) -> Result<CharSet> {
        let negated = self.peek() == Some('^');
        if negated {
            self.bump();
        }
        let mut set = CharSet::default();
        let mut first = true;
        loop {
            let Some(ch) = self.bump() else {
                return Err(self.error("unclosed character class"));
            };
            if ch == ']' && !first {
                break;
            }
            first = false;
            let lo = if ch == '\\' {
                let Some(escaped) = self.bump() else {
                    return Err(self.error("trailing backslash"));
                };
                let class = escape_class(escaped);
                if class.ranges().len() != 1 || class.ranges()[0].0 != class.ranges()[0].1 {
                    set = set.union(&class);
                    continue;
                }
                class.ranges()[0].0
            } else {
                ch as u32
            };
            if self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']') {
                self.bump();
                let hi = match self.bump() {
                    Some('\\') => match self.bump() {
                        Some(escaped) => match escape_class(escaped).ranges() {
                            &[(start, end)] if start == end => start,
                            _ => return Err(self.error("invalid class range")),
                        },
                        None => return Err(self.error("trailing backslash")),
                    },
                    Some(c) => c as u32,
                    None => return Err(self.error("unclosed character class")),
                };
                if hi < lo {
                    return Err(self.error("inverted class range"));
                }
                set = set.union(&CharSet::from_ranges(vec![(lo, hi)]));
            } else {
                set = set.union(&CharSet::from_ranges(vec![(lo, lo)]));
            }
        }
        Ok(if negated { set.negate() } else { set })
    }
}

fn escape_class(ch: char) -> CharSet {
    match ch {
        'd' | 'w' | 's' => perl_class(ch),
        'D' | 'W' | 'S' => perl_class(ch.to_ascii_lowercase()).negate(),
        'n' => CharSet::single('\n'),
        't' => CharSet::single('\t'),
        'r' => CharSet::single('\r'),
        other => CharSet::single(other),
    }
}

/// `\d`, `\w` or `\s` with the Unicode tables the regex engine matches with
fn perl_class(ch: char) -> CharSet {
    let ranges = match regex_syntax::parse(&format!("\\{ch}")).map(Hir::into_kind) {
        Ok(HirKind::Class(Class::Unicode(class))) => class
            .ranges()
            .iter()
            .map(|range| (range.start() as u32, range.end() as u32))
            .collect(),
        _ => Vec::new(),
    };
    let reserved = CharSet::from_ranges(vec![(RESERVED_START as u32, RESERVED_END as u32)]);
    CharSet::from_ranges(ranges).difference(&reserved)
}
