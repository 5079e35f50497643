//! Parser for short-URL patterns
//!
//! This module provides a recursive descent parser that converts a pattern
//! string into an AST.
//!
//! Grammar:
//!   pattern    := element+
//!   element    := group | optional | literal
//!   group      := '{' name ':' type ( '(' constraints ')' )? '}' '?'?
//!   optional   := '(' element* ')'
//!   literal    := any run of characters other than '{' and '('
//!   constraints := constraint ( ',' constraint )*
//!   constraint := key '=' ( value | '"' quoted '"' )
//!
//! `{group}?` is rewritten into `({group})` while parsing. Optional sections
//! are parsed by a fresh sub-parser over the enclosed text; all parsers of one
//! pattern share a single [`GroupIdCounter`] so group IDs are assigned left to
//! right across nesting levels.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::ast::{Group, Node};
use crate::constraint::RawConstraints;
use crate::error::{ParseError, ParseErrorKind, PatternError};
use crate::groups::GroupIdCounter;
use crate::types::TypeRegistry;

static GROUP_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([a-zA-Z_][a-zA-Z0-9_]*):([a-zA-Z]+)(?:\((.*)\))?$")
        .expect("group grammar is a valid regex")
});

/// Parser for one pattern or one optional section of it
pub struct Parser<'a> {
    /// The full pattern, for error reporting
    pattern: &'a str,
    /// The part of the pattern this parser covers
    input: &'a str,
    /// Offset of `input` within `pattern`
    base: usize,
    /// Current byte position within `input`
    position: usize,
    registry: &'a TypeRegistry,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern
    pub fn new(pattern: &'a str, registry: &'a TypeRegistry) -> Self {
        Parser {
            pattern,
            input: pattern,
            base: 0,
            position: 0,
            registry,
        }
    }

    /// Create a parser for `input[start..end]`
    fn sub_parser(&self, start: usize, end: usize) -> Parser<'a> {
        Parser {
            pattern: self.pattern,
            input: &self.input[start..end],
            base: self.base + start,
            position: 0,
            registry: self.registry,
        }
    }

    /// Parse the entire pattern and return the root sequence
    pub fn parse(&mut self, counter: &mut GroupIdCounter) -> Result<Node, PatternError> {
        if self.input.is_empty() {
            return Err(self.error(0, ParseErrorKind::EmptyPattern).into());
        }
        let children = self.parse_elements(counter)?;
        Ok(Node::sequence(children))
    }

    /// Parse elements until the end of this parser's input
    fn parse_elements(&mut self, counter: &mut GroupIdCounter) -> Result<Vec<Node>, PatternError> {
        let mut elements = Vec::new();

        while let Some(byte) = self.peek() {
            let element = match byte {
                b'{' => self.parse_group(counter)?,
                b'(' => self.parse_optional(counter)?,
                _ => self.parse_literal(),
            };
            elements.push(element);
        }

        Ok(elements)
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn error(&self, at: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pattern, self.base + at, kind)
    }

    /// Parse a literal run
    /// literal := any run of characters other than '{' and '('
    ///
    /// Only entered on a byte that starts no other element, so the run is never empty.
    fn parse_literal(&mut self) -> Node {
        let start = self.position;
        let end = self.input[start..]
            .find(['{', '('])
            .map_or(self.input.len(), |i| start + i);

        self.position = end;
        let text = &self.input[start..end];
        trace!(offset = self.base + start, text, "literal");
        Node::literal(text)
    }

    /// Parse a group, expanding the `?` suffix into an optional section
    /// group := '{' name ':' type ( '(' constraints ')' )? '}' '?'?
    fn parse_group(&mut self, counter: &mut GroupIdCounter) -> Result<Node, PatternError> {
        let open = self.position;
        let close = self.find_group_end(open)?;
        let content = &self.input[open + 1..close];

        let captures = GROUP_GRAMMAR
            .captures(content)
            .ok_or_else(|| self.error(open, ParseErrorKind::InvalidGroup(content.to_string())))?;
        let name = &captures[1];
        let type_name = &captures[2];
        let constraints = match captures.get(3) {
            Some(m) => self.parse_constraints(m.as_str(), open)?,
            None => RawConstraints::new(),
        };

        let ty = self.registry.resolve(name, type_name)?;
        let id = counter.next_id();
        let group = Group::new(id, name, ty, constraints)?;
        trace!(offset = self.base + open, id, name, type_name, "group");

        self.position = close + 1;
        if self.peek() == Some(b'?') {
            self.position += 1;
            return Ok(Node::sub_sequence(vec![Node::group(group)]));
        }
        Ok(Node::group(group))
    }

    /// Parse an optional section with a sub-parser
    /// optional := '(' element* ')'
    fn parse_optional(&mut self, counter: &mut GroupIdCounter) -> Result<Node, PatternError> {
        let open = self.position;
        let close = self.find_optional_end(open)?;

        let mut sub_parser = self.sub_parser(open + 1, close);
        let children = sub_parser.parse_elements(counter)?;
        trace!(offset = self.base + open, children = children.len(), "optional section");

        self.position = close + 1;
        Ok(Node::sub_sequence(children))
    }

    /// Find the `}` closing the group opened at `open`, skipping quoted values
    fn find_group_end(&self, open: usize) -> Result<usize, ParseError> {
        let bytes = self.input.as_bytes();
        let mut i = open + 1;
        let mut in_quotes = false;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' if in_quotes => i += 1,
                b'"' => in_quotes = !in_quotes,
                b'}' if !in_quotes => return Ok(i),
                _ => {}
            }
            i += 1;
        }

        let kind = if in_quotes {
            ParseErrorKind::UnterminatedQuote
        } else {
            ParseErrorKind::UnterminatedGroup
        };
        Err(self.error(open, kind))
    }

    /// Find the `)` closing the optional section opened at `open`
    ///
    /// Groups are skipped as a whole so parentheses around constraints do
    /// not count towards nesting.
    fn find_optional_end(&self, open: usize) -> Result<usize, ParseError> {
        let bytes = self.input.as_bytes();
        let mut depth = 0usize;
        let mut i = open + 1;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => i = self.find_group_end(i)?,
                b'(' => depth += 1,
                b')' if depth == 0 => return Ok(i),
                b')' => depth -= 1,
                _ => {}
            }
            i += 1;
        }

        Err(self.error(open, ParseErrorKind::UnterminatedOptional))
    }

    /// Parse `key=value,key2="quoted,value"` into raw pairs
    fn parse_constraints(&self, text: &str, open: usize) -> Result<RawConstraints, ParseError> {
        let mut constraints = RawConstraints::new();
        if text.trim().is_empty() {
            return Ok(constraints);
        }

        let invalid = |entry: &str| self.error(open, ParseErrorKind::InvalidConstraint(entry.to_string()));
        let mut chars = text.chars().peekable();

        loop {
            let mut key = String::new();
            while let Some(&c) = chars.peek() {
                if c == '=' || c == ',' {
                    break;
                }
                key.push(c);
                chars.next();
            }
            let key = key.trim().to_string();
            if chars.next() != Some('=') || key.is_empty() {
                return Err(invalid(&key));
            }

            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }

            let value = if chars.peek() == Some(&'"') {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(self.error(open, ParseErrorKind::UnterminatedQuote)),
                        },
                        Some('"') => break,
                        Some(c) => value.push(c),
                        None => return Err(self.error(open, ParseErrorKind::UnterminatedQuote)),
                    }
                }
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_some_and(|&c| c != ',') {
                    return Err(invalid(&key));
                }
                value
            } else {
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                value.trim().to_string()
            };

            if constraints.insert(key.clone(), value).is_some() {
                return Err(invalid(&key));
            }

            match chars.next() {
                Some(',') => continue,
                _ => break,
            }
        }

        Ok(constraints)
    }
}

/// Parse a pattern string into an AST
pub fn parse(pattern: &str, registry: &TypeRegistry) -> Result<Node, PatternError> {
    let mut counter = GroupIdCounter::new();
    Parser::new(pattern, registry).parse(&mut counter)
}
