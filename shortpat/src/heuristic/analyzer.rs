//! Static analysis of pattern trees
//!
//! The analyzer computes, for any node, its length bounds, the literals it
//! contains and the bytes it can produce. Groups are treated as black boxes:
//! their type is probed with sample strings through `parse_value`, so types
//! registered by a host are analyzed without exposing their internals.

use std::collections::BTreeMap;

use super::ByteSet;
use crate::ast::{Group, Node};

/// Knobs for the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Hard ceiling applied to every maximum length
    pub ceiling: usize,
    /// Longest string ever fed to a type while probing
    pub probe_limit: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        AnalyzerOptions {
            ceiling: 10_000,
            probe_limit: 1_024,
        }
    }
}

/// Analysis of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAnalysis {
    /// Shortest text the node can match
    pub min_len: usize,
    /// Longest text the node can match, clamped to the ceiling
    pub max_len: usize,
    /// Literal text mapped to whether it is optional
    pub literals: BTreeMap<String, bool>,
    /// Bytes the node can match
    pub allowed_chars: ByteSet,
}

impl NodeAnalysis {
    fn empty() -> Self {
        NodeAnalysis {
            min_len: 0,
            max_len: 0,
            literals: BTreeMap::new(),
            allowed_chars: ByteSet::new(),
        }
    }

    /// Append `next` as if matched right after `self`
    fn then(mut self, next: NodeAnalysis, ceiling: usize) -> Self {
        self.min_len = self.min_len.saturating_add(next.min_len).min(ceiling);
        self.max_len = self.max_len.saturating_add(next.max_len).min(ceiling);
        for (text, optional) in next.literals {
            // mandatory anywhere wins
            let entry = self.literals.entry(text).or_insert(optional);
            *entry &= optional;
        }
        self.allowed_chars.union_with(&next.allowed_chars);
        self
    }

    fn into_optional(mut self) -> Self {
        self.min_len = 0;
        for optional in self.literals.values_mut() {
            *optional = true;
        }
        self
    }
}

/// Stateless tree analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    /// Create an analyzer with the given options
    pub fn new(options: AnalyzerOptions) -> Self {
        Analyzer { options }
    }

    /// Analyze a node and everything below it
    pub fn analyze(&self, node: &Node) -> NodeAnalysis {
        let ceiling = self.options.ceiling;
        match node {
            Node::Literal(literal) => {
                let text = literal.text();
                NodeAnalysis {
                    min_len: text.len().min(ceiling),
                    max_len: text.len().min(ceiling),
                    literals: BTreeMap::from([(text.to_string(), false)]),
                    allowed_chars: text.bytes().collect(),
                }
            }
            Node::Group(group) => self.analyze_group(group),
            Node::Sequence(seq) => seq
                .children()
                .iter()
                .fold(NodeAnalysis::empty(), |acc, child| acc.then(self.analyze(child), ceiling)),
            Node::SubSequence(seq) => seq
                .children()
                .iter()
                .fold(NodeAnalysis::empty(), |acc, child| acc.then(self.analyze(child), ceiling))
                .into_optional(),
        }
    }

    /// Infer a group's bounds by feeding its type sample strings
    pub fn analyze_group(&self, group: &Group) -> NodeAnalysis {
        let mut prober = Prober::new(group);
        let limit = self.options.probe_limit.max(1);

        let Some((min_len, anchor)) = (1..=limit).find_map(|len| {
            printable().find(|c| prober.accepts_run(*c, len)).map(|c| (len, c))
        }) else {
            return NodeAnalysis {
                min_len: 0,
                max_len: self.options.ceiling,
                literals: BTreeMap::new(),
                allowed_chars: ByteSet::printable(),
            };
        };

        let base: String = std::iter::repeat_n(anchor, min_len).collect();
        let allowed: Vec<char> = printable()
            .filter(|c| {
                *c == anchor
                    || prober.accepts_run(*c, min_len)
                    || variants(&base, *c).any(|candidate| prober.accepts(&candidate))
            })
            .collect();

        let mut max_len = min_len;
        for c in &allowed {
            if prober.accepts_run(*c, limit) {
                max_len = self.options.ceiling;
                break;
            }
            if prober.accepts_run(*c, min_len) {
                max_len = max_len.max(prober.longest_run(*c, min_len, limit));
            }
        }

        NodeAnalysis {
            min_len,
            max_len: max_len.min(self.options.ceiling),
            literals: BTreeMap::new(),
            allowed_chars: allowed.iter().map(|c| *c as u8).collect(),
        }
    }
}

fn printable() -> impl Iterator<Item = char> {
    (32u8..=126).map(char::from)
}

/// `c` placed around or into `base`, to catch characters only valid next to others
fn variants<'a>(base: &'a str, c: char) -> impl Iterator<Item = String> + 'a {
    let last = base.len() - 1;
    [
        format!("{}{}", c, base),
        format!("{}{}", base, c),
        format!("{}{}", c, &base[1..]),
        format!("{}{}", &base[..last], c),
    ]
    .into_iter()
}

/// Calls into a group's type with a reusable buffer
struct Prober<'a> {
    group: &'a Group,
    buffer: String,
}

impl<'a> Prober<'a> {
    fn new(group: &'a Group) -> Self {
        Prober {
            group,
            buffer: String::new(),
        }
    }

    fn accepts(&self, raw: &str) -> bool {
        self.group
            .value_type()
            .parse_value(Some(raw), self.group.constraints())
            .is_ok()
    }

    fn accepts_run(&mut self, c: char, len: usize) -> bool {
        self.buffer.clear();
        self.buffer.extend(std::iter::repeat_n(c, len));
        self.group
            .value_type()
            .parse_value(Some(&self.buffer), self.group.constraints())
            .is_ok()
    }

    /// Largest accepted run length in `[low, high)`, given `low` is accepted
    fn longest_run(&mut self, c: char, mut low: usize, mut high: usize) -> usize {
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if self.accepts_run(c, mid) {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }
}
