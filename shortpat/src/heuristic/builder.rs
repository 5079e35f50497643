use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{ByteSet, HeuristicOptions, PREFIX_WIDTH, PatternHeuristic, prefix_key, suffix_key};
use crate::ast::Node;
use crate::engine::CompiledPattern;

/// Builds a [`PatternHeuristic`] from compiled patterns
///
/// Groups are not probed here: each contributes the configured default
/// bounds, so the resulting length range is conservative.
#[derive(Debug, Clone, Default)]
pub struct HeuristicCompiler {
    options: HeuristicOptions,
}

/// Per-pattern accumulator
struct Walk<'a> {
    options: &'a HeuristicOptions,
    literals: &'a mut BTreeMap<String, bool>,
    chars: &'a mut BTreeSet<char>,
    has_groups: bool,
}

impl Walk<'_> {
    /// Length bounds of `node`, indexing its literals on the way
    fn visit(&mut self, node: &Node) -> (usize, usize) {
        match node {
            Node::Literal(literal) => {
                let text = literal.text();
                self.chars.extend(text.chars());
                if text.chars().count() >= self.options.min_literal_length {
                    self.literals.entry(text.to_string()).or_insert(false);
                }
                if literal.is_in_optional_context() {
                    (0, text.len())
                } else {
                    (text.len(), text.len())
                }
            }
            Node::Group(_) => {
                self.has_groups = true;
                (self.options.group_min_length, self.options.max_length)
            }
            Node::Sequence(seq) | Node::SubSequence(seq) => {
                let (min, max) = seq.children().iter().fold((0usize, 0usize), |(min, max), child| {
                    let (child_min, child_max) = self.visit(child);
                    (min.saturating_add(child_min), max.saturating_add(child_max))
                });
                let min = if matches!(node, Node::SubSequence(_)) { 0 } else { min };
                (min, max.min(self.options.max_length))
            }
        }
    }
}

impl HeuristicCompiler {
    /// Create a compiler with the given options
    pub fn new(options: HeuristicOptions) -> Self {
        HeuristicCompiler { options }
    }

    /// The options in use
    pub fn options(&self) -> &HeuristicOptions {
        &self.options
    }

    /// The mandatory literal a pattern starts with, if it is long enough to index
    ///
    /// Anchors shorter than a prefix key could never be found by `support`.
    fn anchor<'a>(&self, root: &'a Node) -> Option<&'a str> {
        let min_len = self.options.min_literal_length.max(PREFIX_WIDTH);
        match root.children()?.first()? {
            Node::Literal(literal)
                if !literal.is_in_optional_context() && literal.text().chars().count() >= min_len =>
            {
                Some(literal.text())
            }
            _ => None,
        }
    }

    /// Build the heuristic for a set of patterns
    pub fn compile(&self, patterns: &[CompiledPattern]) -> PatternHeuristic {
        let ceiling = self.options.max_length;
        let mut literals = BTreeMap::new();
        let mut chars = BTreeSet::new();
        let mut has_groups = false;
        let mut unanchored = false;
        let mut bounds: Option<(usize, usize)> = None;

        for pattern in patterns {
            let mut walk = Walk {
                options: &self.options,
                literals: &mut literals,
                chars: &mut chars,
                has_groups: false,
            };
            let (min, max) = walk.visit(pattern.ast());
            has_groups |= walk.has_groups;

            match self.anchor(pattern.ast()) {
                Some(text) => {
                    literals.insert(text.to_string(), true);
                }
                None => unanchored = true,
            }

            let (min, max) = (min.min(ceiling), max.min(ceiling));
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(min), hi.max(max)),
                None => (min, max),
            });
        }

        let mut prefixes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut suffixes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for text in literals.keys() {
            if let Some(key) = prefix_key(text) {
                prefixes.entry(key.to_string()).or_default().insert(text.clone());
            }
            if let Some(key) = suffix_key(text) {
                suffixes.entry(key.to_string()).or_default().insert(text.clone());
            }
        }

        let use_char_lookup = !patterns.is_empty() && !has_groups;
        let char_lookup: ByteSet = chars
            .iter()
            .flat_map(|c| c.to_string().into_bytes())
            .collect();
        let char_pattern = use_char_lookup.then(|| {
            let class: String = chars.iter().map(|c| regex::escape(&c.to_string())).collect();
            format!("^[{}]+$", class)
        });

        let (min_len, max_len) = bounds.unwrap_or((0, 0));
        debug!(
            patterns = patterns.len(),
            literals = literals.len(),
            min_len,
            max_len,
            unanchored,
            "built heuristic"
        );

        PatternHeuristic::new(
            literals,
            prefixes,
            suffixes,
            min_len,
            max_len,
            char_lookup,
            use_char_lookup,
            char_pattern,
            unanchored,
        )
    }
}
