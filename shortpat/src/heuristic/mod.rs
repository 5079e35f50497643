//! Heuristic pre-filter for pattern sets
//!
//! A [`PatternHeuristic`] answers "could any pattern of the set match this
//! input?" without running a regex. It may answer yes for inputs that later
//! fail to match, but never answers no for an input that would match.
//!
//! The heuristic is built by [`HeuristicCompiler`] and is plain data: it
//! round-trips through [`HeuristicRecord`] so hosts can cache it next to the
//! compiled patterns.

mod analyzer;
mod builder;
mod byteset;

pub use analyzer::{Analyzer, AnalyzerOptions, NodeAnalysis};
pub use builder::HeuristicCompiler;
pub use byteset::ByteSet;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use tracing::trace;

use crate::error::CompileError;

/// Version written into [`HeuristicRecord`]
pub const HEURISTIC_VERSION: u32 = 1;

/// Number of leading characters used as a prefix index key
pub(crate) const PREFIX_WIDTH: usize = 2;

/// Knobs for building a heuristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeuristicOptions {
    /// Hard ceiling on the accepted input length
    pub max_length: usize,
    /// Literals shorter than this many characters are not indexed
    pub min_literal_length: usize,
    /// Minimum length assumed for any group
    pub group_min_length: usize,
}

impl Default for HeuristicOptions {
    fn default() -> Self {
        HeuristicOptions {
            max_length: 10_000,
            min_literal_length: 2,
            group_min_length: 0,
        }
    }
}

/// Precomputed pre-filter over a set of compiled patterns
#[derive(Debug, Clone, PartialEq)]
pub struct PatternHeuristic {
    /// Indexed literal text, mapped to whether it anchors a pattern start
    literals: BTreeMap<String, bool>,
    prefixes: BTreeMap<String, BTreeSet<String>>,
    suffixes: BTreeMap<String, BTreeSet<String>>,
    min_len: usize,
    max_len: usize,
    char_lookup: ByteSet,
    use_char_lookup: bool,
    char_pattern: Option<String>,
    unanchored: bool,
    /// Derived from `min_len` and `max_len`, never stored
    lengths: RangeInclusive<usize>,
}

/// Leading `PREFIX_WIDTH` characters of `text`, if it has that many
pub(crate) fn prefix_key(text: &str) -> Option<&str> {
    match text.char_indices().nth(PREFIX_WIDTH) {
        Some((end, _)) => Some(&text[..end]),
        None if text.chars().count() == PREFIX_WIDTH => Some(text),
        None => None,
    }
}

/// Trailing `PREFIX_WIDTH` characters of `text`, if it has that many
pub(crate) fn suffix_key(text: &str) -> Option<&str> {
    let start = text.char_indices().rev().nth(PREFIX_WIDTH - 1)?.0;
    Some(&text[start..])
}

impl PatternHeuristic {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        literals: BTreeMap<String, bool>,
        prefixes: BTreeMap<String, BTreeSet<String>>,
        suffixes: BTreeMap<String, BTreeSet<String>>,
        min_len: usize,
        max_len: usize,
        char_lookup: ByteSet,
        use_char_lookup: bool,
        char_pattern: Option<String>,
        unanchored: bool,
    ) -> Self {
        PatternHeuristic {
            literals,
            prefixes,
            suffixes,
            min_len,
            max_len,
            char_lookup,
            use_char_lookup,
            char_pattern,
            unanchored,
            lengths: min_len..=max_len,
        }
    }

    /// Whether any pattern of the set could match `candidate`
    pub fn support(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        if !self.lengths.contains(&candidate.len()) {
            trace!(len = candidate.len(), min = self.min_len, max = self.max_len, "rejected by length");
            return false;
        }
        if self.use_char_lookup && !self.char_lookup.contains_all(candidate) {
            trace!(candidate, "rejected by character table");
            return false;
        }
        if self.unanchored {
            return true;
        }

        let supported = prefix_key(candidate)
            .and_then(|key| self.prefixes.get(key))
            .is_some_and(|bucket| {
                bucket
                    .iter()
                    .any(|literal| self.literals.get(literal) == Some(&true) && candidate.starts_with(literal.as_str()))
            });
        if !supported {
            trace!(candidate, "rejected by prefix index");
        }
        supported
    }

    /// Indexed literals and whether each anchors a pattern start
    pub fn literals(&self) -> &BTreeMap<String, bool> {
        &self.literals
    }

    /// Literals grouped by their leading characters
    pub fn prefixes(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.prefixes
    }

    /// Literals grouped by their trailing characters
    pub fn suffixes(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.suffixes
    }

    /// Shortest input length any pattern can match
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Longest input length accepted
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Bytes allowed in a candidate, when the character gate is active
    pub fn char_lookup(&self) -> Option<&ByteSet> {
        self.use_char_lookup.then_some(&self.char_lookup)
    }

    /// The character gate as a regex, when it is active
    pub fn char_pattern(&self) -> Option<&str> {
        self.char_pattern.as_deref()
    }

    /// Whether some pattern lacks a leading literal, disabling the prefix gate
    pub fn is_unanchored(&self) -> bool {
        self.unanchored
    }

    /// Convert to a plain versioned record
    pub fn to_record(&self) -> HeuristicRecord {
        HeuristicRecord {
            version: HEURISTIC_VERSION,
            literals: self.literals.clone(),
            prefixes: self.prefixes.clone(),
            suffixes: self.suffixes.clone(),
            min_len: self.min_len,
            max_len: self.max_len,
            char_lookup: self.char_lookup,
            use_char_lookup: self.use_char_lookup,
            char_pattern: self.char_pattern.clone(),
            unanchored: self.unanchored,
        }
    }

    /// Rebuild from a record, recomputing the length range
    pub fn from_record(record: HeuristicRecord) -> Result<Self, CompileError> {
        if record.version != HEURISTIC_VERSION {
            return Err(CompileError::UnsupportedVersion {
                found: record.version,
                expected: HEURISTIC_VERSION,
            });
        }
        if record.use_char_lookup != record.char_pattern.is_some() {
            return Err(CompileError::Corrupt(
                "character pattern does not match character table".to_string(),
            ));
        }
        Ok(PatternHeuristic::new(
            record.literals,
            record.prefixes,
            record.suffixes,
            record.min_len,
            record.max_len,
            record.char_lookup,
            record.use_char_lookup,
            record.char_pattern,
            record.unanchored,
        ))
    }
}

/// A heuristic as plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicRecord {
    /// Record format version
    pub version: u32,
    /// Indexed literal text, mapped to whether it anchors a pattern start
    pub literals: BTreeMap<String, bool>,
    /// Literals grouped by leading characters
    pub prefixes: BTreeMap<String, BTreeSet<String>>,
    /// Literals grouped by trailing characters
    pub suffixes: BTreeMap<String, BTreeSet<String>>,
    /// Shortest accepted length
    pub min_len: usize,
    /// Longest accepted length
    pub max_len: usize,
    /// Allowed bytes
    pub char_lookup: ByteSet,
    /// Whether the byte table is consulted
    pub use_char_lookup: bool,
    /// The byte table as a regex
    pub char_pattern: Option<String>,
    /// Whether the prefix gate is disabled
    #[serde(default)]
    pub unanchored: bool,
}

impl HeuristicRecord {
    /// Encode as JSON
    pub fn to_json(&self) -> Result<String, CompileError> {
        serde_json::to_string(self).map_err(|e| CompileError::Corrupt(e.to_string()))
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::Corrupt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PatternCompiler;
    use crate::engine::CompiledPattern;

    fn heuristic(patterns: &[&str]) -> PatternHeuristic {
        let compiler = PatternCompiler::default();
        let compiled: Vec<CompiledPattern> =
            patterns.iter().map(|p| compiler.compile(p).unwrap()).collect();
        HeuristicCompiler::default().compile(&compiled)
    }

    #[test]
    fn test_prefix_key() {
        assert_eq!(prefix_key("PAGE"), Some("PA"));
        assert_eq!(prefix_key("PA"), Some("PA"));
        assert_eq!(prefix_key("P"), None);
        assert_eq!(prefix_key("äöü"), Some("äö"));
        assert_eq!(suffix_key("PAGE"), Some("GE"));
        assert_eq!(suffix_key("E"), None);
    }

    #[test]
    fn test_support_by_prefix() {
        let h = heuristic(&["PAGE{uid:int(min=1)}(-{lang:int(min=0,default=0)})"]);
        assert!(h.support("PAGE5"));
        assert!(h.support("PAGE5-2"));
        assert!(!h.support("POST5"));
        assert!(!h.support("P"));
        assert!(!h.support(""));
    }

    #[test]
    fn test_support_is_false_positive_tolerant() {
        let h = heuristic(&["PAGE{uid:int(min=1)}"]);
        // structurally wrong, but shares the leading literal
        assert!(h.support("PAGEx"));
    }

    #[test]
    fn test_unanchored_pattern_disables_prefix_gate() {
        let h = heuristic(&["PAGE{uid:int}", "{slug:string}.html"]);
        assert!(h.is_unanchored());
        assert!(h.support("about.html"));
        assert!(h.support("PAGE1"));
    }

    #[test]
    fn test_short_leading_literal_is_unanchored() {
        let h = heuristic(&["p{uid:int}"]);
        assert!(h.is_unanchored());
        assert!(h.support("p1"));
    }

    #[test]
    fn test_length_gate() {
        let h = heuristic(&["ab", "abcd"]);
        assert_eq!(h.min_len(), 2);
        assert_eq!(h.max_len(), 4);
        assert!(!h.support("abcde"));
        assert!(h.support("abc"));
    }

    #[test]
    fn test_char_lookup_for_literal_only_sets() {
        let h = heuristic(&["home", "about"]);
        assert!(h.char_lookup().is_some());
        assert_eq!(h.char_pattern(), Some("^[abehmotu]+$"));
        assert!(!h.support("hom!"));
        assert!(h.support("home"));

        let h = heuristic(&["home", "PAGE{uid:int}"]);
        assert!(h.char_lookup().is_none());
        assert!(h.char_pattern().is_none());
    }

    #[test]
    fn test_empty_set_supports_nothing() {
        let h = HeuristicCompiler::default().compile(&[]);
        assert!(!h.support("anything"));
    }

    #[test]
    fn test_record_round_trip() {
        let h = heuristic(&["PAGE{uid:int}(-{lang:int})", "NEWS{id:int}"]);
        let json = h.to_record().to_json().unwrap();
        assert!(json.contains("\"minLen\""));
        assert!(!json.contains("lengths"));
        let restored = PatternHeuristic::from_record(HeuristicRecord::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored, h);
        for candidate in ["PAGE1", "NEWS2", "OTHER", ""] {
            assert_eq!(restored.support(candidate), h.support(candidate));
        }
    }

    #[test]
    fn test_record_version_mismatch() {
        let mut record = heuristic(&["ab"]).to_record();
        record.version = 2;
        assert_eq!(
            PatternHeuristic::from_record(record),
            Err(CompileError::UnsupportedVersion { found: 2, expected: 1 })
        );
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: HeuristicOptions = serde_json::from_str(r#"{"maxLength": 200}"#).unwrap();
        assert_eq!(options.max_length, 200);
        assert_eq!(options.min_literal_length, 2);
    }
}
