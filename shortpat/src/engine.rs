//! Compiled patterns: matching and generation
//!
//! A [`CompiledPattern`] pairs a validated tree with its anchored regex and
//! per-group metadata. Matching is best-effort per group: a value that fails
//! its type or constraints is recorded as an error in the [`MatchResult`]
//! while the remaining groups are still processed.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ast::{Node, NodeRecord};
use crate::constraint::{Constraint, RawConstraints};
use crate::error::{CompileError, GenerateError, MatchError};
use crate::groups::GroupRegistry;
use crate::types::PatternType;
use crate::value::{BareValue, Value};

/// Version written into [`CompiledPatternRecord`]
pub const RECORD_VERSION: u32 = 1;

/// A typed value captured for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValue {
    /// The typed value
    pub value: Value,
    /// The name of the group's type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Raw constraint pairs of the group
    pub constraints: RawConstraints,
}

/// The outcome of matching one input against one pattern
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    input: String,
    groups: BTreeMap<String, GroupValue>,
    errors: Vec<MatchError>,
}

impl MatchResult {
    fn new(input: &str) -> Self {
        MatchResult {
            input: input.to_string(),
            groups: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// The matched input
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Get the typed value of a group
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.groups.get(name).map(|g| &g.value)
    }

    /// Get the structured entry of a group
    pub fn group(&self, name: &str) -> Option<&GroupValue> {
        self.groups.get(name)
    }

    /// All groups that produced a value
    pub fn groups(&self) -> &BTreeMap<String, GroupValue> {
        &self.groups
    }

    /// Errors collected while converting group values
    pub fn errors(&self) -> &[MatchError] {
        &self.errors
    }

    /// Whether any group failed its type or constraints
    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Bare group values keyed by name
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.groups
            .iter()
            .map(|(name, g)| (name.clone(), g.value.clone()))
            .collect()
    }

    /// Flattened view: `input` plus every group value
    ///
    /// A group named `input` shadows the input entry.
    pub fn to_array(&self) -> BTreeMap<String, Value> {
        let mut flat = BTreeMap::new();
        flat.insert("input".to_string(), Value::Str(self.input.clone()));
        flat.extend(self.values());
        flat
    }
}

/// Runtime binding of a regex capture to a group's type and constraints
#[derive(Debug, Clone)]
struct GroupBinding {
    name: String,
    capture: String,
    ty: Arc<dyn PatternType>,
    constraints: Vec<Constraint>,
    raw_constraints: RawConstraints,
    has_default: bool,
}

/// A compiled, immutable pattern
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    ast: Node,
    regex: Regex,
    named_groups: BTreeMap<u32, String>,
    group_types: BTreeMap<String, String>,
    group_constraints: BTreeMap<String, RawConstraints>,
    bindings: Vec<GroupBinding>,
}

impl CompiledPattern {
    /// Assemble a compiled pattern from a validated tree
    pub(crate) fn new(
        pattern: impl Into<String>,
        ast: Node,
        regex_source: &str,
        groups: &GroupRegistry,
    ) -> Result<Self, CompileError> {
        let regex = Regex::new(regex_source).map_err(|e| CompileError::Regex(e.to_string()))?;
        let bindings = ast
            .groups()
            .into_iter()
            .map(|group| GroupBinding {
                name: group.name().to_string(),
                capture: group.capture_name(),
                ty: group.value_type().clone(),
                constraints: group.constraints().to_vec(),
                raw_constraints: group.raw_constraints().clone(),
                has_default: group.default_value().is_some(),
            })
            .collect();

        Ok(CompiledPattern {
            pattern: pattern.into(),
            ast,
            regex,
            named_groups: groups.named_groups(),
            group_types: groups.group_types(),
            group_constraints: groups.group_constraints(),
            bindings,
        })
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The root of the tree
    pub fn ast(&self) -> &Node {
        &self.ast
    }

    /// The anchored regex
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Map from group ID to group name
    pub fn named_groups(&self) -> &BTreeMap<u32, String> {
        &self.named_groups
    }

    /// Map from group name to type name
    pub fn group_types(&self) -> &BTreeMap<String, String> {
        &self.group_types
    }

    /// Map from group name to raw constraints
    pub fn group_constraints(&self) -> &BTreeMap<String, RawConstraints> {
        &self.group_constraints
    }

    /// Check whether the input matches structurally
    pub fn is_match(&self, input: &str) -> bool {
        !input.is_empty() && self.regex.is_match(input)
    }

    /// Match the input and convert every group
    ///
    /// Returns `None` when the regex does not match. The empty string never
    /// matches, even for patterns made only of optional parts. Groups that
    /// did not capture get their `default` value if they have one and are
    /// omitted otherwise.
    pub fn match_str(&self, input: &str) -> Option<MatchResult> {
        if input.is_empty() {
            return None;
        }
        let captures = self.regex.captures(input)?;
        let mut result = MatchResult::new(input);

        for binding in &self.bindings {
            let raw = captures
                .name(&binding.capture)
                .map(|m| m.as_str())
                .filter(|raw| !raw.is_empty());
            if raw.is_none() && !binding.has_default {
                continue;
            }

            match binding.ty.parse_value(raw, &binding.constraints) {
                Ok(value) => {
                    result.groups.insert(
                        binding.name.clone(),
                        GroupValue {
                            value,
                            type_name: binding.ty.name().to_string(),
                            constraints: binding.raw_constraints.clone(),
                        },
                    );
                }
                Err(error) => result.errors.push(MatchError {
                    group: binding.name.clone(),
                    error,
                }),
            }
        }

        Some(result)
    }

    /// Generate a string from group values
    ///
    /// Values may be bare or structured [`GroupValue`] entries; keys that do
    /// not name a group are ignored.
    pub fn generate<I, K, V>(&self, values: I) -> Result<String, GenerateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: BareValue,
    {
        let values: BTreeMap<String, Value> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into_value()))
            .collect();
        self.ast.generate(&values)
    }

    /// Convert to a plain versioned record
    pub fn to_record(&self) -> CompiledPatternRecord {
        CompiledPatternRecord {
            version: RECORD_VERSION,
            pattern: self.pattern.clone(),
            regex: self.regex.as_str().to_string(),
            ast: self.ast.to_record(),
            named_groups: self.named_groups.clone(),
            group_types: self.group_types.clone(),
            group_constraints: self.group_constraints.clone(),
        }
    }
}

/// A compiled pattern as plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledPatternRecord {
    /// Record format version
    pub version: u32,
    /// The source pattern
    pub pattern: String,
    /// The anchored regex
    pub regex: String,
    /// The tree
    pub ast: NodeRecord,
    /// Map from group ID to group name
    pub named_groups: BTreeMap<u32, String>,
    /// Map from group name to type name
    pub group_types: BTreeMap<String, String>,
    /// Map from group name to raw constraints
    pub group_constraints: BTreeMap<String, RawConstraints>,
}

impl CompiledPatternRecord {
    /// Encode as JSON
    pub fn to_json(&self) -> Result<String, CompileError> {
        serde_json::to_string(self).map_err(|e| CompileError::Corrupt(e.to_string()))
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::Corrupt(e.to_string()))
    }
}
