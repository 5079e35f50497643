//! Abstract Syntax Tree (AST) for short-URL patterns
//!
//! A pattern is a tree of four node kinds:
//! - [`Node::Literal`]: fixed text, matched and generated verbatim
//! - [`Node::Group`]: a named, typed capture `{name:type(...)}`
//! - [`Node::Sequence`]: children concatenated in order
//! - [`Node::SubSequence`]: an optional `(...)` section
//!
//! Every node knows whether it sits inside an optional section. The flag is
//! set when a node is attached to a sub-sequence, so there are no parent
//! pointers. Regex fragments are computed once per node and cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::constraint::{Constraint, RawConstraints, is_greedy, resolve_constraints};
use crate::error::{GenerateError, PatternError};
use crate::types::{PatternType, TypeRegistry};
use crate::value::Value;

/// A node in the pattern tree
#[derive(Debug, Clone)]
pub enum Node {
    /// Fixed text
    Literal(Literal),
    /// A named typed capture
    Group(Group),
    /// Children matched one after another
    Sequence(Sequence),
    /// Children matched one after another, or not at all
    SubSequence(Sequence),
}

/// Fixed text
#[derive(Debug, Clone)]
pub struct Literal {
    text: String,
    in_optional: bool,
    regex: OnceLock<String>,
}

/// A named typed capture
#[derive(Debug, Clone)]
pub struct Group {
    id: u32,
    name: String,
    ty: Arc<dyn PatternType>,
    raw_constraints: RawConstraints,
    constraints: Vec<Constraint>,
    in_optional: bool,
    regex: OnceLock<String>,
}

/// An ordered list of children
#[derive(Debug, Clone)]
pub struct Sequence {
    children: Vec<Node>,
    in_optional: bool,
    regex: OnceLock<String>,
}

impl Literal {
    /// The literal text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this literal sits inside an optional section
    pub fn is_in_optional_context(&self) -> bool {
        self.in_optional
    }
}

impl Group {
    /// Create a group, resolving its constraints against the type
    pub fn new(
        id: u32,
        name: impl Into<String>,
        ty: Arc<dyn PatternType>,
        raw_constraints: RawConstraints,
    ) -> Result<Self, PatternError> {
        let constraints = resolve_constraints(ty.as_ref(), &raw_constraints)?;
        Ok(Group {
            id,
            name: name.into(),
            ty,
            raw_constraints,
            constraints,
            in_optional: false,
            regex: OnceLock::new(),
        })
    }

    /// The group ID, unique within a pattern
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the capture in the derived regex
    pub fn capture_name(&self) -> String {
        format!("g{}", self.id)
    }

    /// The bound type
    pub fn value_type(&self) -> &Arc<dyn PatternType> {
        &self.ty
    }

    /// The constraints as written in the pattern
    pub fn raw_constraints(&self) -> &RawConstraints {
        &self.raw_constraints
    }

    /// The resolved constraints, `default` last
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether no constraint limits the width of this group
    pub fn is_greedy(&self) -> bool {
        is_greedy(&self.constraints)
    }

    /// Whether this group sits inside an optional section
    pub fn is_in_optional_context(&self) -> bool {
        self.in_optional
    }

    /// The `default` constraint's raw value, if any
    pub fn default_value(&self) -> Option<&str> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Default(raw) => Some(raw.as_str()),
            _ => None,
        })
    }

    fn generate(&self, values: &BTreeMap<String, Value>) -> Result<String, GenerateError> {
        match values.get(&self.name) {
            Some(value) => {
                let value = self
                    .constraints
                    .iter()
                    .fold(value.clone(), |value, c| c.serialize(value));
                Ok(self.ty.format_value(&value))
            }
            None => self
                .default_value()
                .map(str::to_string)
                .ok_or_else(|| GenerateError::MissingValue(self.name.clone())),
        }
    }
}

impl Sequence {
    /// The children of this sequence
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Whether this sequence sits inside an optional section
    pub fn is_in_optional_context(&self) -> bool {
        self.in_optional
    }
}

impl Node {
    /// Create a literal node
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(Literal {
            text: text.into(),
            in_optional: false,
            regex: OnceLock::new(),
        })
    }

    /// Create a group node
    pub fn group(group: Group) -> Self {
        Node::Group(group)
    }

    /// Create a sequence node
    pub fn sequence(children: Vec<Node>) -> Self {
        Node::Sequence(Sequence {
            children,
            in_optional: false,
            regex: OnceLock::new(),
        })
    }

    /// Create an optional section, marking every descendant as optional
    pub fn sub_sequence(mut children: Vec<Node>) -> Self {
        for child in &mut children {
            child.mark_optional();
        }
        Node::SubSequence(Sequence {
            children,
            in_optional: false,
            regex: OnceLock::new(),
        })
    }

    fn mark_optional(&mut self) {
        match self {
            Node::Literal(literal) => literal.in_optional = true,
            Node::Group(group) => group.in_optional = true,
            Node::Sequence(seq) | Node::SubSequence(seq) => {
                seq.in_optional = true;
                for child in &mut seq.children {
                    child.mark_optional();
                }
            }
        }
    }

    /// The group name, for named nodes
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Group(group) => Some(group.name()),
            _ => None,
        }
    }

    /// The children, for container nodes
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(seq) | Node::SubSequence(seq) => Some(seq.children()),
            _ => None,
        }
    }

    /// The group, for type-bearing nodes
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Whether this node separates its neighbours for greedy-adjacency purposes
    pub fn provides_boundary(&self) -> bool {
        matches!(self, Node::Literal(_) | Node::SubSequence(_))
    }

    /// Whether this node sits inside an optional section
    pub fn is_in_optional_context(&self) -> bool {
        match self {
            Node::Literal(literal) => literal.in_optional,
            Node::Group(group) => group.in_optional,
            Node::Sequence(seq) | Node::SubSequence(seq) => seq.in_optional,
        }
    }

    /// The regex fragment for this node, computed once
    pub fn to_regex(&self) -> &str {
        match self {
            Node::Literal(literal) => literal.regex.get_or_init(|| regex::escape(&literal.text)),
            Node::Group(group) => group.regex.get_or_init(|| {
                format!(
                    "(?P<{}>{})",
                    group.capture_name(),
                    group.ty.constrained_pattern(&group.constraints)
                )
            }),
            Node::Sequence(seq) => seq.regex.get_or_init(|| seq.concat_regex()),
            Node::SubSequence(seq) => seq
                .regex
                .get_or_init(|| format!("(?:{})?", seq.concat_regex())),
        }
    }

    /// All groups in this subtree, left to right
    pub fn groups(&self) -> Vec<&Group> {
        let mut groups = Vec::new();
        self.collect_groups(&mut groups);
        groups
    }

    fn collect_groups<'a>(&'a self, out: &mut Vec<&'a Group>) {
        match self {
            Node::Literal(_) => {}
            Node::Group(group) => out.push(group),
            Node::Sequence(seq) | Node::SubSequence(seq) => {
                for child in &seq.children {
                    child.collect_groups(out);
                }
            }
        }
    }

    fn has_bound_group(&self, values: &BTreeMap<String, Value>) -> bool {
        match self {
            Node::Literal(_) => false,
            Node::Group(group) => values.contains_key(group.name()),
            Node::Sequence(seq) | Node::SubSequence(seq) => {
                seq.children.iter().any(|child| child.has_bound_group(values))
            }
        }
    }

    /// Generate a concrete string from bound values
    ///
    /// Optional sections are emitted only when at least one group inside
    /// them has a value. A required group without a value falls back to its
    /// `default` constraint or fails.
    pub fn generate(&self, values: &BTreeMap<String, Value>) -> Result<String, GenerateError> {
        let mut out = String::new();
        self.write_generated(values, &mut out)?;
        Ok(out)
    }

    fn write_generated(
        &self,
        values: &BTreeMap<String, Value>,
        out: &mut String,
    ) -> Result<(), GenerateError> {
        match self {
            Node::Literal(literal) => out.push_str(&literal.text),
            Node::Group(group) => out.push_str(&group.generate(values)?),
            Node::Sequence(seq) => {
                for child in &seq.children {
                    child.write_generated(values, out)?;
                }
            }
            Node::SubSequence(seq) => {
                if self.has_bound_group(values) {
                    for child in &seq.children {
                        child.write_generated(values, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Convert to a plain serializable record
    pub fn to_record(&self) -> NodeRecord {
        let regex = Some(self.to_regex().to_string());
        match self {
            Node::Literal(literal) => NodeRecord::Literal {
                text: literal.text.clone(),
                regex,
            },
            Node::Group(group) => NodeRecord::Group {
                name: group.name.clone(),
                type_name: group.ty.name().to_string(),
                constraints: group.raw_constraints.clone(),
                optional: group.in_optional,
                group_id: group.id,
                regex,
            },
            Node::Sequence(seq) => NodeRecord::Sequence {
                children: seq.children.iter().map(Node::to_record).collect(),
                regex,
            },
            Node::SubSequence(seq) => NodeRecord::SubSequence {
                children: seq.children.iter().map(Node::to_record).collect(),
                regex,
            },
        }
    }

    /// Rebuild a node from a record, re-binding group types from the registry
    pub fn from_record(record: &NodeRecord, registry: &TypeRegistry) -> Result<Node, PatternError> {
        let node = match record {
            NodeRecord::Literal { text, regex } => {
                let mut node = Node::literal(text.clone());
                if let Node::Literal(literal) = &mut node {
                    literal.regex = seeded(regex);
                }
                node
            }
            NodeRecord::Group {
                name,
                type_name,
                constraints,
                optional,
                group_id,
                regex,
            } => {
                let ty = registry.resolve(name, type_name)?;
                let mut group = Group::new(*group_id, name.clone(), ty, constraints.clone())?;
                group.in_optional = *optional;
                group.regex = seeded(regex);
                Node::Group(group)
            }
            NodeRecord::Sequence { children, regex } => {
                let mut node = Node::sequence(Self::children_from_records(children, registry)?);
                if let Node::Sequence(seq) = &mut node {
                    seq.regex = seeded(regex);
                }
                node
            }
            NodeRecord::SubSequence { children, regex } => {
                let mut node = Node::sub_sequence(Self::children_from_records(children, registry)?);
                if let Node::SubSequence(seq) = &mut node {
                    seq.regex = seeded(regex);
                }
                node
            }
        };
        Ok(node)
    }

    fn children_from_records(
        records: &[NodeRecord],
        registry: &TypeRegistry,
    ) -> Result<Vec<Node>, PatternError> {
        records
            .iter()
            .map(|record| Node::from_record(record, registry))
            .collect()
    }
}

impl Sequence {
    fn concat_regex(&self) -> String {
        self.children.iter().map(Node::to_regex).collect()
    }
}

fn seeded(regex: &Option<String>) -> OnceLock<String> {
    match regex {
        Some(regex) => OnceLock::from(regex.clone()),
        None => OnceLock::new(),
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_regex())
    }
}

/// A node as plain data, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeRecord {
    /// A literal node
    Literal {
        /// The literal text
        text: String,
        /// Cached regex fragment
        #[serde(default)]
        regex: Option<String>,
    },
    /// A group node
    Group {
        /// The group name
        name: String,
        /// The type name
        #[serde(rename = "type")]
        type_name: String,
        /// Raw constraint pairs
        #[serde(default)]
        constraints: RawConstraints,
        /// Whether the group sits inside an optional section
        #[serde(default)]
        optional: bool,
        /// The group ID
        group_id: u32,
        /// Cached regex fragment
        #[serde(default)]
        regex: Option<String>,
    },
    /// A sequence node
    Sequence {
        /// Child records
        children: Vec<NodeRecord>,
        /// Cached regex fragment
        #[serde(default)]
        regex: Option<String>,
    },
    /// An optional section
    SubSequence {
        /// Child records
        children: Vec<NodeRecord>,
        /// Cached regex fragment
        #[serde(default)]
        regex: Option<String>,
    },
}
