//! Group registry for tracking typed groups
//!
//! This module provides:
//! - [`GroupIdCounter`], the ID allocator shared by a parser and its
//!   sub-parsers so IDs stay unique across nested optional sections
//! - [`GroupRegistry`], which maps IDs to names and rejects duplicate names
//! - [`GroupCollector`], which walks a tree and fills a registry

use std::collections::{BTreeMap, HashSet};

use crate::ast::{Group, Node};
use crate::constraint::RawConstraints;
use crate::error::ValidationError;

/// Monotonic group ID allocator for one pattern
///
/// IDs are 1-based. A counter belongs to a single parse and is passed by
/// mutable reference into every nested sub-parse.
#[derive(Debug)]
pub struct GroupIdCounter {
    next: u32,
}

impl GroupIdCounter {
    /// Create a counter starting at 1
    pub fn new() -> Self {
        GroupIdCounter { next: 1 }
    }

    /// Allocate the next ID
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for GroupIdCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a typed group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    /// The group ID
    pub id: u32,
    /// The group name
    pub name: String,
    /// The name of the group's type
    pub type_name: String,
    /// Raw constraint pairs
    pub constraints: RawConstraints,
    /// Whether the group sits inside an optional section
    pub optional: bool,
}

/// Registry for tracking the groups of one pattern
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    /// Groups in order of appearance
    groups: Vec<GroupInfo>,
    /// Names registered so far
    names: HashSet<String>,
}

impl GroupRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        GroupRegistry::default()
    }

    /// Register a group
    ///
    /// # Errors
    /// Returns an error if the name is already in use
    pub fn register(&mut self, group: &Group) -> Result<u32, ValidationError> {
        if !self.names.insert(group.name().to_string()) {
            return Err(ValidationError::DuplicateGroupName(group.name().to_string()));
        }
        self.groups.push(GroupInfo {
            id: group.id(),
            name: group.name().to_string(),
            type_name: group.value_type().name().to_string(),
            constraints: group.raw_constraints().clone(),
            optional: group.is_in_optional_context(),
        });
        Ok(group.id())
    }

    /// Get the number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Get all group infos
    pub fn groups(&self) -> &[GroupInfo] {
        &self.groups
    }

    /// Map from group ID to name
    pub fn named_groups(&self) -> BTreeMap<u32, String> {
        self.groups.iter().map(|g| (g.id, g.name.clone())).collect()
    }

    /// Map from group name to type name
    pub fn group_types(&self) -> BTreeMap<String, String> {
        self.groups
            .iter()
            .map(|g| (g.name.clone(), g.type_name.clone()))
            .collect()
    }

    /// Map from group name to raw constraints
    pub fn group_constraints(&self) -> BTreeMap<String, RawConstraints> {
        self.groups
            .iter()
            .map(|g| (g.name.clone(), g.constraints.clone()))
            .collect()
    }
}

/// A visitor that collects group information from a tree
pub struct GroupCollector;

impl GroupCollector {
    /// Collect all groups from a tree and populate the registry
    pub fn collect(node: &Node, registry: &mut GroupRegistry) -> Result<(), ValidationError> {
        for group in node.groups() {
            registry.register(group)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;

    fn group(id: u32, name: &str, type_name: &str) -> Group {
        let ty = TypeRegistry::with_defaults().get(type_name).unwrap();
        Group::new(id, name, ty, RawConstraints::new()).unwrap()
    }

    #[test]
    fn test_counter_is_monotonic() {
        let mut counter = GroupIdCounter::new();
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.next_id(), 3);
    }

    #[test]
    fn test_register_group() {
        let mut registry = GroupRegistry::new();
        let id = registry.register(&group(1, "uid", "int")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(registry.groups()[0].type_name, "int");
        assert_eq!(registry.named_groups().get(&1).map(String::as_str), Some("uid"));
    }

    #[test]
    fn test_duplicate_name_error() {
        let mut registry = GroupRegistry::new();
        registry.register(&group(1, "a", "int")).unwrap();
        let result = registry.register(&group(2, "a", "string"));
        assert_eq!(
            result,
            Err(ValidationError::DuplicateGroupName("a".to_string()))
        );
    }

    #[test]
    fn test_collect_builds_maps() {
        let node = Node::sequence(vec![
            Node::group(group(1, "uid", "int")),
            Node::literal("/"),
            Node::sub_sequence(vec![Node::group(group(2, "slug", "string"))]),
        ]);
        let mut registry = GroupRegistry::new();
        GroupCollector::collect(&node, &mut registry).unwrap();

        assert_eq!(registry.group_count(), 2);
        assert_eq!(registry.named_groups().get(&2).map(String::as_str), Some("slug"));
        assert_eq!(registry.group_types().get("uid").map(String::as_str), Some("int"));
        assert!(registry.groups()[1].optional);
    }
}
