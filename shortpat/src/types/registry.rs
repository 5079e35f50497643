use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::TypeError;
use crate::types::{IntType, PatternType, StringType};

/// Registry mapping type names to type implementations
///
/// Populated once at startup and read-only afterwards, so it can be shared
/// between threads compiling or matching patterns.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, Arc<dyn PatternType>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Create a registry with the built-in `int` and `string` types
    pub fn with_defaults() -> Self {
        let mut registry = TypeRegistry::new();
        for ty in [
            Arc::new(IntType) as Arc<dyn PatternType>,
            Arc::new(StringType) as Arc<dyn PatternType>,
        ] {
            registry.types.insert(ty.name().to_string(), ty);
        }
        registry
    }

    /// Register a type
    ///
    /// # Errors
    /// Returns an error if a type with the same name is already registered
    pub fn register(&mut self, ty: impl PatternType + 'static) -> Result<(), TypeError> {
        let name = ty.name().to_string();
        if self.types.contains_key(&name) {
            return Err(TypeError::DuplicateType(name));
        }
        self.types.insert(name, Arc::new(ty));
        Ok(())
    }

    /// Get a type by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PatternType>> {
        self.types.get(name).cloned()
    }

    /// Names of all registered types, sorted
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Look up the type of a group, reporting the valid names on failure
    pub(crate) fn resolve(&self, group: &str, type_name: &str) -> Result<Arc<dyn PatternType>, TypeError> {
        self.get(type_name).ok_or_else(|| TypeError::UnknownType {
            group: group.to_string(),
            type_name: type_name.to_string(),
            available: self.names().join(", "),
        })
    }
}
