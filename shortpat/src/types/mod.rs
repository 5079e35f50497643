//! Value types for typed groups
//!
//! A type turns captured text into a [`Value`] and describes the regex
//! fragment a group of that type matches. Types are registered once in a
//! [`TypeRegistry`] and looked up by name while parsing.

mod int;
mod registry;
mod string;

pub use int::IntType;
pub use registry::TypeRegistry;
pub use string::StringType;

use std::fmt;

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{ConstraintError, ValueError};
use crate::value::Value;

/// A named value type usable inside `{name:type}`
pub trait PatternType: fmt::Debug + Send + Sync {
    /// The name used in pattern syntax
    fn name(&self) -> &str;

    /// The unconstrained regex fragment
    fn pattern(&self) -> &str;

    /// The regex fragment adjusted for the active constraints
    fn constrained_pattern(&self, _constraints: &[Constraint]) -> String {
        self.pattern().to_string()
    }

    /// The constraint kinds this type accepts
    fn supported_constraints(&self) -> &[ConstraintKind];

    /// Convert raw text into a value, without applying constraints
    fn convert(&self, raw: &str) -> Result<Value, ValueError>;

    /// Reject constraint combinations that can never be satisfied
    fn check_constraints(&self, _constraints: &[Constraint]) -> Result<(), ConstraintError> {
        Ok(())
    }

    /// Parse raw text (or its absence) into a constrained value
    ///
    /// `None` only succeeds when a `default` constraint supplies a value.
    fn parse_value(&self, raw: Option<&str>, constraints: &[Constraint]) -> Result<Value, ValueError> {
        let convert = |raw: &str| self.convert(raw);
        let mut value = raw.map(convert).transpose()?;
        for constraint in constraints {
            value = constraint.parse_value(value, &convert)?;
        }
        value.ok_or(ValueError::Missing)
    }

    /// Render a value for generation
    fn format_value(&self, value: &Value) -> String {
        value.to_string()
    }
}

/// Find the first constraint matching `pick`
pub(crate) fn find_constraint<T>(
    constraints: &[Constraint],
    pick: impl Fn(&Constraint) -> Option<T>,
) -> Option<T> {
    constraints.iter().find_map(pick)
}
