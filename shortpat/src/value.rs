//! Typed group values
//!
//! Values are what types produce from captured text and what generation
//! consumes. Generation accepts anything that can be reduced to a bare
//! [`Value`], including the structured per-group entries of a match result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::GroupValue;

/// A typed value bound to a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An integer value
    Int(i64),
    /// A text value
    Str(String),
}

impl Value {
    /// Get the integer, if this is an integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Str(_) => None,
        }
    }

    /// Get the text, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Int(_) => None,
            Value::Str(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Anything that can be stripped down to a bare [`Value`] for generation
pub trait BareValue {
    /// Reduce to the bare value
    fn into_value(self) -> Value;
}

impl BareValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl BareValue for &Value {
    fn into_value(self) -> Value {
        self.clone()
    }
}

impl BareValue for GroupValue {
    fn into_value(self) -> Value {
        self.value
    }
}

impl BareValue for &GroupValue {
    fn into_value(self) -> Value {
        self.value.clone()
    }
}

impl BareValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl BareValue for &str {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl BareValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}
