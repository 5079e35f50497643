//! Constraints attached to typed groups
//!
//! Constraints are written inside a group as `{name:type(key=value,...)}`.
//! Each one validates (or, for `default`, supplies) a group value. The raw
//! key/value pairs are what gets stored; the resolved [`Constraint`] values are
//! rebuilt from them against a type whenever a pattern is compiled or loaded.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ConstraintError, ValueError};
use crate::types::PatternType;
use crate::value::Value;

/// Raw constraint pairs as written in the pattern, keyed by constraint name
pub type RawConstraints = BTreeMap<String, String>;

/// The kinds of constraints understood by the built-in types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    /// Smallest accepted integer (`min`)
    Min,
    /// Largest accepted integer (`max`)
    Max,
    /// Shortest accepted text (`minLen`)
    MinLen,
    /// Longest accepted text (`maxLen`)
    MaxLen,
    /// Value used when the group did not capture (`default`)
    Default,
    /// Required text prefix (`startsWith`)
    StartsWith,
    /// Required text suffix (`endsWith`)
    EndsWith,
    /// Required substring (`contains`)
    Contains,
}

impl ConstraintKind {
    /// Every kind, in declaration order
    pub const ALL: [ConstraintKind; 8] = [
        ConstraintKind::Min,
        ConstraintKind::Max,
        ConstraintKind::MinLen,
        ConstraintKind::MaxLen,
        ConstraintKind::Default,
        ConstraintKind::StartsWith,
        ConstraintKind::EndsWith,
        ConstraintKind::Contains,
    ];

    /// The name used in pattern syntax
    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Min => "min",
            ConstraintKind::Max => "max",
            ConstraintKind::MinLen => "minLen",
            ConstraintKind::MaxLen => "maxLen",
            ConstraintKind::Default => "default",
            ConstraintKind::StartsWith => "startsWith",
            ConstraintKind::EndsWith => "endsWith",
            ConstraintKind::Contains => "contains",
        }
    }

    /// Look up a kind by its syntax name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether a constraint of this kind limits how wide a group can match
    pub fn caps_greediness(self) -> bool {
        matches!(self, ConstraintKind::Max | ConstraintKind::MaxLen)
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved constraint with its parsed parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `min=<i64>`
    Min(i64),
    /// `max=<i64>`
    Max(i64),
    /// `minLen=<usize>`
    MinLen(usize),
    /// `maxLen=<usize>`
    MaxLen(usize),
    /// `default=<raw>`
    Default(String),
    /// `startsWith=<text>`
    StartsWith(String),
    /// `endsWith=<text>`
    EndsWith(String),
    /// `contains=<text>`
    Contains(String),
}

impl Constraint {
    /// Build a constraint of the given kind from its raw parameter
    pub fn from_raw(kind: ConstraintKind, raw: &str) -> Result<Self, ConstraintError> {
        if raw.is_empty() {
            return Err(ConstraintError::EmptyValue(kind.name().to_string()));
        }

        let invalid = |expected| ConstraintError::InvalidParameter {
            key: kind.name().to_string(),
            value: raw.to_string(),
            expected,
        };

        Ok(match kind {
            ConstraintKind::Min => Constraint::Min(raw.parse().map_err(|_| invalid("an integer"))?),
            ConstraintKind::Max => Constraint::Max(raw.parse().map_err(|_| invalid("an integer"))?),
            ConstraintKind::MinLen => {
                Constraint::MinLen(raw.parse().map_err(|_| invalid("a length"))?)
            }
            ConstraintKind::MaxLen => {
                let len: usize = raw.parse().map_err(|_| invalid("a length"))?;
                if len == 0 {
                    return Err(invalid("a length of at least 1"));
                }
                Constraint::MaxLen(len)
            }
            ConstraintKind::Default => Constraint::Default(raw.to_string()),
            ConstraintKind::StartsWith => Constraint::StartsWith(raw.to_string()),
            ConstraintKind::EndsWith => Constraint::EndsWith(raw.to_string()),
            ConstraintKind::Contains => Constraint::Contains(raw.to_string()),
        })
    }

    /// The kind of this constraint
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Min(_) => ConstraintKind::Min,
            Constraint::Max(_) => ConstraintKind::Max,
            Constraint::MinLen(_) => ConstraintKind::MinLen,
            Constraint::MaxLen(_) => ConstraintKind::MaxLen,
            Constraint::Default(_) => ConstraintKind::Default,
            Constraint::StartsWith(_) => ConstraintKind::StartsWith,
            Constraint::EndsWith(_) => ConstraintKind::EndsWith,
            Constraint::Contains(_) => ConstraintKind::Contains,
        }
    }

    /// The parameter as it would be written in a pattern
    pub fn raw_value(&self) -> String {
        match self {
            Constraint::Min(n) | Constraint::Max(n) => n.to_string(),
            Constraint::MinLen(n) | Constraint::MaxLen(n) => n.to_string(),
            Constraint::Default(s)
            | Constraint::StartsWith(s)
            | Constraint::EndsWith(s)
            | Constraint::Contains(s) => s.clone(),
        }
    }

    /// Whether this constraint limits how wide a group can match
    pub fn caps_greediness(&self) -> bool {
        self.kind().caps_greediness()
    }

    /// Validate or supply a value
    ///
    /// A missing value passes through untouched so that `default` (always
    /// applied last) can fill it in. `convert` turns the default's raw text
    /// into a typed value.
    pub fn parse_value(
        &self,
        value: Option<Value>,
        convert: &dyn Fn(&str) -> Result<Value, ValueError>,
    ) -> Result<Option<Value>, ValueError> {
        let Some(value) = value else {
            return match self {
                Constraint::Default(raw) => convert(raw).map(Some),
                _ => Ok(None),
            };
        };

        let violation = |message: String| ValueError::Violation {
            constraint: self.kind().name(),
            message,
        };

        match (self, &value) {
            (Constraint::Min(min), Value::Int(n)) if n < min => {
                return Err(violation(format!("{} is less than {}", n, min)));
            }
            (Constraint::Max(max), Value::Int(n)) if n > max => {
                return Err(violation(format!("{} is greater than {}", n, max)));
            }
            (Constraint::MinLen(min), Value::Str(s)) if s.chars().count() < *min => {
                return Err(violation(format!("'{}' is shorter than {}", s, min)));
            }
            (Constraint::MaxLen(max), Value::Str(s)) if s.chars().count() > *max => {
                return Err(violation(format!("'{}' is longer than {}", s, max)));
            }
            (Constraint::StartsWith(prefix), Value::Str(s)) if !s.starts_with(prefix.as_str()) => {
                return Err(violation(format!("'{}' does not start with '{}'", s, prefix)));
            }
            (Constraint::EndsWith(suffix), Value::Str(s)) if !s.ends_with(suffix.as_str()) => {
                return Err(violation(format!("'{}' does not end with '{}'", s, suffix)));
            }
            (Constraint::Contains(needle), Value::Str(s)) if !s.contains(needle.as_str()) => {
                return Err(violation(format!("'{}' does not contain '{}'", s, needle)));
            }
            _ => {}
        }

        Ok(Some(value))
    }

    /// Prepare a bound value for generation
    pub fn serialize(&self, value: Value) -> Value {
        value
    }
}

/// Resolve raw constraint pairs against a type
///
/// Unknown keys are an error, and so is a `default` the type cannot convert.
/// The result is ordered by key with `default` moved to the end.
pub fn resolve_constraints(
    ty: &dyn PatternType,
    raw: &RawConstraints,
) -> Result<Vec<Constraint>, ConstraintError> {
    let supported = ty.supported_constraints();
    let mut resolved = Vec::with_capacity(raw.len());

    for (key, value) in raw {
        let kind = ConstraintKind::from_name(key)
            .filter(|kind| supported.contains(kind))
            .ok_or_else(|| ConstraintError::Unknown {
                type_name: ty.name().to_string(),
                key: key.clone(),
            })?;
        resolved.push(Constraint::from_raw(kind, value)?);
    }

    resolved.sort_by_key(|c| c.kind() == ConstraintKind::Default);
    ty.check_constraints(&resolved)?;

    if let Some(Constraint::Default(raw)) = resolved.last() {
        ty.convert(raw).map_err(|_| ConstraintError::InvalidParameter {
            key: ConstraintKind::Default.name().to_string(),
            value: raw.clone(),
            expected: "a value of the group's type",
        })?;
    }
    Ok(resolved)
}

/// Whether none of the constraints caps the group's width
pub fn is_greedy(constraints: &[Constraint]) -> bool {
    !constraints.iter().any(Constraint::caps_greediness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntType, StringType};

    fn int_convert(raw: &str) -> Result<Value, ValueError> {
        IntType.convert(raw)
    }

    fn raw(pairs: &[(&str, &str)]) -> RawConstraints {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ConstraintKind::ALL {
            assert_eq!(ConstraintKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ConstraintKind::from_name("nope"), None);
    }

    #[test]
    fn test_caps_greediness() {
        assert!(ConstraintKind::MaxLen.caps_greediness());
        assert!(ConstraintKind::Max.caps_greediness());
        assert!(!ConstraintKind::StartsWith.caps_greediness());
        assert!(!ConstraintKind::EndsWith.caps_greediness());
        assert!(!ConstraintKind::Contains.caps_greediness());
        assert!(!ConstraintKind::Default.caps_greediness());
    }

    #[test]
    fn test_from_raw_rejects_empty() {
        let result = Constraint::from_raw(ConstraintKind::Min, "");
        assert!(matches!(result, Err(ConstraintError::EmptyValue(_))));
    }

    #[test]
    fn test_from_raw_rejects_non_numeric() {
        let result = Constraint::from_raw(ConstraintKind::Max, "ten");
        assert!(matches!(
            result,
            Err(ConstraintError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_min_violation() {
        let min = Constraint::Min(1);
        let result = min.parse_value(Some(Value::Int(0)), &int_convert);
        assert!(matches!(
            result,
            Err(ValueError::Violation {
                constraint: "min",
                ..
            })
        ));
        assert_eq!(
            min.parse_value(Some(Value::Int(1)), &int_convert),
            Ok(Some(Value::Int(1)))
        );
    }

    #[test]
    fn test_missing_value_passes_through() {
        let min = Constraint::Min(1);
        assert_eq!(min.parse_value(None, &int_convert), Ok(None));
    }

    #[test]
    fn test_default_fills_missing_value() {
        let default = Constraint::Default("7".to_string());
        assert_eq!(
            default.parse_value(None, &int_convert),
            Ok(Some(Value::Int(7)))
        );
        assert_eq!(
            default.parse_value(Some(Value::Int(3)), &int_convert),
            Ok(Some(Value::Int(3)))
        );
    }

    #[test]
    fn test_text_constraints() {
        let convert = |raw: &str| StringType.convert(raw);
        let value = Some(Value::from("hello"));
        assert!(Constraint::StartsWith("he".into()).parse_value(value.clone(), &convert).is_ok());
        assert!(Constraint::EndsWith("lo".into()).parse_value(value.clone(), &convert).is_ok());
        assert!(Constraint::Contains("ll".into()).parse_value(value.clone(), &convert).is_ok());
        assert!(Constraint::Contains("zz".into()).parse_value(value.clone(), &convert).is_err());
        assert!(Constraint::MaxLen(4).parse_value(value.clone(), &convert).is_err());
        assert!(Constraint::MinLen(6).parse_value(value, &convert).is_err());
    }

    #[test]
    fn test_resolve_orders_default_last() {
        let resolved = resolve_constraints(&IntType, &raw(&[("min", "0"), ("default", "0")])).unwrap();
        assert_eq!(
            resolved,
            vec![Constraint::Min(0), Constraint::Default("0".to_string())]
        );
    }

    #[test]
    fn test_resolve_rejects_unconvertible_default() {
        let result = resolve_constraints(&IntType, &raw(&[("default", "abc")]));
        assert_eq!(
            result,
            Err(ConstraintError::InvalidParameter {
                key: "default".to_string(),
                value: "abc".to_string(),
                expected: "a value of the group's type",
            })
        );

        let result = resolve_constraints(&StringType, &raw(&[("default", "a,b")]));
        assert!(matches!(result, Err(ConstraintError::InvalidParameter { .. })));
        assert!(resolve_constraints(&StringType, &raw(&[("default", "home")])).is_ok());
    }

    #[test]
    fn test_resolve_unknown_key_for_type() {
        let result = resolve_constraints(&IntType, &raw(&[("maxLen", "3")]));
        assert!(matches!(result, Err(ConstraintError::Unknown { .. })));

        let result = resolve_constraints(&StringType, &raw(&[("bogus", "3")]));
        assert!(matches!(result, Err(ConstraintError::Unknown { .. })));
    }

    #[test]
    fn test_is_greedy() {
        assert!(is_greedy(&[]));
        assert!(is_greedy(&[Constraint::Min(1)]));
        assert!(!is_greedy(&[Constraint::Min(1), Constraint::Max(9)]));
    }
}
