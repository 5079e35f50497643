use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{ConstraintError, ValueError};
use crate::types::{PatternType, find_constraint};
use crate::value::Value;

const CLASS: &str = "[a-zA-Z0-9_-]";

const SUPPORTED: [ConstraintKind; 6] = [
    ConstraintKind::MinLen,
    ConstraintKind::MaxLen,
    ConstraintKind::StartsWith,
    ConstraintKind::EndsWith,
    ConstraintKind::Contains,
    ConstraintKind::Default,
];

/// URL-safe words: ASCII letters, digits, `_` and `-`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

impl StringType {
    fn lengths(constraints: &[Constraint]) -> (Option<usize>, Option<usize>) {
        let min = find_constraint(constraints, |c| match c {
            Constraint::MinLen(n) => Some(*n),
            _ => None,
        });
        let max = find_constraint(constraints, |c| match c {
            Constraint::MaxLen(n) => Some(*n),
            _ => None,
        });
        (min, max)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl PatternType for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn pattern(&self) -> &str {
        "[a-zA-Z0-9_-]+"
    }

    fn constrained_pattern(&self, constraints: &[Constraint]) -> String {
        let (min, max) = Self::lengths(constraints);
        // Empty captures count as absent, so the lower bound never drops below 1.
        let lower = min.unwrap_or(1).max(1);
        match max {
            Some(max) => format!("{}{{{},{}}}", CLASS, lower, max),
            None if lower == 1 => format!("{}+", CLASS),
            None => format!("{}{{{},}}", CLASS, lower),
        }
    }

    fn supported_constraints(&self) -> &[ConstraintKind] {
        &SUPPORTED
    }

    fn convert(&self, raw: &str) -> Result<Value, ValueError> {
        if raw.is_empty() || !raw.chars().all(is_word_char) {
            return Err(ValueError::Invalid {
                type_name: self.name().to_string(),
                raw: raw.to_string(),
            });
        }
        Ok(Value::Str(raw.to_string()))
    }

    fn check_constraints(&self, constraints: &[Constraint]) -> Result<(), ConstraintError> {
        match Self::lengths(constraints) {
            (Some(min), Some(max)) if min > max => Err(ConstraintError::Contradiction {
                lower: "minLen",
                upper: "maxLen",
            }),
            _ => Ok(()),
        }
    }
}
