use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{ConstraintError, ValueError};
use crate::types::{PatternType, find_constraint};
use crate::value::Value;

const SUPPORTED: [ConstraintKind; 3] = [
    ConstraintKind::Min,
    ConstraintKind::Max,
    ConstraintKind::Default,
];

/// Signed 64-bit integers written as decimal digits
#[derive(Debug, Clone, Copy, Default)]
pub struct IntType;

impl IntType {
    fn bounds(constraints: &[Constraint]) -> (Option<i64>, Option<i64>) {
        let min = find_constraint(constraints, |c| match c {
            Constraint::Min(n) => Some(*n),
            _ => None,
        });
        let max = find_constraint(constraints, |c| match c {
            Constraint::Max(n) => Some(*n),
            _ => None,
        });
        (min, max)
    }
}

fn digit_count(n: i64) -> usize {
    n.unsigned_abs().to_string().len()
}

/// ASCII digits, `width` of them at most
fn digits(width: Option<usize>) -> String {
    match width {
        Some(width) => format!("[0-9]{{1,{}}}", width),
        None => "[0-9]+".to_string(),
    }
}

impl PatternType for IntType {
    fn name(&self) -> &str {
        "int"
    }

    fn pattern(&self) -> &str {
        "-?[0-9]+"
    }

    /// `min >= 0` drops the sign. `max` bounds the digits of positive values,
    /// a negative `min` bounds the digits of negative ones.
    fn constrained_pattern(&self, constraints: &[Constraint]) -> String {
        let (min, max) = Self::bounds(constraints);
        let positive = digits(max.map(digit_count));
        match min {
            Some(min) if min >= 0 => positive,
            Some(min) => {
                let negative = digits(Some(digit_count(min)));
                if negative == positive {
                    format!("-?{}", positive)
                } else {
                    format!("(?:-{}|{})", negative, positive)
                }
            }
            None if max.is_none() => format!("-?{}", positive),
            None => format!("(?:-{}|{})", digits(None), positive),
        }
    }

    fn supported_constraints(&self) -> &[ConstraintKind] {
        &SUPPORTED
    }

    fn convert(&self, raw: &str) -> Result<Value, ValueError> {
        let invalid = || ValueError::Invalid {
            type_name: self.name().to_string(),
            raw: raw.to_string(),
        };
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        raw.parse::<i64>().map(Value::Int).map_err(|_| invalid())
    }

    fn check_constraints(&self, constraints: &[Constraint]) -> Result<(), ConstraintError> {
        match Self::bounds(constraints) {
            (Some(min), Some(max)) if min > max => Err(ConstraintError::Contradiction {
                lower: "min",
                upper: "max",
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert() {
        assert_eq!(IntType.convert("42"), Ok(Value::Int(42)));
        assert_eq!(IntType.convert("-7"), Ok(Value::Int(-7)));
        assert_eq!(IntType.convert("007"), Ok(Value::Int(7)));
        assert!(IntType.convert("+7").is_err());
        assert!(IntType.convert("-").is_err());
        assert!(IntType.convert("").is_err());
        assert!(IntType.convert("4a").is_err());
        assert!(IntType.convert("99999999999999999999").is_err());
    }

    #[test]
    fn test_constrained_pattern() {
        assert_eq!(IntType.constrained_pattern(&[]), "-?[0-9]+");
        assert_eq!(IntType.constrained_pattern(&[Constraint::Min(1)]), "[0-9]+");
        assert_eq!(
            IntType.constrained_pattern(&[Constraint::Min(0), Constraint::Max(250)]),
            "[0-9]{1,3}"
        );
        assert_eq!(
            IntType.constrained_pattern(&[Constraint::Min(-999), Constraint::Max(250)]),
            "-?[0-9]{1,3}"
        );
        assert_eq!(
            IntType.constrained_pattern(&[Constraint::Min(-1000), Constraint::Max(5)]),
            "(?:-[0-9]{1,4}|[0-9]{1,1})"
        );
        assert_eq!(
            IntType.constrained_pattern(&[Constraint::Min(-5)]),
            "(?:-[0-9]{1,1}|[0-9]+)"
        );
    }

    #[test]
    fn test_max_alone_leaves_negatives_unbounded() {
        let pattern = IntType.constrained_pattern(&[Constraint::Max(5)]);
        assert_eq!(pattern, "(?:-[0-9]+|[0-9]{1,1})");
        let re = regex::Regex::new(&format!("^{}$", pattern)).unwrap();
        assert!(re.is_match("-100"));
        assert!(re.is_match("5"));
        assert!(!re.is_match("10"));
    }

    #[test]
    fn test_only_ascii_digits_match() {
        for pattern in [IntType.pattern().to_string(), IntType.constrained_pattern(&[Constraint::Max(9)])] {
            let re = regex::Regex::new(&format!("^{}$", pattern)).unwrap();
            assert!(re.is_match("3"));
            assert!(!re.is_match("\u{0663}"), "{}", pattern);
        }
    }

    #[test]
    fn test_parse_value_applies_constraints() {
        let constraints = [Constraint::Min(1)];
        assert_eq!(IntType.parse_value(Some("5"), &constraints), Ok(Value::Int(5)));
        assert!(matches!(
            IntType.parse_value(Some("0"), &constraints),
            Err(ValueError::Violation { .. })
        ));
    }

    #[test]
    fn test_parse_value_null_requires_default() {
        assert_eq!(IntType.parse_value(None, &[]), Err(ValueError::Missing));
        let constraints = [Constraint::Min(0), Constraint::Default("0".to_string())];
        assert_eq!(IntType.parse_value(None, &constraints), Ok(Value::Int(0)));
    }

    #[test]
    fn test_contradicting_bounds() {
        let result = IntType.check_constraints(&[Constraint::Min(5), Constraint::Max(1)]);
        assert!(matches!(result, Err(ConstraintError::Contradiction { .. })));
    }
}
