//! Error types for the pattern language
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by their source: parsing, type lookup, constraint
//! resolution, validation, compilation, or generation. Per-group match
//! failures are not fatal and are reported through [`ValueError`] inside a
//! match result instead.

use thiserror::Error;

/// The main error type for the pattern language
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    /// Malformed pattern syntax
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Unknown or conflicting value types
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// Constraint resolution failures
    #[error("constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    /// Structural rules violated by a parsed tree
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Regex backend or record rehydration failures
    #[error("compilation error: {0}")]
    Compile(#[from] CompileError),

    /// Generation of a concrete string failed
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),
}

/// A syntax error with its location in the pattern
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {offset} in pattern `{pattern}`")]
pub struct ParseError {
    /// The full pattern text
    pub pattern: String,
    /// Byte offset of the offending construct
    pub offset: usize,
    /// What went wrong
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(pattern: impl Into<String>, offset: usize, kind: ParseErrorKind) -> Self {
        ParseError {
            pattern: pattern.into(),
            offset,
            kind,
        }
    }
}

/// Specific kinds of parse errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// `{` without a matching `}`
    #[error("unterminated group")]
    UnterminatedGroup,

    /// `(` without a matching `)`
    #[error("unterminated optional section")]
    UnterminatedOptional,

    /// A quoted constraint value without its closing quote
    #[error("unterminated quoted value")]
    UnterminatedQuote,

    /// The pattern has no content at all
    #[error("empty pattern")]
    EmptyPattern,

    /// Group content does not follow `name:type(key=value,...)`
    #[error("invalid group `{0}`")]
    InvalidGroup(String),

    /// A constraint entry does not follow `key=value`
    #[error("invalid constraint `{0}`")]
    InvalidConstraint(String),
}

/// Errors raised while looking up or registering types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    /// A group references a type that is not registered
    #[error("unknown type '{type_name}' in group '{group}', valid types are: {available}")]
    UnknownType {
        /// The group that referenced the type
        group: String,
        /// The unknown type name
        type_name: String,
        /// Comma-separated list of registered type names
        available: String,
    },

    /// A type name was registered twice
    #[error("type '{0}' is already registered")]
    DuplicateType(String),
}

/// Errors raised while resolving constraints against a type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    /// The constraint key is not supported by the type
    #[error("unknown constraint '{key}' for type '{type_name}'")]
    Unknown {
        /// The type the constraint was attached to
        type_name: String,
        /// The unsupported key
        key: String,
    },

    /// The constraint has no value
    #[error("constraint '{0}' requires a value")]
    EmptyValue(String),

    /// The constraint value cannot be interpreted
    #[error("constraint '{key}' expects {expected}, got '{value}'")]
    InvalidParameter {
        /// The constraint key
        key: String,
        /// The raw value
        value: String,
        /// A description of the accepted values
        expected: &'static str,
    },

    /// Two bounds contradict each other
    #[error("constraint '{lower}' exceeds '{upper}'")]
    Contradiction {
        /// The lower bound key
        lower: &'static str,
        /// The upper bound key
        upper: &'static str,
    },
}

/// Structural rule violations found after parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `()` with nothing inside
    #[error("optional section must not be empty")]
    EmptyOptionalSection,

    /// A literal node without text
    #[error("literal must not be empty")]
    EmptyLiteral,

    /// Two groups without width limits next to each other
    #[error("groups '{first}' and '{second}' are both greedy and need a literal or optional section between them")]
    AdjacentGreedyGroups {
        /// The earlier group
        first: String,
        /// The later group
        second: String,
    },

    /// The same group name appears twice
    #[error("duplicate group name '{0}'")]
    DuplicateGroupName(String),
}

/// Errors from the regex backend or from rehydrating stored records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The derived regex was rejected by the backend
    #[error("invalid regex: {0}")]
    Regex(String),

    /// The stored record was written by another format version
    #[error("unsupported record version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version found in the record
        found: u32,
        /// Version this build understands
        expected: u32,
    },

    /// The stored record is inconsistent or cannot be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Errors raised while generating a string from values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// A required group has no value
    #[error("missing value for group '{0}'")]
    MissingValue(String),
}

/// Per-group failures collected during matching
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// No value was captured and no default exists
    #[error("value is required")]
    Missing,

    /// The raw text is not a valid value of the type
    #[error("'{raw}' is not a valid {type_name}")]
    Invalid {
        /// The type name
        type_name: String,
        /// The rejected raw text
        raw: String,
    },

    /// The value violates a constraint
    #[error("constraint '{constraint}' violated: {message}")]
    Violation {
        /// The constraint name
        constraint: &'static str,
        /// A human-readable description
        message: String,
    },
}

/// A [`ValueError`] attached to the group it occurred in
#[derive(Error, Debug, Clone, PartialEq)]
#[error("group '{group}': {error}")]
pub struct MatchError {
    /// The group name
    pub group: String,
    /// The underlying error
    pub error: ValueError,
}

/// Result type alias for pattern operations
pub type Result<T> = std::result::Result<T, PatternError>;
