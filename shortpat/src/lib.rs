//! Shortpat Core Library
//!
//! A pattern language for short-URL shapes such as
//! `PAGE{uid:int(min=1)}(-{lang:int(min=0,default=0)})`. Patterns compile to
//! anchored regexes that match input into typed values and generate strings
//! back from values. A heuristic pre-filter rejects inputs that no pattern of
//! a set can match before any regex runs.

pub mod ast;
pub mod compiler;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod groups;
pub mod heuristic;
pub mod parser;
pub mod set;
pub mod types;
pub mod validate;
pub mod value;

pub use ast::{Group, Literal, Node, NodeRecord, Sequence};
pub use compiler::{CompileReport, PatternCompiler};
pub use constraint::{Constraint, ConstraintKind, RawConstraints};
pub use engine::{CompiledPattern, CompiledPatternRecord, GroupValue, MatchResult, RECORD_VERSION};
pub use error::{
    CompileError, ConstraintError, GenerateError, MatchError, ParseError, ParseErrorKind,
    PatternError, Result, TypeError, ValidationError, ValueError,
};
pub use groups::{GroupCollector, GroupIdCounter, GroupInfo, GroupRegistry};
pub use heuristic::{
    Analyzer, AnalyzerOptions, ByteSet, HEURISTIC_VERSION, HeuristicCompiler, HeuristicOptions,
    HeuristicRecord, NodeAnalysis, PatternHeuristic,
};
pub use parser::{Parser, parse};
pub use set::PatternSet;
pub use types::{IntType, PatternType, StringType, TypeRegistry};
pub use validate::{GreedyAdjacencyValidator, TreeContextValidator, ValidationPipeline, Validator};
pub use value::{BareValue, Value};

/// Compile a pattern with the built-in types
///
/// This is the main entry point for one-off patterns. Hosts with custom
/// types build a [`PatternCompiler`] over their own [`TypeRegistry`].
pub fn compile(pattern: &str) -> Result<CompiledPattern> {
    PatternCompiler::default().compile(pattern)
}
