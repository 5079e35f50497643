//! Compiler turning pattern text into [`CompiledPattern`]s
//!
//! Compilation runs parse, duplicate-name check, the validation pipeline and
//! finally builds the anchored regex. The same compiler rehydrates stored
//! records by re-binding group types from its registry.

use std::fmt;

use tracing::debug;

use crate::ast::Node;
use crate::engine::{CompiledPattern, CompiledPatternRecord, RECORD_VERSION};
use crate::error::{CompileError, Result};
use crate::groups::{GroupCollector, GroupIdCounter, GroupInfo, GroupRegistry};
use crate::parser::Parser;
use crate::types::TypeRegistry;
use crate::validate::ValidationPipeline;

/// Factory for compiled patterns
pub struct PatternCompiler {
    registry: TypeRegistry,
    pipeline: ValidationPipeline,
}

impl PatternCompiler {
    /// Create a compiler over the given types with the standard validators
    pub fn new(registry: TypeRegistry) -> Self {
        PatternCompiler {
            registry,
            pipeline: ValidationPipeline::standard(),
        }
    }

    /// Replace the validation pipeline
    pub fn with_pipeline(mut self, pipeline: ValidationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// The types this compiler resolves groups against
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn build(&self, pattern: &str) -> Result<(Node, GroupRegistry)> {
        let ast = Parser::new(pattern, &self.registry).parse(&mut GroupIdCounter::new())?;
        let mut groups = GroupRegistry::new();
        GroupCollector::collect(&ast, &mut groups)?;
        self.pipeline.validate(&ast)?;
        Ok((ast, groups))
    }

    /// Compile a pattern
    ///
    /// # Example
    /// ```
    /// use shortpat::PatternCompiler;
    ///
    /// let compiler = PatternCompiler::default();
    /// let pattern = compiler.compile("PAGE{uid:int(min=1)}").unwrap();
    /// assert_eq!(pattern.regex(), r"^PAGE(?P<g1>[0-9]+)$");
    /// ```
    pub fn compile(&self, pattern: &str) -> Result<CompiledPattern> {
        let (ast, groups) = self.build(pattern)?;
        let regex = format!("^{}$", ast.to_regex());
        let compiled = CompiledPattern::new(pattern, ast, &regex, &groups)?;
        debug!(pattern, regex = compiled.regex(), groups = groups.group_count(), "compiled pattern");
        Ok(compiled)
    }

    /// Compile with a report of every intermediate stage
    pub fn compile_debug(&self, pattern: &str) -> Result<CompileReport> {
        let (ast, groups) = self.build(pattern)?;
        Ok(CompileReport {
            input: pattern.to_string(),
            ast: format!("{:?}", ast.to_record()),
            regex: format!("^{}$", ast.to_regex()),
            groups: groups.groups().to_vec(),
        })
    }

    /// Rebuild a compiled pattern from a stored record without re-parsing
    ///
    /// # Errors
    /// Fails on a version mismatch, a type that is not registered here, or
    /// group metadata that disagrees with the stored tree.
    pub fn from_record(&self, record: &CompiledPatternRecord) -> Result<CompiledPattern> {
        if record.version != RECORD_VERSION {
            return Err(CompileError::UnsupportedVersion {
                found: record.version,
                expected: RECORD_VERSION,
            }
            .into());
        }

        let ast = Node::from_record(&record.ast, &self.registry)?;
        let mut groups = GroupRegistry::new();
        GroupCollector::collect(&ast, &mut groups)
            .map_err(|e| CompileError::Corrupt(e.to_string()))?;
        if groups.named_groups() != record.named_groups {
            return Err(CompileError::Corrupt("group table does not match tree".to_string()).into());
        }

        let compiled = CompiledPattern::new(record.pattern.clone(), ast, &record.regex, &groups)?;
        debug!(pattern = compiled.pattern(), "rehydrated pattern");
        Ok(compiled)
    }

    /// Rebuild a compiled pattern from its JSON record
    pub fn from_json(&self, json: &str) -> Result<CompiledPattern> {
        self.from_record(&CompiledPatternRecord::from_json(json)?)
    }
}

impl Default for PatternCompiler {
    fn default() -> Self {
        PatternCompiler::new(TypeRegistry::with_defaults())
    }
}

/// Intermediate stages of one compilation
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// The original pattern
    pub input: String,
    /// The tree (debug format)
    pub ast: String,
    /// The anchored regex
    pub regex: String,
    /// Groups in order of appearance
    pub groups: Vec<GroupInfo>,
}

impl fmt::Display for CompileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compilation Report")?;
        writeln!(f, "==================")?;
        writeln!(f, "Input:  {}", self.input)?;
        writeln!(f, "AST:    {}", self.ast)?;
        writeln!(f, "Regex:  {}", self.regex)?;
        for group in &self.groups {
            write!(f, "Group {}: {} ({})", group.id, group.name, group.type_name)?;
            if group.optional {
                write!(f, " optional")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
