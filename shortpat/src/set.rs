//! Ordered pattern sets with a shared pre-filter

use tracing::trace;

use crate::compiler::PatternCompiler;
use crate::engine::{CompiledPattern, MatchResult};
use crate::error::Result;
use crate::heuristic::{HeuristicCompiler, HeuristicOptions, PatternHeuristic};

/// Compiled patterns tried in order, guarded by a [`PatternHeuristic`]
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
    heuristic: PatternHeuristic,
}

impl PatternSet {
    /// Build a set with the default heuristic options
    pub fn new(patterns: Vec<CompiledPattern>) -> Self {
        PatternSet::with_options(patterns, HeuristicOptions::default())
    }

    /// Build a set with custom heuristic options
    pub fn with_options(patterns: Vec<CompiledPattern>, options: HeuristicOptions) -> Self {
        let heuristic = HeuristicCompiler::new(options).compile(&patterns);
        PatternSet { patterns, heuristic }
    }

    /// Reassemble a set from patterns and a previously built heuristic
    pub fn from_parts(patterns: Vec<CompiledPattern>, heuristic: PatternHeuristic) -> Self {
        PatternSet { patterns, heuristic }
    }

    /// Compile every pattern and build the set
    pub fn compile<I, S>(compiler: &PatternCompiler, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compiler.compile(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(PatternSet::new(patterns))
    }

    /// The patterns, in match order
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// The pre-filter
    pub fn heuristic(&self) -> &PatternHeuristic {
        &self.heuristic
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the set has no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Find the first pattern matching `input`
    ///
    /// Returns the pattern's index and its match result. The result may carry
    /// group errors; structural matching alone decides which pattern wins.
    pub fn find(&self, input: &str) -> Option<(usize, MatchResult)> {
        if !self.heuristic.support(input) {
            trace!(input, "rejected by heuristic");
            return None;
        }
        self.patterns
            .iter()
            .enumerate()
            .find_map(|(index, pattern)| pattern.match_str(input).map(|result| (index, result)))
    }
}
