//! Validation pipeline run between parsing and compilation
//!
//! Validators are independent and run in a fixed order. The first failure
//! aborts the pipeline; later validators never see a tree an earlier one
//! rejected.

use crate::ast::{Group, Node};
use crate::error::ValidationError;

/// A structural check over a whole tree
pub trait Validator: Send + Sync {
    /// A short name used in logs
    fn name(&self) -> &'static str;

    /// Check the tree rooted at `root`
    fn validate(&self, root: &Node) -> Result<(), ValidationError>;
}

/// Local rules for each node: optional sections and literals must not be empty
pub struct TreeContextValidator;

impl TreeContextValidator {
    fn visit(node: &Node) -> Result<(), ValidationError> {
        match node {
            Node::Literal(literal) if literal.text().is_empty() => Err(ValidationError::EmptyLiteral),
            Node::Literal(_) | Node::Group(_) => Ok(()),
            Node::SubSequence(seq) if seq.children().is_empty() => {
                Err(ValidationError::EmptyOptionalSection)
            }
            Node::Sequence(seq) | Node::SubSequence(seq) => {
                seq.children().iter().try_for_each(Self::visit)
            }
        }
    }
}

impl Validator for TreeContextValidator {
    fn name(&self) -> &'static str {
        "tree-context"
    }

    fn validate(&self, root: &Node) -> Result<(), ValidationError> {
        Self::visit(root)
    }
}

/// Rejects two greedy groups with nothing between them
///
/// Within one sibling list, a literal or an optional section resets the
/// tracker. Optional sections are checked on their own.
pub struct GreedyAdjacencyValidator;

impl GreedyAdjacencyValidator {
    fn scan<'a>(children: &'a [Node], last_greedy: &mut Option<&'a Group>) -> Result<(), ValidationError> {
        for child in children {
            if let Node::SubSequence(seq) = child {
                Self::scan(seq.children(), &mut None)?;
            }
            if child.provides_boundary() {
                *last_greedy = None;
                continue;
            }
            match child {
                Node::Group(group) if group.is_greedy() => {
                    if let Some(previous) = last_greedy {
                        return Err(ValidationError::AdjacentGreedyGroups {
                            first: previous.name().to_string(),
                            second: group.name().to_string(),
                        });
                    }
                    *last_greedy = Some(group);
                }
                Node::Group(_) => *last_greedy = None,
                Node::Sequence(seq) => Self::scan(seq.children(), last_greedy)?,
                Node::Literal(_) | Node::SubSequence(_) => {}
            }
        }
        Ok(())
    }
}

impl Validator for GreedyAdjacencyValidator {
    fn name(&self) -> &'static str {
        "greedy-adjacency"
    }

    fn validate(&self, root: &Node) -> Result<(), ValidationError> {
        match root.children() {
            Some(children) => Self::scan(children, &mut None),
            None => Ok(()),
        }
    }
}

/// An ordered chain of validators
pub struct ValidationPipeline {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationPipeline {
    /// Create an empty pipeline
    pub fn empty() -> Self {
        ValidationPipeline {
            validators: Vec::new(),
        }
    }

    /// Create the standard pipeline: tree context, then greedy adjacency
    pub fn standard() -> Self {
        ValidationPipeline::empty()
            .with(TreeContextValidator)
            .with(GreedyAdjacencyValidator)
    }

    /// Append a validator to the end of the chain
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Names of the validators, in run order
    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run every validator in order, stopping at the first failure
    pub fn validate(&self, root: &Node) -> Result<(), ValidationError> {
        for validator in &self.validators {
            validator.validate(root).inspect_err(|err| {
                tracing::debug!(validator = validator.name(), %err, "validation failed");
            })?;
        }
        Ok(())
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
