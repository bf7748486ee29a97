use crate::rules::Span;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Location and text of a placement rule that failed to parse
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSyntaxDetails {
    pub message: String,
    pub span: Span,
    pub rule_text: Arc<str>,
}

impl fmt::Display for RuleSyntaxDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rule syntax error: {} at column {} in '{}'",
            self.message, self.span.col, self.rule_text
        )
    }
}

/// Error types for grid design
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesignError {
    /// A placement rule string does not match the rule grammar
    #[error("{0}")]
    RuleSyntax(Box<RuleSyntaxDetails>),

    /// A placement rule is well formed but cannot be evaluated as written
    #[error("Invalid placement rule: {0}")]
    InvalidRule(String),

    /// Backing sequence length differs from the product of the shape
    #[error("Shape mismatch: shape {shape:?} holds {expected} cells but {actual} were supplied")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// A geometry-specific constraint was applied to a grid it cannot describe
    #[error("{constraint} requires {requirement}, got shape {shape:?}")]
    ShapeAssumption {
        constraint: &'static str,
        requirement: &'static str,
        shape: Vec<usize>,
    },

    /// Coordinate, flat index or axis outside the grid
    #[error("Coordinate {coord} is outside a grid of shape {shape:?}")]
    OutOfBounds { coord: String, shape: Vec<usize> },

    #[error("Unknown component '{0}'")]
    UnknownComponent(String),

    /// Malformed or inconsistent component catalog
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The solver rejected the model or failed internally
    #[error("Solver error: {0}")]
    Solver(String),

    /// A metric has no value for the given grid
    #[error("Undefined metric: {0}")]
    Undefined(String),
}

impl DesignError {
    /// Create a rule syntax error pointing into `rule_text`
    pub fn rule_syntax(message: impl Into<String>, span: Span, rule_text: &str) -> Self {
        Self::RuleSyntax(Box::new(RuleSyntaxDetails {
            message: message.into(),
            span,
            rule_text: Arc::from(rule_text),
        }))
    }

    pub fn invalid_rule(message: impl Into<String>) -> Self {
        Self::InvalidRule(message.into())
    }

    pub fn shape_assumption(
        constraint: &'static str,
        requirement: &'static str,
        shape: &[usize],
    ) -> Self {
        Self::ShapeAssumption {
            constraint,
            requirement,
            shape: shape.to_vec(),
        }
    }

    pub fn out_of_bounds(coord: impl fmt::Debug, shape: &[usize]) -> Self {
        Self::OutOfBounds {
            coord: format!("{:?}", coord),
            shape: shape.to_vec(),
        }
    }

    pub fn bad_axis(axis: usize, shape: &[usize]) -> Self {
        Self::OutOfBounds {
            coord: format!("axis {}", axis),
            shape: shape.to_vec(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }

    pub fn solver(message: impl Into<String>) -> Self {
        Self::Solver(message.into())
    }

    pub fn undefined(message: impl Into<String>) -> Self {
        Self::Undefined(message.into())
    }
}
