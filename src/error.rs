//! Error types for the tutorial engine.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TutorError>;

/// Errors raised by the algebra, the calculator and candidate parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TutorError {
    /// Operand shapes are incompatible for an algebra operation.
    #[error("dimension mismatch in {op}: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        /// Operation name.
        op: &'static str,
        /// Left operand shape `(rows, cols)`.
        left: (usize, usize),
        /// Right operand shape `(rows, cols)`.
        right: (usize, usize),
    },

    /// A candidate matrix does not have the expected shape.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A matrix was built from no rows or from zero-length rows.
    #[error("matrix must have at least one row and one column")]
    EmptyMatrix,

    /// Rows of differing lengths were supplied.
    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A step name did not match any known step.
    #[error("unknown step: {0}")]
    UnknownStep(String),
}

impl TutorError {
    /// Whether this error stems from learner input rather than from the
    /// engine's own data.
    pub fn is_learner_error(&self) -> bool {
        matches!(
            self,
            TutorError::ShapeMismatch { .. } | TutorError::EmptyMatrix | TutorError::RaggedRows { .. }
        )
    }
}
