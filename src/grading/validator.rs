//! Tolerance-based grading of learner matrices.
//!
//! The validator compares a candidate cell by cell against the reference
//! matrix of a step and returns a mask of wrong cells. It never touches
//! progress; recording a completion is the caller's job.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::config::TOLERANCE;
use crate::core::matrix::{self, Matrix};
use crate::core::weights::AttentionWeights;
use crate::error::Result;
use crate::grading::reference::ReferenceCalculator;
use crate::steps::step::StepId;

/// Outcome of grading one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no cell is marked wrong.
    pub valid: bool,

    /// Shaped like the expected matrix; `true` marks a wrong cell.
    pub cell_errors: Array2<bool>,
}

impl ValidationResult {
    /// Every cell of an `shape`-sized grid marked wrong.
    pub fn all_invalid(shape: (usize, usize)) -> Self {
        Self {
            valid: false,
            cell_errors: Array2::from_elem(shape, true),
        }
    }

    /// Number of wrong cells.
    pub fn error_count(&self) -> usize {
        self.cell_errors.iter().filter(|&&e| e).count()
    }

    /// `(row, col)` of every wrong cell, row-major.
    pub fn error_cells(&self) -> Vec<(usize, usize)> {
        self.cell_errors
            .indexed_iter()
            .filter(|&(_, &e)| e)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Validator configuration.
#[derive(Clone, Copy, Debug)]
pub struct Validator {
    /// Largest accepted absolute deviation per cell.
    pub tolerance: f64,
}

impl Validator {
    /// Validator with the tutorial tolerance.
    pub fn new() -> Self {
        Self {
            tolerance: TOLERANCE,
        }
    }

    /// Validator accepting deviations up to `tolerance` per cell.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Grade `candidate` against the tutorial reference for `step`.
    pub fn validate(&self, step: StepId, candidate: &Matrix) -> Result<ValidationResult> {
        self.validate_with(&AttentionWeights::tutorial(), step, candidate)
    }

    /// Grade `candidate` against the reference derived from `weights`.
    ///
    /// Only malformed weights produce an error. A wrong-shaped candidate is
    /// an ordinary all-invalid result.
    pub fn validate_with(
        &self,
        weights: &AttentionWeights,
        step: StepId,
        candidate: &Matrix,
    ) -> Result<ValidationResult> {
        let expected = ReferenceCalculator::new(weights).reference_matrix(step)?;
        Ok(self.compare(&expected, candidate))
    }

    /// Grade raw learner rows. Empty or ragged input counts as a shape
    /// mismatch and yields an all-invalid result.
    pub fn validate_rows(&self, step: StepId, rows: &[Vec<f64>]) -> Result<ValidationResult> {
        self.validate_rows_with(&AttentionWeights::tutorial(), step, rows)
    }

    /// [`Validator::validate_rows`] against the reference derived from `weights`.
    pub fn validate_rows_with(
        &self,
        weights: &AttentionWeights,
        step: StepId,
        rows: &[Vec<f64>],
    ) -> Result<ValidationResult> {
        let expected = ReferenceCalculator::new(weights).reference_matrix(step)?;
        match matrix::from_rows(rows) {
            Ok(candidate) => Ok(self.compare(&expected, &candidate)),
            Err(e) if e.is_learner_error() => Ok(ValidationResult::all_invalid(expected.dim())),
            Err(e) => Err(e),
        }
    }

    /// Cell-wise comparison of two matrices.
    pub fn compare(&self, expected: &Matrix, candidate: &Matrix) -> ValidationResult {
        if matrix::ensure_shape(candidate, expected.dim()).is_err() {
            return ValidationResult::all_invalid(expected.dim());
        }

        let tolerance = self.tolerance;
        let cell_errors = Zip::from(expected)
            .and(candidate)
            .map_collect(|&e, &c| {
                let diff = (c - e).abs();
                diff.is_nan() || diff > tolerance
            });
        let valid = !cell_errors.iter().any(|&wrong| wrong);

        ValidationResult { valid, cell_errors }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Grade `candidate` for `step` with the default tolerance.
pub fn validate(step: StepId, candidate: &Matrix) -> Result<ValidationResult> {
    Validator::new().validate(step, candidate)
}
