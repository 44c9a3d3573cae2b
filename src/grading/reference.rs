//! Reference value calculator.
//!
//! Derives the expected matrix of every step by running the attention
//! algebra over the constant weights. Each step recurses into the steps it
//! depends on, so the composition mirrors the dependency graph. Nothing is
//! cached; callers that want caching keep their own.

use crate::config::SCALING_FACTOR;
use crate::core::matrix::{self, Matrix};
use crate::core::weights::AttentionWeights;
use crate::error::Result;
use crate::steps::step::StepId;

/// Evaluates reference matrices against a borrowed weight bundle.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceCalculator<'a> {
    weights: &'a AttentionWeights,
    scaling_factor: f64,
}

impl<'a> ReferenceCalculator<'a> {
    /// Calculator over `weights` with the tutorial scaling factor.
    pub fn new(weights: &'a AttentionWeights) -> Self {
        Self {
            weights,
            scaling_factor: SCALING_FACTOR,
        }
    }

    pub fn weights(&self) -> &'a AttentionWeights {
        self.weights
    }

    /// Shape of the expected matrix for `step`, read off the weight
    /// dimensions without evaluating anything.
    pub fn expected_shape(&self, step: StepId) -> (usize, usize) {
        let w = self.weights;
        let tokens = w.input.nrows();
        match step {
            StepId::Input => w.input.dim(),
            StepId::Q => (tokens, w.w_q.ncols()),
            StepId::K => (tokens, w.w_k.ncols()),
            StepId::V | StepId::Output => (tokens, w.w_v.ncols()),
            StepId::TransposeK => (w.w_k.ncols(), tokens),
            StepId::Scores | StepId::Softmax => (tokens, tokens),
        }
    }

    /// Expected matrix for `step`.
    pub fn reference_matrix(&self, step: StepId) -> Result<Matrix> {
        let w = self.weights;
        match step {
            StepId::Input => Ok(w.input.clone()),
            StepId::Q => matrix::multiply(&w.input, &w.w_q),
            StepId::K => matrix::multiply(&w.input, &w.w_k),
            StepId::V => matrix::multiply(&w.input, &w.w_v),
            StepId::TransposeK => {
                let k = self.reference_matrix(StepId::K)?;
                Ok(matrix::transpose(&k))
            }
            StepId::Scores => {
                let q = self.reference_matrix(StepId::Q)?;
                let k_t = self.reference_matrix(StepId::TransposeK)?;
                // Scale the finished product, not the individual terms.
                let raw = matrix::multiply(&q, &k_t)?;
                Ok(matrix::scale(&raw, self.scaling_factor))
            }
            StepId::Softmax => {
                let scores = self.reference_matrix(StepId::Scores)?;
                Ok(matrix::softmax_rows(&scores))
            }
            StepId::Output => {
                let attention = self.reference_matrix(StepId::Softmax)?;
                let v = self.reference_matrix(StepId::V)?;
                matrix::multiply(&attention, &v)
            }
        }
    }
}

/// Expected matrix for `step` over the tutorial weights.
pub fn reference_matrix(step: StepId) -> Result<Matrix> {
    let weights = AttentionWeights::tutorial();
    ReferenceCalculator::new(&weights).reference_matrix(step)
}

/// Shape of the expected matrix for `step` under the tutorial weights.
pub fn expected_shape(step: StepId) -> (usize, usize) {
    let weights = AttentionWeights::tutorial();
    ReferenceCalculator::new(&weights).expected_shape(step)
}
