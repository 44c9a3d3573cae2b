//! Fixed tutorial data: token embeddings and the three projection weights.
//!
//! The five tokens are one-hot rows over an 8-dim embedding space. The
//! weights route tokens 0–2 and 3–4 into two separate feature groups so the
//! attention pattern is easy to reason about by hand.

use ndarray::{array, Array2};
use serde::{Deserialize, Serialize};

use crate::config::{D_K, D_MODEL, N_TOKENS};
use crate::core::matrix::Matrix;

/// Token labels for the rows of the input matrix.
pub const TOKENS: [&str; N_TOKENS] = ["The", "next", "day", "is", "bright"];

/// Token labels for `m`'s rows when it has one row per token.
pub fn token_labels(m: &Matrix) -> Option<&'static [&'static str]> {
    let labels: &'static [&'static str] = &TOKENS;
    (m.nrows() == labels.len()).then_some(labels)
}

/// Input embeddings (5×8).
pub fn input_matrix() -> Matrix {
    array![
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    ]
}

/// Query weights `W_q` (8×4).
pub fn w_q() -> Matrix {
    grouped_projection(10.0)
}

/// Key weights `W_k` (8×4).
pub fn w_k() -> Matrix {
    grouped_projection(2.0)
}

/// Value weights `W_v` (8×4).
pub fn w_v() -> Matrix {
    array![
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
    ]
}

/// Rows 0–2 feed column 0, rows 3–4 feed column 1, rows 5–7 are zero.
fn grouped_projection(weight: f64) -> Matrix {
    let mut w = Array2::zeros((D_MODEL, D_K));
    for row in 0..3 {
        w[[row, 0]] = weight;
    }
    for row in 3..5 {
        w[[row, 1]] = weight;
    }
    w
}

/// The four constant matrices of the attention walkthrough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttentionWeights {
    /// Token embeddings `X`.
    pub input: Matrix,

    /// Query projection `W_q`.
    pub w_q: Matrix,

    /// Key projection `W_k`.
    pub w_k: Matrix,

    /// Value projection `W_v`.
    pub w_v: Matrix,
}

impl AttentionWeights {
    /// The fixed tutorial dataset.
    pub fn tutorial() -> Self {
        Self {
            input: input_matrix(),
            w_q: w_q(),
            w_k: w_k(),
            w_v: w_v(),
        }
    }

    /// Custom bundle; shapes are checked lazily by the algebra.
    pub fn new(input: Matrix, w_q: Matrix, w_k: Matrix, w_v: Matrix) -> Self {
        Self { input, w_q, w_k, w_v }
    }
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self::tutorial()
    }
}
