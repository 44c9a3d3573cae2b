//! # attention-tutor
//!
//! Step-dependency and validation engine for a hands-on self-attention
//! tutorial. A learner reproduces every intermediate matrix of scaled
//! dot-product attention by hand; this crate knows what each matrix should
//! be, grades what the learner typed, and decides which steps are open.
//!
//! ## Components
//!
//! 1. **Matrix algebra** — multiply, transpose, stable row softmax
//! 2. **Reference calculator** — derives the expected matrix of every step
//! 3. **Validator** — tolerance-based, cell-by-cell grading
//! 4. **Dependency gate** — one prerequisite table, two presentations
//! 5. **Progress / session** — caller-side completion record
//!
//! ## Computation graph
//!
//! ```text
//! Input ─┬─ Q ──────────────┐
//!        ├─ K ── Kᵗ ─────── Scores ── Softmax ─┐
//!        └─ V ─────────────────────────────── Output
//! ```

pub mod core;
pub mod error;
pub mod grading;
pub mod runtime;
pub mod steps;

pub use error::{Result, TutorError};

/// Tutorial-wide constants.
pub mod config {
    /// Number of tokens in the input sequence.
    pub const N_TOKENS: usize = 5;

    /// Embedding dimension of each token.
    pub const D_MODEL: usize = 8;

    /// Projection dimension of Q, K and V.
    pub const D_K: usize = 4;

    /// Divisor applied to raw attention scores (√d_k).
    pub const SCALING_FACTOR: f64 = 2.0;

    /// Maximum absolute per-cell deviation accepted by the validator.
    pub const TOLERANCE: f64 = 1e-4;

    /// Returns the `(rows, cols)` shape of a projection result (Q, K, V, Output).
    pub fn projection_shape() -> (usize, usize) {
        (N_TOKENS, D_K)
    }

    /// Returns the `(rows, cols)` shape of the token-by-token score grid.
    pub fn score_shape() -> (usize, usize) {
        (N_TOKENS, N_TOKENS)
    }
}
