//! Matrix algebra needed by the attention walkthrough.
//!
//! Only three real operations exist here: product, transpose and a
//! numerically stable row softmax. Everything operates on owned
//! `Array2<f64>` values so results can be handed straight to callers.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{Result, TutorError};

/// Dense 2-D matrix of `f64` cells.
pub type Matrix = Array2<f64>;

/// Standard matrix product `a × b`.
///
/// Fails with `DimensionMismatch` when `a.ncols() != b.nrows()`.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.ncols() != b.nrows() {
        return Err(TutorError::DimensionMismatch {
            op: "multiply",
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(a.dot(b))
}

/// Transpose: `out[j][i] == a[i][j]`, shape `(cols, rows)`.
pub fn transpose(a: &Matrix) -> Matrix {
    a.t().to_owned()
}

/// Divide every cell by `divisor`.
pub fn scale(a: &Matrix, divisor: f64) -> Matrix {
    a.mapv(|v| v / divisor)
}

/// Softmax applied independently to each row.
///
/// Rows are shifted by their maximum before exponentiation. A row whose
/// shifted exponentials do not sum to a positive finite value (every entry
/// `-inf`) becomes all zeros.
pub fn softmax_rows(a: &Matrix) -> Matrix {
    let mut out = Matrix::zeros(a.dim());
    for (i, row) in a.axis_iter(Axis(0)).enumerate() {
        out.row_mut(i).assign(&softmax_row(row));
    }
    out
}

fn softmax_row(row: ArrayView1<f64>) -> Array1<f64> {
    let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = row.mapv(|v| (v - max_val).exp());
    let sum = exp.sum();

    if sum > 0.0 && sum.is_finite() {
        exp / sum
    } else {
        Array1::zeros(row.len())
    }
}

/// Build a matrix from learner-supplied rows.
pub fn from_rows(rows: &[Vec<f64>]) -> Result<Matrix> {
    let n_cols = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(TutorError::EmptyMatrix),
    };

    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(TutorError::RaggedRows {
                row: i,
                expected: n_cols,
                actual: row.len(),
            });
        }
    }

    Ok(Matrix::from_shape_fn((rows.len(), n_cols), |(i, j)| rows[i][j]))
}

/// Fail with `ShapeMismatch` unless `m` has shape `expected`.
pub fn ensure_shape(m: &Matrix, expected: (usize, usize)) -> Result<()> {
    if m.dim() != expected {
        return Err(TutorError::ShapeMismatch {
            expected,
            actual: m.dim(),
        });
    }
    Ok(())
}

/// Copy a matrix out into nested rows.
pub fn to_rows(m: &Matrix) -> Vec<Vec<f64>> {
    m.axis_iter(Axis(0)).map(|row| row.to_vec()).collect()
}
