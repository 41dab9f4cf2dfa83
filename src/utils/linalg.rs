//! Dense linear-algebra primitives for least-squares fitting.
//!
//! Matrices are row-major `Vec<Vec<f64>>`. These helpers know nothing about
//! forecasting; the regression and time-series models both build on them.

use crate::error::{ForecastError, Result};

/// Row-major dense matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Pivots with an absolute value below this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-10;

/// Transpose a matrix.
pub fn transpose(a: &[Vec<f64>]) -> Matrix {
    let rows = a.len();
    let cols = a.first().map(|r| r.len()).unwrap_or(0);
    let mut t = vec![vec![0.0; rows]; cols];
    for (i, row) in a.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            t[j][i] = v;
        }
    }
    t
}

/// Multiply two matrices.
pub fn mat_mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Matrix> {
    let inner = a.first().map(|r| r.len()).unwrap_or(0);
    if inner != b.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: inner,
            got: b.len(),
        });
    }
    let cols = b.first().map(|r| r.len()).unwrap_or(0);

    let mut out = vec![vec![0.0; cols]; a.len()];
    for (i, row) in a.iter().enumerate() {
        for (k, &aik) in row.iter().enumerate() {
            if aik == 0.0 {
                continue;
            }
            for j in 0..cols {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    Ok(out)
}

/// Multiply a matrix by a vector.
pub fn mat_vec(a: &[Vec<f64>], v: &[f64]) -> Result<Vec<f64>> {
    a.iter()
        .map(|row| {
            if row.len() != v.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: row.len(),
                    got: v.len(),
                });
            }
            Ok(dot(row, v))
        })
        .collect()
}

/// Dot product of two equally sized slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Solve `A x = b` by Gaussian elimination with partial (row) pivoting.
///
/// Returns [`ForecastError::SingularMatrix`] when a pivot column has no entry
/// larger than [`PIVOT_EPSILON`].
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if n == 0 {
        return Err(ForecastError::EmptyData);
    }
    if a.len() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: a.len(),
        });
    }

    // Augmented matrix [A | b]
    let mut m: Matrix = Vec::with_capacity(n);
    for (row, &rhs) in a.iter().zip(b.iter()) {
        if row.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: row.len(),
            });
        }
        let mut aug = row.clone();
        aug.push(rhs);
        m.push(aug);
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                m[i][col]
                    .abs()
                    .partial_cmp(&m[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        let pivot = m[pivot_row][col];
        if !pivot.is_finite() || pivot.abs() < PIVOT_EPSILON {
            return Err(ForecastError::SingularMatrix { pivot: col });
        }
        m.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = m[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = m[i][n];
        for j in (i + 1)..n {
            sum -= m[i][j] * x[j];
        }
        x[i] = sum / m[i][i];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ComputationError(
            "non-finite solution to linear system".to_string(),
        ));
    }
    Ok(x)
}

/// Least-squares solution of `(XᵀX + λI) β = Xᵀy`.
///
/// `lambda = 0.0` gives the plain normal equation.
pub fn solve_normal_equation(x: &[Vec<f64>], y: &[f64], lambda: f64) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if x.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }

    let xt = transpose(x);
    let mut xtx = mat_mul(&xt, x)?;
    if lambda != 0.0 {
        for (i, row) in xtx.iter_mut().enumerate() {
            row[i] += lambda;
        }
    }
    let xty = mat_vec(&xt, y)?;

    solve(&xtx, &xty)
}
