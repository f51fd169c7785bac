//! Dense linear algebra on ndarray types, backed by nalgebra.
//!
//! The optimizers keep their state in `ndarray` arrays; the small dense
//! solves and inversions they need (normal equations, damped Newton steps,
//! covariance matrices) go through nalgebra's Cholesky and LU
//! decompositions.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::error::{PulseFitError, Result};

/// Convert an ndarray matrix to a nalgebra `DMatrix`.
pub fn to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = arr.dim();
    DMatrix::from_fn(rows, cols, |i, j| arr[[i, j]])
}

/// Convert a nalgebra `DMatrix` to an ndarray matrix.
pub fn from_nalgebra(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

fn check_square(a: &Array2<f64>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(PulseFitError::DimensionMismatch(format!(
            "expected a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    Ok(())
}

/// Solve `a · x = b` for a symmetric matrix `a`.
///
/// Cholesky first; LU with partial pivoting when `a` is not positive
/// definite.
pub fn solve_symmetric(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    check_square(a)?;
    if a.nrows() != b.len() {
        return Err(PulseFitError::DimensionMismatch(format!(
            "matrix is {}x{} but right-hand side has {} entries",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }
    let m = to_nalgebra(a);
    let rhs = DVector::from_iterator(b.len(), b.iter().copied());

    let x = match m.clone().cholesky() {
        Some(chol) => chol.solve(&rhs),
        None => m.lu().solve(&rhs).ok_or(PulseFitError::SingularMatrix)?,
    };
    if x.iter().any(|v| !v.is_finite()) {
        return Err(PulseFitError::SingularMatrix);
    }
    Ok(x.iter().copied().collect())
}

/// Solve `a · x = b` by Cholesky decomposition, or `None` if `a` is not
/// positive definite.
pub fn solve_positive_definite(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    if a.nrows() != a.ncols() || a.nrows() != b.len() {
        return None;
    }
    let chol = to_nalgebra(a).cholesky()?;
    let x = chol.solve(&DVector::from_iterator(b.len(), b.iter().copied()));
    x.iter()
        .all(|v| v.is_finite())
        .then(|| x.iter().copied().collect())
}

/// Invert a symmetric matrix. Cholesky first, LU otherwise.
pub fn invert_symmetric(a: &Array2<f64>) -> Result<Array2<f64>> {
    check_square(a)?;
    let m = to_nalgebra(a);
    let inv = match m.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => m.try_inverse().ok_or(PulseFitError::SingularMatrix)?,
    };
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(PulseFitError::SingularMatrix);
    }
    Ok(from_nalgebra(&inv))
}
