//! # Covariance Matrix Calculations
//!
//! Covariance estimates for both fitting modes: from the residual Jacobian of
//! a least-squares fit, and from the Hessian of a negative log-likelihood.

use ndarray::{Array1, Array2};

use crate::error::{PulseFitError, Result};
use crate::utils::linalg::invert_symmetric;

/// Covariance of a least-squares fit.
///
///   covar = redchi · inv(Jᵀ·J)
///
/// where `redchi` is the reduced chi-square (χ² / dof). Scaling by `redchi`
/// matches what curve-fitting tools report when the data weights are taken
/// as relative rather than absolute.
pub fn covariance_from_jacobian(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let inv = invert_symmetric(&jtj)?;
    Ok(inv * redchi)
}

/// Covariance of a maximum-likelihood fit from the Hessian of the negative
/// log-likelihood (error definition 0.5): `covar = inv(H)`.
///
/// A Hessian that is not positive definite at the minimum gives no valid
/// covariance.
pub fn covariance_from_hessian(hessian: &Array2<f64>) -> Result<Array2<f64>> {
    let covar = invert_symmetric(hessian)?;
    if covar.diag().iter().any(|v| *v <= 0.0) {
        return Err(PulseFitError::ConvergenceFailure(
            "Hessian is not positive definite at the minimum".to_string(),
        ));
    }
    Ok(covar)
}

/// Calculate correlation matrix from covariance matrix.
///
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            return 1.0;
        }
        let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
        if denom > 0.0 {
            covar[[i, j]] / denom
        } else {
            0.0
        }
    })
}

/// Standard errors: square roots of the covariance diagonal.
///
/// Non-positive variances yield zero.
pub fn standard_errors(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;

    #[test]
    fn test_covariance_from_jacobian() {
        let jacobian = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let covar = covariance_from_jacobian(&jacobian, 2.0).unwrap();

        // JᵀJ = [[35, 44], [44, 56]], det = 24.
        assert_relative_eq!(covar[[0, 0]], 2.0 * 56.0 / 24.0, epsilon = 1e-10);
        assert_relative_eq!(covar[[0, 1]], -2.0 * 44.0 / 24.0, epsilon = 1e-10);
        assert_relative_eq!(covar[[1, 0]], covar[[0, 1]], epsilon = 1e-12);
        assert_relative_eq!(covar[[1, 1]], 2.0 * 35.0 / 24.0, epsilon = 1e-10);
    }

    #[test]
    fn test_covariance_from_hessian() {
        let hessian = arr2(&[[4.0, 0.0], [0.0, 0.25]]);
        let covar = covariance_from_hessian(&hessian).unwrap();
        let errors = standard_errors(&covar);
        assert_relative_eq!(errors[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(errors[1], 2.0, epsilon = 1e-12);

        let saddle = arr2(&[[1.0, 0.0], [0.0, -1.0]]);
        assert!(covariance_from_hessian(&saddle).is_err());
    }

    #[test]
    fn test_correlation() {
        let covar = arr2(&[[0.1, 0.05], [0.05, 0.2]]);
        let correl = correlation(&covar);

        assert_eq!(correl[[0, 0]], 1.0);
        assert_eq!(correl[[1, 1]], 1.0);
        let expected = 0.05 / (0.1f64 * 0.2f64).sqrt();
        assert_relative_eq!(correl[[0, 1]], expected, epsilon = 1e-10);
        assert_relative_eq!(correl[[1, 0]], expected, epsilon = 1e-10);
    }

    #[test]
    fn test_standard_errors() {
        let covar = arr2(&[[0.1, 0.05], [0.05, -0.2]]);
        let errors = standard_errors(&covar);
        assert_relative_eq!(errors[0], 0.1f64.sqrt(), epsilon = 1e-12);
        assert_eq!(errors[1], 0.0);
    }
}
