//! Finite difference methods for numerical differentiation.
//!
//! Steps are relative to the parameter scale: `h_j = rel · max(|x_j|, floor)`.
//! Phase locations, widths of a few hundredths and amplitudes of thousands
//! of counts all appear in one parameter vector, so an absolute step would
//! be wrong for most of them.

use ndarray::{Array1, Array2};

use crate::error::{PulseFitError, Result};
use crate::problem::Problem;

/// Relative step for forward-difference Jacobians.
const JACOBIAN_STEP: f64 = 1e-7;

/// Relative step for central-difference gradients.
pub const GRADIENT_STEP: f64 = 1e-5;

/// Relative step for central-difference Hessians.
pub const HESSIAN_STEP: f64 = 1e-4;

/// Smallest scale a step is taken relative to.
const SCALE_FLOOR: f64 = 1e-3;

fn step(x: f64, rel: f64) -> f64 {
    rel * x.abs().max(SCALE_FLOOR)
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// J[i,j] = ∂residual[i]/∂param[j].
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let rel = epsilon.unwrap_or(JACOBIAN_STEP);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(PulseFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));
    let mut perturbed = params.clone();
    for j in 0..n_params {
        let h = step(params[j], rel);
        perturbed[j] = params[j] + h;
        let shifted = problem.eval(&perturbed)?;
        perturbed[j] = params[j];

        let mut column = jac.column_mut(j);
        for i in 0..n_residuals {
            column[i] = (shifted[i] - residuals[i]) / h;
        }
    }

    Ok(jac)
}

/// Compute the gradient of a scalar function using central finite differences.
pub fn gradient<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let rel = epsilon.unwrap_or(GRADIENT_STEP);
    let mut grad = Array1::zeros(params.len());
    let mut x = params.clone();

    for j in 0..params.len() {
        let h = step(params[j], rel);
        x[j] = params[j] + h;
        let f_forward = f(&x)?;
        x[j] = params[j] - h;
        let f_backward = f(&x)?;
        x[j] = params[j];

        grad[j] = (f_forward - f_backward) / (2.0 * h);
    }

    Ok(grad)
}

/// Compute the Hessian matrix using central finite differences.
///
/// The result is symmetric by construction. `f0` is `f(params)`, which the
/// caller usually already has.
pub fn hessian<F>(f: F, params: &Array1<f64>, f0: f64, epsilon: Option<f64>) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let rel = epsilon.unwrap_or(HESSIAN_STEP);
    let n = params.len();
    let h: Vec<f64> = params.iter().map(|&x| step(x, rel)).collect();
    let mut hess = Array2::zeros((n, n));
    let mut x = params.clone();

    for i in 0..n {
        x[i] = params[i] + h[i];
        let f_p = f(&x)?;
        x[i] = params[i] - h[i];
        let f_m = f(&x)?;
        x[i] = params[i];
        hess[[i, i]] = (f_p - 2.0 * f0 + f_m) / (h[i] * h[i]);

        for j in 0..i {
            let mut corner = |si: f64, sj: f64| -> Result<f64> {
                x[i] = params[i] + si * h[i];
                x[j] = params[j] + sj * h[j];
                let value = f(&x);
                x[i] = params[i];
                x[j] = params[j];
                value
            };
            let f_pp = corner(1.0, 1.0)?;
            let f_pm = corner(1.0, -1.0)?;
            let f_mp = corner(-1.0, 1.0)?;
            let f_mm = corner(-1.0, -1.0)?;

            let value = (f_pp - f_pm - f_mp + f_mm) / (4.0 * h[i] * h[j]);
            hess[[i, j]] = value;
            hess[[j, i]] = value;
        }
    }

    Ok(hess)
}
