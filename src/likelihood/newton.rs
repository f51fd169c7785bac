//! Damped Newton minimization of scalar objectives.
//!
//! Used for negative log-likelihoods, where the Hessian at the minimum is
//! also what the parameter errors come from. Each iteration solves
//!
//! ```text
//! (H + λ·|diag(H)|) δ = -g
//! ```
//!
//! on finite-difference derivatives, accepting the step only if the
//! objective decreases, and stops once the estimated distance to the minimum
//! `EDM = ½·gᵀH⁻¹g` is below tolerance.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{PulseFitError, Result};
use crate::lm::ConvergenceStatus;
use crate::utils::finite_difference::{gradient, hessian};
use crate::utils::linalg::{solve_positive_definite, solve_symmetric};

/// Configuration of the damped Newton minimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Maximum number of accepted steps. Default: 100
    pub max_iterations: usize,

    /// Convergence threshold on the estimated distance to minimum. Default: 1e-6
    pub edm_tol: f64,

    /// Initial damping. Default: 1e-3
    pub initial_lambda: f64,

    /// Damping multiplier after a rejected step. Default: 10.0
    pub lambda_up_factor: f64,

    /// Damping multiplier after an accepted step. Default: 0.1
    pub lambda_down_factor: f64,

    /// Damping above which the minimizer gives up. Default: 1e12
    pub max_lambda: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            edm_tol: 1e-6,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            max_lambda: 1e12,
        }
    }
}

/// Outcome of a Newton minimization.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Parameters at the minimum
    pub params: Array1<f64>,

    /// Objective value at the minimum
    pub fval: f64,

    /// Hessian of the objective at `params`
    pub hessian: Array2<f64>,

    /// Estimated distance to minimum at `params`
    pub edm: f64,

    pub iterations: usize,

    pub converged: bool,

    pub status: ConvergenceStatus,

    pub message: String,
}

/// Damped Newton minimizer with Marquardt-style damping.
#[derive(Debug, Clone, Default)]
pub struct NewtonMinimizer {
    config: NewtonConfig,
}

struct Derivatives {
    gradient: Array1<f64>,
    hessian: Array2<f64>,
    /// `None` when the Hessian is not positive definite.
    edm: Option<f64>,
}

impl NewtonMinimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NewtonConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    fn derivatives<F>(&self, f: &F, x: &Array1<f64>, fx: f64) -> Result<Derivatives>
    where
        F: Fn(&Array1<f64>) -> f64,
    {
        let objective = |p: &Array1<f64>| -> Result<f64> { Ok(f(p)) };
        let g = gradient(objective, x, None)?;
        let h = hessian(objective, x, fx, None)?;
        if g.iter().chain(h.iter()).any(|v| !v.is_finite()) {
            return Err(PulseFitError::FunctionEvaluation(
                "objective is not finite around the current point".to_string(),
            ));
        }
        let edm = solve_positive_definite(&h, &g).map(|d| 0.5 * g.dot(&d));
        Ok(Derivatives {
            gradient: g,
            hessian: h,
            edm,
        })
    }

    fn damped_step(&self, d: &Derivatives, lambda: f64) -> Result<Array1<f64>> {
        let mut a = d.hessian.clone();
        for i in 0..a.nrows() {
            a[[i, i]] += lambda * d.hessian[[i, i]].abs().max(1e-12);
        }
        let step = solve_symmetric(&a, &d.gradient.mapv(|v| -v))?;
        Ok(step)
    }

    /// Minimize `f` starting from `x0`.
    ///
    /// `f` should return `+∞` where it is undefined; such points are never
    /// accepted. Failing to converge is reported in the result, not as an
    /// error. Errors mean the starting point itself cannot be evaluated.
    pub fn minimize<F>(&self, f: F, x0: Array1<f64>) -> Result<NewtonResult>
    where
        F: Fn(&Array1<f64>) -> f64,
    {
        let mut x = x0;
        let mut fx = f(&x);
        if !fx.is_finite() {
            return Err(PulseFitError::FunctionEvaluation(
                "objective is not finite at the starting point".to_string(),
            ));
        }

        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let status = loop {
            let d = match self.derivatives(&f, &x, fx) {
                Ok(d) => d,
                Err(_) => break ConvergenceStatus::NumericalError,
            };
            if let Some(edm) = d.edm {
                trace!(iterations, fval = fx, edm, lambda, "newton iteration");
                if edm < self.config.edm_tol {
                    break ConvergenceStatus::EdmConvergence;
                }
            }
            if iterations >= self.config.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }

            let accepted = loop {
                if lambda > self.config.max_lambda {
                    break false;
                }
                let Ok(step) = self.damped_step(&d, lambda) else {
                    lambda *= self.config.lambda_up_factor;
                    continue;
                };
                let trial = &x + &step;
                let ft = f(&trial);
                if ft.is_finite() && ft < fx {
                    x = trial;
                    fx = ft;
                    lambda = (lambda * self.config.lambda_down_factor).max(1e-12);
                    break true;
                }
                lambda *= self.config.lambda_up_factor;
            };
            if !accepted {
                break ConvergenceStatus::DampingLimitReached;
            }
            iterations += 1;
        };

        let (hess, edm) = match self.derivatives(&f, &x, fx) {
            Ok(d) => (d.hessian, d.edm.unwrap_or(f64::INFINITY)),
            Err(_) => {
                let n = x.len();
                (Array2::from_elem((n, n), f64::NAN), f64::INFINITY)
            }
        };
        // Stalling right at the minimum still counts if the EDM is small.
        let status = match status {
            ConvergenceStatus::DampingLimitReached if edm < self.config.edm_tol => {
                ConvergenceStatus::EdmConvergence
            }
            other => other,
        };
        debug!(iterations, fval = fx, edm, ?status, "newton minimization finished");

        Ok(NewtonResult {
            params: x,
            fval: fx,
            hessian: hess,
            edm,
            iterations,
            converged: status.is_converged(),
            message: status.to_string(),
            status,
        })
    }
}
