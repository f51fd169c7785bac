//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! with Marquardt's diagonal scaling, so that parameters of very different
//! magnitude (phase locations, widths, amplitudes in counts) are damped
//! proportionally.

use ndarray::{Array1, Array2};
use std::fmt;
use tracing::{debug, trace};

use crate::error::{PulseFitError, Result};
use crate::problem::Problem;
use crate::utils::linalg::solve_symmetric;

use super::config::LmConfig;
use super::convergence::ConvergenceStatus;

/// Smallest diagonal entry used for Marquardt scaling.
const MIN_SCALE: f64 = 1e-12;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization converged
    pub success: bool,

    /// Why the optimization stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Largest parameter move of a step, relative to `max(|x|, 1)`.
fn relative_step(from: &Array1<f64>, to: &Array1<f64>) -> f64 {
    from.iter()
        .zip(to.iter())
        .map(|(a, b)| (b - a).abs() / a.abs().max(1.0))
        .fold(0.0, f64::max)
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for change in the cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    fn finish(
        &self,
        params: Array1<f64>,
        residuals: Array1<f64>,
        iterations: usize,
        func_evals: usize,
        status: ConvergenceStatus,
    ) -> LmResult {
        let cost = sum_of_squares(&residuals);
        let message = match status {
            ConvergenceStatus::MaxIterationsReached => format!(
                "Maximum iterations ({}) reached",
                self.config.max_iterations
            ),
            other => other.to_string(),
        };
        debug!(iterations, func_evals, cost, ?status, "levenberg-marquardt finished");
        LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success: status.is_converged(),
            status,
            message,
        }
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Failing to converge is not an error: the returned [`LmResult`] has
    /// `success == false` and a `status` saying why. Errors are reserved for
    /// dimension mismatches and residual evaluation failures at the starting
    /// point.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(PulseFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        if !cost.is_finite() {
            return Err(PulseFitError::FunctionEvaluation(
                "non-finite residuals at the starting point".to_string(),
            ));
        }
        let mut func_evals = 1;
        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        loop {
            if iterations >= self.config.max_iterations {
                return Ok(self.finish(
                    params,
                    residuals,
                    iterations,
                    func_evals,
                    ConvergenceStatus::MaxIterationsReached,
                ));
            }

            let jac = problem.jacobian(&params)?;
            func_evals += n_params;
            let jtj = jac.t().dot(&jac);
            let g = jac.t().dot(&residuals);

            let gradient_norm = g.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            if gradient_norm < self.config.gtol {
                return Ok(self.finish(
                    params,
                    residuals,
                    iterations,
                    func_evals,
                    ConvergenceStatus::GradientConvergence,
                ));
            }

            // Raise the damping until a step lowers the cost.
            loop {
                let new_params = match self.damped_step(&jtj, &g, lambda) {
                    Ok(step) => &params + &step,
                    Err(_) => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            return Ok(self.finish(
                                params,
                                residuals,
                                iterations,
                                func_evals,
                                ConvergenceStatus::NumericalError,
                            ));
                        }
                        continue;
                    }
                };

                let trial = problem.eval(&new_params);
                func_evals += 1;
                let new_cost = match &trial {
                    Ok(r) => sum_of_squares(r),
                    Err(_) => f64::INFINITY,
                };

                if new_cost.is_finite() && new_cost < cost {
                    iterations += 1;
                    let status = if relative_step(&params, &new_params) < self.config.xtol {
                        Some(ConvergenceStatus::ParameterConvergence)
                    } else if cost - new_cost < self.config.ftol * cost.max(1e-10) {
                        Some(ConvergenceStatus::FunctionValueConvergence)
                    } else {
                        None
                    };
                    trace!(iterations, cost = new_cost, lambda, "step accepted");

                    params = new_params;
                    residuals = trial?;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

                    if let Some(status) = status {
                        return Ok(self.finish(params, residuals, iterations, func_evals, status));
                    }
                    break;
                }

                // A rejected step that moves the cost only at rounding level
                // means we are sitting on the minimum.
                if new_cost.is_finite() && (new_cost - cost).abs() <= self.config.ftol * cost.max(1e-10) {
                    return Ok(self.finish(
                        params,
                        residuals,
                        iterations,
                        func_evals,
                        ConvergenceStatus::FunctionValueConvergence,
                    ));
                }

                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    return Ok(self.finish(
                        params,
                        residuals,
                        iterations,
                        func_evals,
                        ConvergenceStatus::DampingLimitReached,
                    ));
                }
            }
        }
    }

    /// Solve `(JᵀJ + λ·D) δ = -g` with `D = diag(JᵀJ)`.
    fn damped_step(&self, jtj: &Array2<f64>, g: &Array1<f64>, lambda: f64) -> Result<Array1<f64>> {
        let mut a = jtj.clone();
        for i in 0..a.nrows() {
            a[[i, i]] += lambda * jtj[[i, i]].max(MIN_SCALE);
        }
        solve_symmetric(&a, &g.mapv(|v| -v))
    }
}
