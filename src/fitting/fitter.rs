//! The peak fitter and its estimate-then-fit lifecycle.

use ndarray::Array2;
use tracing::{info, warn};

use crate::error::{ErrorCategory, PulseFitError, Result};
use crate::fitting::binned::BinnedProblem;
use crate::fitting::initial::{into_window, InitialValues};
use crate::fitting::result::{FitResult, FitStatus, ParameterEstimate};
use crate::fitting::{FitMode, PeakSelection};
use crate::likelihood::{NewtonConfig, NewtonMinimizer, UnbinnedNll};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::models::PeakModel;
use crate::parameters::ParameterSet;
use crate::phaseogram::{Histogram, PhaseRegions, PhaseogramData};
use crate::problem::Problem;
use crate::uncertainty::{covariance_from_hessian, covariance_from_jacobian, UncertaintyResult};

#[derive(Debug, Clone)]
enum Stage {
    Constructed,
    Estimated(InitialValues),
    Fitted(InitialValues, Box<FitResult>),
}

/// Fits one registry model to a phaseogram.
///
/// Initial values must be estimated before either fit method runs. Fitting
/// again, or re-estimating, replaces the previous result.
#[derive(Debug, Clone)]
pub struct PeakFitter {
    model: PeakModel,
    peak: PeakSelection,
    mode: FitMode,
    least_squares: LmConfig,
    likelihood: NewtonConfig,
    stage: Stage,
}

/// Single-peak models take one named peak, multi-peak models take "both".
pub(crate) fn check_model(model: PeakModel, peak: PeakSelection) -> Result<()> {
    let compatible = match model.n_peaks() {
        1 => peak != PeakSelection::Both,
        _ => peak == PeakSelection::Both,
    };
    if !compatible {
        return Err(PulseFitError::IncompatiblePeak {
            model: model.to_string(),
            peak: peak.to_string(),
        });
    }
    Ok(())
}

impl PeakFitter {
    /// Create a fitter for a registry model name.
    pub fn new(model: &str, peak: PeakSelection, mode: FitMode) -> Result<Self> {
        let model: PeakModel = model.parse()?;
        Self::for_model(model, peak, mode)
    }

    pub fn for_model(model: PeakModel, peak: PeakSelection, mode: FitMode) -> Result<Self> {
        check_model(model, peak)?;
        Ok(Self {
            model,
            peak,
            mode,
            least_squares: LmConfig::default(),
            likelihood: NewtonConfig::default(),
            stage: Stage::Constructed,
        })
    }

    /// Settings for binned fits.
    pub fn with_least_squares(mut self, config: LmConfig) -> Self {
        self.least_squares = config;
        self
    }

    /// Settings for unbinned fits.
    pub fn with_likelihood(mut self, config: NewtonConfig) -> Self {
        self.likelihood = config;
        self
    }

    pub fn model(&self) -> PeakModel {
        self.model
    }

    pub fn peak(&self) -> PeakSelection {
        self.peak
    }

    pub fn mode(&self) -> FitMode {
        self.mode
    }

    /// Re-validate the model against the peak selection.
    pub fn check_model(&self) -> Result<()> {
        check_model(self.model, self.peak)
    }

    pub fn initial_values(&self) -> Option<&InitialValues> {
        match &self.stage {
            Stage::Constructed => None,
            Stage::Estimated(init) | Stage::Fitted(init, _) => Some(init),
        }
    }

    pub fn result(&self) -> Option<&FitResult> {
        match &self.stage {
            Stage::Fitted(_, result) => Some(result),
            _ => None,
        }
    }

    /// Derive starting values from region statistics and the histogram.
    ///
    /// Any previous fit result is discarded.
    pub fn estimate_initial_values(
        &mut self,
        regions: &PhaseRegions,
        histogram: &Histogram,
    ) -> Result<&InitialValues> {
        self.check_model()?;
        let init = InitialValues::estimate(self.model, self.peak, self.mode, regions, histogram)?;
        self.stage = Stage::Estimated(init);
        self.initial_values().ok_or(PulseFitError::NotEstimated)
    }

    fn take_initial(&self) -> Result<InitialValues> {
        self.initial_values().cloned().ok_or(PulseFitError::NotEstimated)
    }

    fn store(&mut self, init: InitialValues, result: FitResult) -> Result<&FitResult> {
        if result.is_converged() {
            info!(model = %self.model, mode = %self.mode, cost = result.cost, "peak fit converged");
        } else {
            warn!(model = %self.model, mode = %self.mode, status = %result.status, "peak fit did not converge");
        }
        self.stage = Stage::Fitted(init, Box::new(result));
        self.result().ok_or(PulseFitError::NotEstimated)
    }

    /// Weighted least-squares fit of the histogram heights.
    pub fn fit_binned(&mut self, histogram: &Histogram) -> Result<&FitResult> {
        let init = self.take_initial()?;
        let problem = BinnedProblem::new(
            self.model,
            histogram,
            init.phase_shift,
            init.parameters.clone(),
        )?;
        let x0 = init.parameters.free_values();

        let lm = LevenbergMarquardt::with_config(self.least_squares.clone());
        let outcome = match lm.minimize(&problem, x0) {
            Ok(outcome) => outcome,
            Err(e) if e.category() == ErrorCategory::Numerical => {
                let result = self.failed(&init, FitMode::Binned, e.to_string());
                return self.store(init, result);
            }
            Err(e) => return Err(e),
        };

        let mut status = if outcome.success {
            FitStatus::Converged
        } else {
            FitStatus::Failed {
                reason: outcome.message.clone(),
            }
        };

        let redchi = outcome.cost / problem.dof().max(1) as f64;
        let covariance = problem
            .jacobian(&outcome.params)
            .and_then(|jac| covariance_from_jacobian(&jac, redchi));
        let covariance = match covariance {
            Ok(c) => Some(c),
            Err(e) => {
                if status.is_converged() {
                    status = FitStatus::Failed {
                        reason: format!("no covariance at the minimum: {}", e),
                    };
                }
                None
            }
        };

        let result = self.assemble(
            &init,
            FitMode::Binned,
            outcome.params.as_slice().unwrap_or(&[]),
            covariance,
            status,
            outcome.cost,
            outcome.iterations,
        )?;
        self.store(init, result)
    }

    /// Unbinned maximum-likelihood fit of event phases.
    pub fn fit_unbinned(&mut self, phases: &[f64]) -> Result<&FitResult> {
        let init = self.take_initial()?;
        let shift = init.phase_shift;
        let shifted: Vec<f64> = phases.iter().map(|p| into_window(*p, shift)).collect();
        let nll = UnbinnedNll::new(
            self.model,
            shifted,
            (shift, shift + 1.0),
            init.parameters.clone(),
        )?;
        let x0 = init.parameters.free_values();

        let minimizer = NewtonMinimizer::with_config(self.likelihood.clone());
        let objective = |x: &ndarray::Array1<f64>| {
            nll.eval_free(&x.to_vec()).unwrap_or(f64::INFINITY)
        };
        let outcome = match minimizer.minimize(objective, x0) {
            Ok(outcome) => outcome,
            Err(e) if e.category() == ErrorCategory::Numerical => {
                let result = self.failed(&init, FitMode::Unbinned, e.to_string());
                return self.store(init, result);
            }
            Err(e) => return Err(e),
        };

        let mut status = if outcome.converged {
            FitStatus::Converged
        } else {
            FitStatus::Failed {
                reason: outcome.message.clone(),
            }
        };
        let covariance = match covariance_from_hessian(&outcome.hessian) {
            Ok(c) => Some(c),
            Err(e) => {
                if status.is_converged() {
                    status = FitStatus::Failed {
                        reason: format!("no covariance at the minimum: {}", e),
                    };
                }
                None
            }
        };

        let result = self.assemble(
            &init,
            FitMode::Unbinned,
            outcome.params.as_slice().unwrap_or(&[]),
            covariance,
            status,
            outcome.fval,
            outcome.iterations,
        )?;
        self.store(init, result)
    }

    /// Fit in the configured mode.
    pub fn fit(&mut self, data: &PhaseogramData) -> Result<&FitResult> {
        match self.mode {
            FitMode::Binned => self.fit_binned(&data.histogram),
            FitMode::Unbinned => self.fit_unbinned(&data.phases),
        }
    }

    /// Estimate initial values, then fit in the configured mode.
    pub fn run(&mut self, data: &PhaseogramData) -> Result<&FitResult> {
        self.estimate_initial_values(&data.regions, &data.histogram)?;
        self.fit(data)
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        init: &InitialValues,
        mode: FitMode,
        free: &[f64],
        covariance: Option<Array2<f64>>,
        status: FitStatus,
        cost: f64,
        iterations: usize,
    ) -> Result<FitResult> {
        let params: &ParameterSet = &init.parameters;
        let values = params.expand(free)?;

        // Report non-negative widths. The covariance follows the same flips.
        let signs = self.model.canonical_signs(&values);
        let values: Vec<f64> = values.iter().zip(&signs).map(|(v, s)| v * s).collect();
        let free_signs: Vec<f64> = params
            .iter()
            .zip(&signs)
            .filter(|(p, _)| p.state().is_free())
            .map(|(_, s)| *s)
            .collect();
        let covariance = covariance.map(|mut c| {
            for ((i, j), v) in c.indexed_iter_mut() {
                *v *= free_signs[i] * free_signs[j];
            }
            c
        });
        let uncertainty = covariance.map(UncertaintyResult::from_covariance);
        let errors = match &uncertainty {
            Some(u) => params.spread_free(&u.standard_errors, 0.0)?,
            None => params.spread_free(&vec![f64::NAN; free.len()], 0.0)?,
        };
        let parameters = params
            .iter()
            .zip(values)
            .zip(errors)
            .map(|((p, value), error)| ParameterEstimate {
                name: p.name.clone(),
                value,
                error,
                role: p.role,
                fixed: !p.state().is_free(),
            })
            .collect();

        Ok(FitResult {
            model: self.model,
            mode,
            peak: self.peak,
            parameters,
            status,
            phase_shift: init.phase_shift,
            cost,
            iterations,
            covariance: uncertainty.as_ref().map(|u| rows(&u.covariance)),
            correlation: uncertainty.as_ref().map(|u| rows(&u.correlation)),
        })
    }

    /// Result for a fit that could not even start: initial values, no errors.
    fn failed(&self, init: &InitialValues, mode: FitMode, reason: String) -> FitResult {
        let parameters = init
            .parameters
            .iter()
            .map(|p| ParameterEstimate {
                name: p.name.clone(),
                value: p.value(),
                error: if p.state().is_free() { f64::NAN } else { 0.0 },
                role: p.role,
                fixed: !p.state().is_free(),
            })
            .collect();
        FitResult {
            model: self.model,
            mode,
            peak: self.peak,
            parameters,
            status: FitStatus::Failed { reason },
            phase_shift: init.phase_shift,
            cost: f64::NAN,
            iterations: 0,
            covariance: None,
            correlation: None,
        }
    }
}

fn rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}
