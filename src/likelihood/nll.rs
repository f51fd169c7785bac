//! Unbinned negative log-likelihood of event phases under a peak model.

use rayon::prelude::*;

use crate::error::{PulseFitError, Result};
use crate::models::PeakModel;
use crate::parameters::ParameterSet;

/// Events per parallel work unit. Partial sums are added in chunk order so
/// the total does not depend on thread scheduling.
const CHUNK: usize = 4096;

/// Extended-free unbinned NLL over a phase window:
///
/// ```text
/// NLL(θ) = −Σᵢ ln f(xᵢ; θ) + N · ln ∫_window f(x; θ) dx
/// ```
///
/// The model is normalized over the window, so only the shape of `f`
/// matters. Points where the density or its integral is not positive return
/// `+∞`.
#[derive(Debug, Clone)]
pub struct UnbinnedNll {
    model: PeakModel,
    phases: Vec<f64>,
    window: (f64, f64),
    params: ParameterSet,
}

impl UnbinnedNll {
    /// `params` must follow the model's canonical parameter order.
    pub fn new(
        model: PeakModel,
        phases: Vec<f64>,
        window: (f64, f64),
        params: ParameterSet,
    ) -> Result<Self> {
        if phases.is_empty() {
            return Err(PulseFitError::InvalidConfig(
                "unbinned fit needs at least one event".to_string(),
            ));
        }
        if !(window.0 < window.1) {
            return Err(PulseFitError::InvalidConfig(format!(
                "empty likelihood window [{}, {})",
                window.0, window.1
            )));
        }
        let names = params.names();
        if names != model.parameter_names() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "parameters {:?} do not match model '{}'",
                names, model
            )));
        }
        Ok(Self {
            model,
            phases,
            window,
            params,
        })
    }

    pub fn n_events(&self) -> usize {
        self.phases.len()
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn window(&self) -> (f64, f64) {
        self.window
    }

    /// NLL at a full, canonical-order parameter vector.
    pub fn eval_full(&self, full: &[f64]) -> f64 {
        let norm = self
            .model
            .integral_unchecked(self.window.0, self.window.1, full);
        if !(norm.is_finite() && norm > 0.0) {
            return f64::INFINITY;
        }

        let partial: Vec<f64> = self
            .phases
            .par_chunks(CHUNK)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|&x| self.model.eval_unchecked(x, full).ln())
                    .sum::<f64>()
            })
            .collect();
        let log_sum: f64 = partial.iter().sum();
        if !log_sum.is_finite() {
            return f64::INFINITY;
        }

        -log_sum + self.phases.len() as f64 * norm.ln()
    }

    /// NLL at a free-parameter vector; fixed parameters are reinserted.
    pub fn eval_free(&self, free: &[f64]) -> Result<f64> {
        let full = self.params.expand(free)?;
        Ok(self.eval_full(&full))
    }
}
