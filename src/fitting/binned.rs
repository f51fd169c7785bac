//! Weighted least-squares formulation of a binned peak fit.

use ndarray::Array1;

use crate::error::{PulseFitError, Result};
use crate::models::PeakModel;
use crate::parameters::ParameterSet;
use crate::phaseogram::Histogram;
use crate::problem::Problem;

/// Histogram heights against a peak model evaluated at bin centers.
///
/// Residuals are `(y - f(x)) / σ` with `σ = sqrt(max(y, 1))`, so empty bins
/// still carry unit weight. Only free parameters are exposed to the
/// optimizer.
#[derive(Debug, Clone)]
pub struct BinnedProblem {
    model: PeakModel,
    centers: Array1<f64>,
    heights: Array1<f64>,
    sigmas: Array1<f64>,
    params: ParameterSet,
}

impl BinnedProblem {
    /// Bins are moved onto the window `[phase_shift, phase_shift + 1)`:
    /// left edges below the shift gain one rotation, and the bins are
    /// re-sorted so that the fitted curve is continuous across phase 0.
    pub fn new(
        model: PeakModel,
        histogram: &Histogram,
        phase_shift: f64,
        params: ParameterSet,
    ) -> Result<Self> {
        let edges = histogram.edges();
        let span = edges[edges.len() - 1] - edges[0];
        if (span - 1.0).abs() > 1e-9 {
            return Err(PulseFitError::InvalidHistogram(format!(
                "binned fits need exactly one rotation, edges span {}",
                span
            )));
        }
        if params.names() != model.parameter_names() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "parameters {:?} do not match model '{}'",
                params.names(),
                model
            )));
        }

        let mut bins: Vec<(f64, f64)> = histogram
            .left_edges()
            .iter()
            .zip(histogram.counts())
            .map(|(&left, &count)| {
                let left = if phase_shift != 0.0 && left < phase_shift {
                    left + 1.0
                } else {
                    left
                };
                (left, count)
            })
            .collect();
        bins.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut lefts: Vec<f64> = bins.iter().map(|b| b.0).collect();
        lefts.push(lefts[0] + 1.0);
        let centers: Array1<f64> = lefts.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
        let heights: Array1<f64> = bins.iter().map(|b| b.1).collect();
        let sigmas = heights.mapv(|y| y.max(1.0).sqrt());

        Ok(Self {
            model,
            centers,
            heights,
            sigmas,
            params,
        })
    }

    pub fn centers(&self) -> &Array1<f64> {
        &self.centers
    }

    pub fn heights(&self) -> &Array1<f64> {
        &self.heights
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Degrees of freedom: bins minus free parameters.
    pub fn dof(&self) -> usize {
        self.heights.len().saturating_sub(self.params.free_count())
    }
}

impl Problem for BinnedProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let full = self.params.expand(&params.to_vec())?;
        let residuals = ndarray::Zip::from(&self.centers)
            .and(&self.heights)
            .and(&self.sigmas)
            .map_collect(|&x, &y, &s| (y - self.model.eval_unchecked(x, &full)) / s);
        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(PulseFitError::FunctionEvaluation(format!(
                "model '{}' is not finite at {:?}",
                self.model, full
            )));
        }
        Ok(residuals)
    }

    fn parameter_count(&self) -> usize {
        self.params.free_count()
    }

    fn residual_count(&self) -> usize {
        self.heights.len()
    }
}
