//! Synthetic phaseograms drawn from a peak model.
//!
//! Used to exercise the fitters on data whose true parameters are known.

use rand::Rng;
use rand_distr::{Distribution, Poisson};

use crate::error::{PulseFitError, Result};
use crate::models::PeakModel;
use crate::phaseogram::Histogram;

/// Grid used to bound the density for accept-reject sampling.
const ENVELOPE_POINTS: usize = 4096;

fn unit_edges(n_bins: usize) -> Result<Vec<f64>> {
    if n_bins == 0 {
        return Err(PulseFitError::InvalidHistogram("no bins".to_string()));
    }
    Ok((0..=n_bins).map(|i| i as f64 / n_bins as f64).collect())
}

/// Model intensity at every bin center over [0, 1), without fluctuations.
pub fn expected_histogram(model: PeakModel, params: &[f64], n_bins: usize) -> Result<Histogram> {
    let edges = unit_edges(n_bins)?;
    let counts = edges
        .windows(2)
        .map(|w| model.eval(0.5 * (w[0] + w[1]), params))
        .collect::<Result<Vec<_>>>()?;
    Histogram::new(counts, edges)
}

/// Poisson-fluctuated bin counts with the model intensity at each bin
/// center as the mean.
pub fn poisson_histogram<R: Rng + ?Sized>(
    model: PeakModel,
    params: &[f64],
    n_bins: usize,
    rng: &mut R,
) -> Result<Histogram> {
    let expected = expected_histogram(model, params, n_bins)?;
    let counts = expected
        .counts()
        .iter()
        .map(|&mean| {
            if mean <= 0.0 {
                return 0.0;
            }
            match Poisson::new(mean) {
                Ok(dist) => Distribution::<f64>::sample(&dist, rng),
                Err(_) => mean.round(),
            }
        })
        .collect();
    Histogram::new(counts, expected.edges().to_vec())
}

/// Draw `n` phases in [0, 1) with density proportional to the model.
///
/// The model must be non-negative on [0, 1).
pub fn sample_phases<R: Rng + ?Sized>(
    model: PeakModel,
    params: &[f64],
    n: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    let mut peak = 0.0_f64;
    for i in 0..ENVELOPE_POINTS {
        let x = (i as f64 + 0.5) / ENVELOPE_POINTS as f64;
        let y = model.eval(x, params)?;
        if !(y.is_finite() && y >= 0.0) {
            return Err(PulseFitError::InvalidConfig(format!(
                "model '{}' is negative or not finite at phase {}",
                model, x
            )));
        }
        peak = peak.max(y);
    }
    if peak <= 0.0 {
        return Err(PulseFitError::InvalidConfig(format!(
            "model '{}' vanishes on [0, 1)",
            model
        )));
    }

    let ceiling = 1.2 * peak;
    let mut phases = Vec::with_capacity(n);
    while phases.len() < n {
        let x: f64 = rng.gen();
        let u: f64 = rng.gen_range(0.0..ceiling);
        if u < model.eval_unchecked(x, params) {
            phases.push(x);
        }
    }
    Ok(phases)
}
