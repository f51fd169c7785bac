//! Normalized peak shapes and their cumulative integrals.
//!
//! Every density here integrates to one over the real line (for positive
//! widths). The matching `*_cdf` functions are exact antiderivatives, which
//! is what the unbinned likelihood uses to normalize over the fit window.

use statrs::function::erf::erf;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// `1 / sqrt(2π)`
const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Normal density with mean `mu` and standard deviation `sigma`.
#[inline]
pub fn normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    INV_SQRT_2PI / sigma * (-0.5 * z * z).exp()
}

/// Antiderivative of [`normal_pdf`].
///
/// Written as `Φ((x - mu) / sigma)` so that its derivative reproduces the
/// density for either sign of `sigma`.
#[inline]
pub fn normal_cdf(x: f64, mu: f64, sigma: f64) -> f64 {
    0.5 * (1.0 + erf((x - mu) / sigma * FRAC_1_SQRT_2))
}

/// Two-sided normal density: `sigma1` left of the mode, `sigma2` right of it.
///
/// The normalization divides by `|sigma1| + |sigma2|`, which keeps the value
/// defined for negative widths.
#[inline]
pub fn asymmetric_gaussian_pdf(x: f64, mu: f64, sigma1: f64, sigma2: f64) -> f64 {
    let norm = 2.0 * INV_SQRT_2PI / (sigma1.abs() + sigma2.abs());
    let sigma = if x <= mu { sigma1 } else { sigma2 };
    norm * (-(x - mu).powi(2) / 2.0 / sigma.powi(2)).exp()
}

/// Antiderivative of [`asymmetric_gaussian_pdf`], zero at `-∞`.
#[inline]
pub fn asymmetric_gaussian_cdf(x: f64, mu: f64, sigma1: f64, sigma2: f64) -> f64 {
    let s1 = sigma1.abs();
    let s2 = sigma2.abs();
    let total = s1 + s2;
    if x <= mu {
        2.0 * s1 / total * normal_cdf(x, mu, s1)
    } else {
        s1 / total + 2.0 * s2 / total * (normal_cdf(x, mu, s2) - 0.5)
    }
}

/// Cauchy density with location `mu` and half width `gamma`.
#[inline]
pub fn lorentz_pdf(x: f64, mu: f64, gamma: f64) -> f64 {
    1.0 / PI * gamma.powi(2) / ((x - mu).powi(2) + gamma.powi(2)) / gamma
}

/// Antiderivative of [`lorentz_pdf`] (up to a constant).
#[inline]
pub fn lorentz_cdf(x: f64, mu: f64, gamma: f64) -> f64 {
    ((x - mu) / gamma).atan() / PI
}
