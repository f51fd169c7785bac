//! Peak-shape intensity functions for pulse profiles.
//!
//! Each function is a flat background plus one or more normalized peak
//! components, so an amplitude parameter is the area (in counts) of its
//! peak. None of the composites is renormalized by the sum of its
//! amplitudes; the unbinned likelihood normalizes over its fit window
//! instead.
//!
//! All functions are pure and scalar; [`vectorize`] maps any of them over
//! an array of phases.

use ndarray::Array1;

use super::shapes::{asymmetric_gaussian_pdf, lorentz_pdf, normal_pdf};

/// Single Gaussian peak on a flat background:
/// `A + B·N(x; mu, sigma)`.
#[inline]
pub fn gaussian(x: f64, mu: f64, sigma: f64, a: f64, b: f64) -> f64 {
    a + b * normal_pdf(x, mu, sigma)
}

/// Two Gaussian peaks on a flat background:
/// `A + B·N(x; mu, sigma) + C·N(x; mu_2, sigma_2)`.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn double_gaussian(
    x: f64,
    mu: f64,
    sigma: f64,
    mu_2: f64,
    sigma_2: f64,
    a: f64,
    b: f64,
    c: f64,
) -> f64 {
    a + b * normal_pdf(x, mu, sigma) + c * normal_pdf(x, mu_2, sigma_2)
}

/// Three Gaussian peaks on a flat background `bkg`, with areas `A`, `B`, `C`.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn triple_gaussian(
    x: f64,
    bkg: f64,
    mu: f64,
    sigma: f64,
    mu_2: f64,
    sigma_2: f64,
    mu_3: f64,
    sigma_3: f64,
    a: f64,
    b: f64,
    c: f64,
) -> f64 {
    bkg + a * normal_pdf(x, mu, sigma)
        + b * normal_pdf(x, mu_2, sigma_2)
        + c * normal_pdf(x, mu_3, sigma_3)
}

/// Two asymmetric Gaussian peaks on a flat background:
/// `A + B·asym(x; mu, sigma1, sigma2) + C·asym(x; mu_2, sigma1_2, sigma2_2)`.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn asymmetric_double_gaussian(
    x: f64,
    mu: f64,
    sigma1: f64,
    sigma2: f64,
    mu_2: f64,
    sigma1_2: f64,
    sigma2_2: f64,
    a: f64,
    b: f64,
    c: f64,
) -> f64 {
    a + b * asymmetric_gaussian_pdf(x, mu, sigma1, sigma2)
        + c * asymmetric_gaussian_pdf(x, mu_2, sigma1_2, sigma2_2)
}

/// Single Lorentzian peak on a flat background: `A + B·L(x; mu, gamma)`.
#[inline]
pub fn lorentzian(x: f64, mu: f64, gamma: f64, a: f64, b: f64) -> f64 {
    a + b * lorentz_pdf(x, mu, gamma)
}

/// Two Lorentzian peaks on a flat background.
#[allow(clippy::too_many_arguments)]
#[inline]
pub fn double_lorentz(
    x: f64,
    mu_1: f64,
    gamma_1: f64,
    mu_2: f64,
    gamma_2: f64,
    a: f64,
    b: f64,
    c: f64,
) -> f64 {
    a + b * lorentz_pdf(x, mu_1, gamma_1) + c * lorentz_pdf(x, mu_2, gamma_2)
}

/// Apply a scalar intensity function element-wise over `x`.
///
/// ```
/// use ndarray::array;
/// use pulsefit_rs::models::{gaussian, vectorize};
///
/// let y = vectorize(&array![0.4, 0.5, 0.6], |x| gaussian(x, 0.5, 0.05, 1.0, 10.0));
/// assert_eq!(y.len(), 3);
/// assert!(y[1] > y[0]);
/// ```
pub fn vectorize<F>(x: &Array1<f64>, f: F) -> Array1<f64>
where
    F: Fn(f64) -> f64,
{
    x.mapv(f)
}
