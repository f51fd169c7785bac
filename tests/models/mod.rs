//! Peak model shapes and registry.

use approx::assert_relative_eq;
use ndarray::Array1;
use pulsefit_rs::models::shapes::{asymmetric_gaussian_cdf, lorentz_cdf, normal_cdf};
use pulsefit_rs::models::{
    asymmetric_double_gaussian, asymmetric_gaussian_pdf, double_gaussian, double_lorentz,
    gaussian, get_model_list, lorentz_pdf, lorentzian, normal_pdf, triple_gaussian, vectorize,
    PeakModel,
};

/// Midpoint-rule integral over [lo, hi].
fn integrate<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64, n: usize) -> f64 {
    let h = (hi - lo) / n as f64;
    (0..n).map(|i| f(lo + (i as f64 + 0.5) * h)).sum::<f64>() * h
}

#[test]
fn test_registry_lists_six_models() {
    assert_eq!(
        get_model_list(),
        &["gaussian", "dgaussian", "tgaussian", "asym_dgaussian", "lorentzian", "double_lorentz"]
    );
    assert_eq!(PeakModel::ALL.len(), get_model_list().len());
}

#[test]
fn test_unit_area_components() {
    assert_relative_eq!(integrate(|x| normal_pdf(x, 0.5, 0.03), 0.0, 1.0, 20_000), 1.0, epsilon = 1e-9);
    assert_relative_eq!(
        integrate(|x| asymmetric_gaussian_pdf(x, 0.5, 0.02, 0.05), 0.0, 1.0, 20_000),
        1.0,
        epsilon = 1e-6
    );
    // A Cauchy peak keeps 1 - 2·atan(γ/L)/π of its area beyond ±L from the centre.
    let area = integrate(|x| lorentz_pdf(x, 0.5, 0.01), 0.0, 1.0, 200_000);
    let tails = 2.0 * (0.01f64 / 0.5).atan() / std::f64::consts::PI;
    assert_relative_eq!(area, 1.0 - tails, epsilon = 1e-6);
}

#[test]
fn test_cdfs_match_their_densities() {
    let (lo, hi) = (0.2, 0.8);
    assert_relative_eq!(
        normal_cdf(hi, 0.45, 0.04) - normal_cdf(lo, 0.45, 0.04),
        integrate(|x| normal_pdf(x, 0.45, 0.04), lo, hi, 50_000),
        epsilon = 1e-8
    );
    assert_relative_eq!(
        asymmetric_gaussian_cdf(hi, 0.45, 0.02, 0.06) - asymmetric_gaussian_cdf(lo, 0.45, 0.02, 0.06),
        integrate(|x| asymmetric_gaussian_pdf(x, 0.45, 0.02, 0.06), lo, hi, 50_000),
        epsilon = 1e-8
    );
    assert_relative_eq!(
        lorentz_cdf(hi, 0.45, 0.02) - lorentz_cdf(lo, 0.45, 0.02),
        integrate(|x| lorentz_pdf(x, 0.45, 0.02), lo, hi, 50_000),
        epsilon = 1e-7
    );
}

#[test]
fn test_asymmetric_peak_is_continuous_and_skewed() {
    let left = asymmetric_gaussian_pdf(0.5 - 1e-12, 0.5, 0.02, 0.06);
    let right = asymmetric_gaussian_pdf(0.5 + 1e-12, 0.5, 0.02, 0.06);
    assert_relative_eq!(left, right, epsilon = 1e-6);
    // The wider right side holds three quarters of the area.
    let right_area = integrate(|x| asymmetric_gaussian_pdf(x, 0.5, 0.02, 0.06), 0.5, 1.0, 20_000);
    assert_relative_eq!(right_area, 0.75, epsilon = 1e-6);
}

#[test]
fn test_composites_are_sums_of_components() {
    let x = 0.37;
    assert_relative_eq!(
        double_gaussian(x, 0.3, 0.02, 0.6, 0.04, 1.5, 10.0, 20.0),
        1.5 + 10.0 * normal_pdf(x, 0.3, 0.02) + 20.0 * normal_pdf(x, 0.6, 0.04),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        triple_gaussian(x, 2.0, 0.3, 0.02, 0.5, 0.03, 0.8, 0.05, 1.0, 2.0, 3.0),
        2.0 + normal_pdf(x, 0.3, 0.02) + 2.0 * normal_pdf(x, 0.5, 0.03) + 3.0 * normal_pdf(x, 0.8, 0.05),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        asymmetric_double_gaussian(x, 0.3, 0.02, 0.05, 0.6, 0.03, 0.01, 1.0, 4.0, 6.0),
        1.0 + 4.0 * asymmetric_gaussian_pdf(x, 0.3, 0.02, 0.05)
            + 6.0 * asymmetric_gaussian_pdf(x, 0.6, 0.03, 0.01),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        double_lorentz(x, 0.3, 0.02, 0.6, 0.04, 1.0, 5.0, 7.0),
        lorentzian(x, 0.3, 0.02, 1.0, 5.0) + lorentzian(x, 0.6, 0.04, 0.0, 7.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(gaussian(x, 0.3, 0.02, 0.0, 0.0), 0.0);
}

#[test]
fn test_vectorized_evaluation_matches_scalar() {
    let x = Array1::linspace(0.0, 1.0, 101);
    let p = [0.25, 0.03, 0.7, 0.02, 0.5, 8.0, 12.0];
    let y = PeakModel::DoubleGaussian.eval_array(&x, &p).unwrap();
    let z = vectorize(&x, |xi| double_gaussian(xi, 0.25, 0.03, 0.7, 0.02, 0.5, 8.0, 12.0));
    assert_eq!(y, z);
}

#[test]
fn test_model_integrals_scale_with_amplitudes() {
    // Over a full rotation a well-contained peak adds its amplitude.
    let p = [0.5, 0.03, 2.0, 40.0];
    assert_relative_eq!(PeakModel::Gaussian.integral(0.0, 1.0, &p).unwrap(), 42.0, epsilon = 1e-9);
    let p = [0.3, 0.02, 0.04, 0.7, 0.03, 0.02, 1.0, 10.0, 20.0];
    assert_relative_eq!(
        PeakModel::AsymmetricDoubleGaussian.integral(0.0, 1.0, &p).unwrap(),
        31.0,
        epsilon = 1e-8
    );
}
