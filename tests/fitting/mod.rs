//! End-to-end peak fits on synthetic phaseograms.

use approx::assert_relative_eq;
use pulsefit_rs::config::AnalysisConfig;
use pulsefit_rs::cuts::CutEngine;
use pulsefit_rs::error::{ErrorCategory, PulseFitError};
use pulsefit_rs::events::{Column, EventTable};
use pulsefit_rs::fitting::{FitMode, FitResult, FitStatus, PeakFitter, PeakSelection};
use pulsefit_rs::lm::LmConfig;
use pulsefit_rs::models::{normal_pdf, ParamRole, PeakModel};
use pulsefit_rs::phaseogram::{Histogram, PhaseRegions, PhaseogramData, RegionLimits, RegionName};
use pulsefit_rs::synthetic::{expected_histogram, poisson_histogram, sample_phases};
use rand::Rng;

use crate::test_helpers::{approx_eq, rng};

/// mu, sigma, mu_2, sigma_2, A, B, C
const DOUBLE_PEAK: [f64; 7] = [0.1, 0.02, 0.55, 0.03, 1.0, 50.0, 80.0];

fn double_peak_limits() -> RegionLimits {
    RegionLimits::new(vec![0.7, 0.95])
        .with_peak(RegionName::P1, vec![0.05, 0.15])
        .with_peak(RegionName::P2, vec![0.45, 0.65])
}

fn binned_fit(model: &str, peak: PeakSelection, histogram: &Histogram, limits: &RegionLimits) -> FitResult {
    let regions = PhaseRegions::from_histogram(histogram, limits).unwrap();
    let mut fitter = PeakFitter::new(model, peak, FitMode::Binned).unwrap();
    fitter.estimate_initial_values(&regions, histogram).unwrap();
    fitter.fit_binned(histogram).unwrap().clone()
}

/// Gaussian light curve that wraps around phase 0.
fn periodic_gaussian(n_bins: usize, mu: f64, sigma: f64, a: f64, b: f64) -> Histogram {
    let edges: Vec<f64> = (0..=n_bins).map(|i| i as f64 / n_bins as f64).collect();
    let counts = edges
        .windows(2)
        .map(|w| {
            let c = 0.5 * (w[0] + w[1]);
            a + b * (-1..=1).map(|k| normal_pdf(c + k as f64, mu, sigma)).sum::<f64>()
        })
        .collect();
    Histogram::new(counts, edges).unwrap()
}

#[test]
fn test_dgaussian_binned_recovers_generator() {
    let histogram = expected_histogram(PeakModel::DoubleGaussian, &DOUBLE_PEAK, 200).unwrap();
    let result = binned_fit("dgaussian", PeakSelection::Both, &histogram, &double_peak_limits());

    assert!(result.is_converged(), "{}", result);
    assert_relative_eq!(result.phase_shift, 0.825, epsilon = 1e-12);
    assert!(approx_eq(result.folded("mu").unwrap(), 0.1, 1e-4), "{}", result);
    assert!(approx_eq(result.value("sigma").unwrap(), 0.02, 1e-4), "{}", result);
    assert!(approx_eq(result.folded("mu_2").unwrap(), 0.55, 1e-4), "{}", result);
    assert!(approx_eq(result.value("sigma_2").unwrap(), 0.03, 1e-4), "{}", result);
    assert_relative_eq!(result.value("B").unwrap(), 50.0, max_relative = 5e-3);
    assert_relative_eq!(result.value("C").unwrap(), 80.0, max_relative = 5e-3);

    let background = result.get("A").unwrap();
    assert!(background.fixed);
    assert_eq!(background.error, 0.0);
}

#[test]
fn test_dgaussian_binned_on_poisson_counts() {
    let mut rng = rng(42);
    let histogram = poisson_histogram(PeakModel::DoubleGaussian, &DOUBLE_PEAK, 200, &mut rng).unwrap();
    let result = binned_fit("dgaussian", PeakSelection::Both, &histogram, &double_peak_limits());

    assert!(result.is_converged(), "{}", result);
    for (name, truth) in [("mu", 0.1), ("sigma", 0.02), ("mu_2", 0.55), ("sigma_2", 0.03)] {
        let err = result.error(name).unwrap();
        assert!(err.is_finite() && err > 0.0, "{} error {}", name, err);
        let value = result.folded(name).unwrap();
        let tolerance = (5.0 * err).max(2e-3);
        assert!((value - truth).abs() < tolerance, "{} = {} ± {}", name, value, err);
    }
    let covariance = result.covariance.as_ref().unwrap();
    assert_eq!(covariance.len(), 6);
}

#[test]
fn test_unbinned_and_binned_agree() {
    let mut rng = rng(2024);
    let truth = [0.1, 0.02, 0.55, 0.03, 2000.0, 5000.0, 8000.0];
    let phases = sample_phases(PeakModel::DoubleGaussian, &truth, 15_000, &mut rng).unwrap();
    let data = PhaseogramData::from_phases(phases, 200, &double_peak_limits()).unwrap();

    let mut binned = PeakFitter::new("dgaussian", PeakSelection::Both, FitMode::Binned).unwrap();
    let binned = binned.run(&data).unwrap().clone();
    let mut unbinned = PeakFitter::new("dgaussian", PeakSelection::Both, FitMode::Unbinned).unwrap();
    let unbinned = unbinned.run(&data).unwrap().clone();

    assert!(binned.is_converged(), "{}", binned);
    assert!(unbinned.is_converged(), "{}", unbinned);
    assert_eq!(unbinned.mode, FitMode::Unbinned);

    for name in ["mu", "sigma", "mu_2", "sigma_2"] {
        let (vb, eb) = (binned.folded(name).unwrap().abs(), binned.error(name).unwrap());
        let (vu, eu) = (unbinned.folded(name).unwrap().abs(), unbinned.error(name).unwrap());
        assert!(eu.is_finite() && eu > 0.0, "{} unbinned error {}", name, eu);
        let combined = (eb * eb + eu * eu).sqrt();
        assert!((vb - vu).abs() < 3.0 * combined, "{}: {} vs {} (±{})", name, vb, vu, combined);
    }
    assert!((unbinned.folded("mu").unwrap() - 0.1).abs() < 5.0 * unbinned.error("mu").unwrap());
    assert!((unbinned.folded("mu_2").unwrap() - 0.55).abs() < 5.0 * unbinned.error("mu_2").unwrap());
}

#[test]
fn test_peak_straddling_phase_zero() {
    let histogram = periodic_gaussian(100, 0.02, 0.02, 3.0, 2.0);
    let limits = RegionLimits::new(vec![0.4, 0.7])
        .with_peak(RegionName::P1, vec![0.95, 1.0, 0.0, 0.1]);
    let result = binned_fit("gaussian", PeakSelection::P1, &histogram, &limits);

    assert!(result.is_converged(), "{}", result);
    assert_relative_eq!(result.phase_shift, 0.55, epsilon = 1e-12);
    // The fit runs on [0.55, 1.55), where the peak sits at 1.02.
    assert!(approx_eq(result.value("mu").unwrap(), 1.02, 1e-4), "{}", result);
    assert!(approx_eq(result.folded("mu").unwrap(), 0.02, 1e-4));
    assert!(approx_eq(result.value("sigma").unwrap(), 0.02, 1e-4));
    assert_relative_eq!(result.value("A").unwrap(), 3.0, epsilon = 1e-9);
}

#[test]
fn test_wrapped_off_region() {
    let truth = [0.45, 0.03, 5.0, 4.0];
    let histogram = expected_histogram(PeakModel::Gaussian, &truth, 100).unwrap();
    let limits = RegionLimits::new(vec![0.9, 1.0, 0.0, 0.05])
        .with_peak(RegionName::P2, vec![0.35, 0.55]);
    let result = binned_fit("gaussian", PeakSelection::P2, &histogram, &limits);

    assert!(result.is_converged(), "{}", result);
    assert_relative_eq!(result.phase_shift, 0.975, epsilon = 1e-12);
    assert!(approx_eq(result.folded("mu").unwrap(), 0.45, 1e-4), "{}", result);
    assert!(approx_eq(result.value("sigma").unwrap(), 0.03, 1e-4));
}

/// OFF region wrapping through phase 0, whose midpoint folds to 0, so the
/// fit window matches the [0, 1) window the phases are drawn on.
fn wrapped_off() -> RegionLimits {
    RegionLimits::new(vec![0.9, 1.0, 0.0, 0.1])
}

/// Draw events from `model` at `truth`, fit them in both modes and check
/// every location and width against the generator.
fn assert_recovers(model: PeakModel, peak: PeakSelection, truth: &[f64], limits: &RegionLimits, seed: u64) {
    let mut rng = rng(seed);
    let phases = sample_phases(model, truth, 12_000, &mut rng).unwrap();
    let data = PhaseogramData::from_phases(phases, 200, limits).unwrap();

    for mode in [FitMode::Binned, FitMode::Unbinned] {
        let mut fitter = PeakFitter::for_model(model, peak, mode).unwrap();
        let result = fitter.run(&data).unwrap();
        assert!(result.is_converged(), "{} {}: {}", model, mode, result);
        assert_eq!(result.parameters.len(), model.parameters().len());

        for (spec, &expected) in model.parameters().iter().zip(truth) {
            let floor = match spec.role {
                ParamRole::Location(_) => 3e-3,
                ParamRole::Width(_) => 0.1 * expected,
                _ => continue,
            };
            let value = result.folded(spec.name).unwrap();
            let err = result.error(spec.name).unwrap();
            assert!(err.is_finite() && err > 0.0, "{} {} {} error {}", model, mode, spec.name, err);
            let tolerance = (5.0 * err).max(floor);
            assert!(
                (value - expected).abs() < tolerance,
                "{} {}: {} = {} ± {}, expected {}\n{}",
                model,
                mode,
                spec.name,
                value,
                err,
                expected,
                result
            );
        }
    }
}

#[test]
fn test_lorentzian_recovers_generator() {
    // mu_1, gamma_1, A, B
    let truth = [0.4, 0.015, 1000.0, 1500.0];
    let limits = wrapped_off().with_peak(RegionName::P1, vec![0.35, 0.45]);
    assert_recovers(PeakModel::Lorentzian, PeakSelection::P1, &truth, &limits, 11);
}

#[test]
fn test_double_lorentz_recovers_generator() {
    // mu_1, gamma_1, mu_2, gamma_2, A, B, C
    let truth = [0.3, 0.015, 0.65, 0.025, 1000.0, 1200.0, 1800.0];
    let limits = wrapped_off()
        .with_peak(RegionName::P1, vec![0.25, 0.35])
        .with_peak(RegionName::P2, vec![0.57, 0.73]);
    assert_recovers(PeakModel::DoubleLorentz, PeakSelection::Both, &truth, &limits, 12);
}

#[test]
fn test_asym_dgaussian_recovers_generator() {
    // Both peaks are skewed, in opposite directions.
    // mu, sigma1, sigma2, mu_2, sigma1_2, sigma2_2, A, B, C
    let truth = [0.3, 0.015, 0.04, 0.65, 0.035, 0.02, 1000.0, 1500.0, 1800.0];
    let limits = wrapped_off()
        .with_peak(RegionName::P1, vec![0.25, 0.42])
        .with_peak(RegionName::P2, vec![0.55, 0.72]);
    assert_recovers(PeakModel::AsymmetricDoubleGaussian, PeakSelection::Both, &truth, &limits, 13);
}

#[test]
fn test_tgaussian_recovers_generator() {
    // Bkg, mu, sigma, mu_2, sigma_2, mu_3, sigma_3, A, B, C
    let truth = [1000.0, 0.25, 0.02, 0.5, 0.03, 0.72, 0.015, 1200.0, 1600.0, 1000.0];
    let limits = wrapped_off()
        .with_peak(RegionName::P1, vec![0.2, 0.3])
        .with_peak(RegionName::P2, vec![0.42, 0.58])
        .with_peak(RegionName::P3, vec![0.68, 0.76]);
    assert_recovers(PeakModel::TripleGaussian, PeakSelection::Both, &truth, &limits, 14);
}

#[test]
fn test_gaussian_recovers_generator_in_p2() {
    let truth = [0.6, 0.02, 1000.0, 1500.0];
    let limits = wrapped_off().with_peak(RegionName::P2, vec![0.55, 0.65]);
    assert_recovers(PeakModel::Gaussian, PeakSelection::P2, &truth, &limits, 15);
}

#[test]
fn test_failed_unbinned_fit_reloads_from_json() {
    let limits = RegionLimits::new(vec![0.6, 0.9]).with_peak(RegionName::P1, vec![0.25, 0.35]);
    let data = PhaseogramData::from_phases(vec![0.3], 50, &limits).unwrap();
    let mut fitter = PeakFitter::new("gaussian", PeakSelection::P1, FitMode::Unbinned).unwrap();
    let result = fitter.run(&data).unwrap().clone();

    let back: FitResult = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(back.status, result.status);
    assert_eq!(back.triples().len(), 4);
    for (before, after) in result.parameters.iter().zip(&back.parameters) {
        assert_eq!(before.name, after.name);
        assert!(before.error == after.error || (before.error.is_nan() && after.error.is_nan()));
    }
}

#[test]
fn test_iteration_limit_is_a_failed_status_not_an_error() {
    let histogram = expected_histogram(PeakModel::DoubleGaussian, &DOUBLE_PEAK, 200).unwrap();
    let regions = PhaseRegions::from_histogram(&histogram, &double_peak_limits()).unwrap();
    let config = LmConfig {
        max_iterations: 1,
        ..Default::default()
    };
    let mut fitter = PeakFitter::new("dgaussian", PeakSelection::Both, FitMode::Binned)
        .unwrap()
        .with_least_squares(config);
    fitter.estimate_initial_values(&regions, &histogram).unwrap();
    let result = fitter.fit_binned(&histogram).unwrap();
    assert!(!result.is_converged());
    assert!(matches!(&result.status, FitStatus::Failed { reason } if reason.contains("iterations")));
}

#[test]
fn test_precondition_errors() {
    let histogram = expected_histogram(PeakModel::Gaussian, &[0.3, 0.02, 2.0, 3.0], 50).unwrap();

    let mut fitter = PeakFitter::new("dgaussian", PeakSelection::Both, FitMode::Binned).unwrap();
    let err = fitter.fit_binned(&histogram).unwrap_err();
    assert!(matches!(err, PulseFitError::NotEstimated));
    assert_eq!(err.category(), ErrorCategory::Precondition);

    let limits = RegionLimits::new(vec![0.6, 0.9]).with_peak(RegionName::P1, vec![0.2, 0.4]);
    let regions = PhaseRegions::from_histogram(&histogram, &limits).unwrap();
    let err = fitter.estimate_initial_values(&regions, &histogram).unwrap_err();
    assert!(matches!(err, PulseFitError::MissingRegion(ref name) if name == "P2"));
    assert!(fitter.initial_values().is_none());

    let err = PeakFitter::new("gaussian", PeakSelection::Both, FitMode::Unbinned).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_result_reporting() {
    let histogram = expected_histogram(PeakModel::DoubleGaussian, &DOUBLE_PEAK, 200).unwrap();
    let result = binned_fit("dgaussian", PeakSelection::Both, &histogram, &double_peak_limits());

    let table = result.to_string();
    for name in PeakModel::DoubleGaussian.parameter_names() {
        assert!(table.contains(name), "{} missing from\n{}", name, table);
    }
    let json = result.to_json().unwrap();
    let back: FitResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.model, PeakModel::DoubleGaussian);
    assert_eq!(back.triples().len(), 7);
    assert_eq!(back.triples()[0].0, "mu");
}

#[test]
fn test_config_driven_pipeline() {
    let config = AnalysisConfig::from_json_str(
        r#"{
            "cuts": { "gammaness_cut": 0.5 },
            "fit": { "model": "gaussian", "peak": "P1", "binned": false },
            "regions": { "P1": [0.25, 0.35], "OFF": [0.6, 0.95] },
            "n_bins": 50
        }"#,
    )
    .unwrap();

    // Pulsed gamma-like events on top of uniform hadron-like events.
    let mut rng = rng(77);
    let signal = sample_phases(PeakModel::Gaussian, &[0.3, 0.02, 0.0, 1.0], 3_000, &mut rng).unwrap();
    let mut phase = signal.clone();
    let mut gammaness: Vec<f64> = signal.iter().map(|_| rng.gen_range(0.6..1.0)).collect();
    for _ in 0..6_000 {
        phase.push(rng.gen());
        gammaness.push(rng.gen());
    }
    let n = phase.len();
    let time: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let energy = vec![1.0; n];
    let mut events = EventTable::new(time, phase, energy)
        .unwrap()
        .with_column(Column::Gammaness, gammaness)
        .unwrap();

    let engine: CutEngine = config.cut_engine().unwrap();
    engine.apply(&mut events).unwrap();
    assert!(events.len() > 3_000 && events.len() < n);

    let data = config.phaseogram(events.phase().to_vec()).unwrap();
    let mut fitter = config.fit.build().unwrap();
    let result = fitter.run(&data).unwrap();
    assert!(result.is_converged(), "{}", result);
    assert!((result.folded("mu").unwrap() - 0.3).abs() < 3e-3, "{}", result);
    assert!((result.value("sigma").unwrap() - 0.02).abs() < 3e-3, "{}", result);
}
