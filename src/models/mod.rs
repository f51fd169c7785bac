//! Built-in peak models for pulse profiles.
//!
//! This module provides the closed-form intensity functions used by both
//! fitting modes, together with a registry ([`PeakModel`]) that knows each
//! model's canonical parameter order and the role every parameter plays.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PulseFitError, Result};

mod peak;
pub mod shapes;

pub use peak::{
    asymmetric_double_gaussian, double_gaussian, double_lorentz, gaussian, lorentzian,
    triple_gaussian, vectorize,
};
pub use shapes::{asymmetric_gaussian_pdf, lorentz_pdf, normal_pdf};

/// What a model parameter controls. Peak indices are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamRole {
    /// Peak position in phase.
    Location(usize),
    /// Peak width (sigma, one side of an asymmetric peak, or gamma).
    Width(usize),
    /// Peak area in counts.
    Amplitude(usize),
    /// Flat background level.
    Background,
}

/// A named model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub role: ParamRole,
}

const fn spec(name: &'static str, role: ParamRole) -> ParamSpec {
    ParamSpec { name, role }
}

use ParamRole::{Amplitude, Background, Location, Width};

const GAUSSIAN_PARAMS: [ParamSpec; 4] = [
    spec("mu", Location(0)),
    spec("sigma", Width(0)),
    spec("A", Background),
    spec("B", Amplitude(0)),
];

const DOUBLE_GAUSSIAN_PARAMS: [ParamSpec; 7] = [
    spec("mu", Location(0)),
    spec("sigma", Width(0)),
    spec("mu_2", Location(1)),
    spec("sigma_2", Width(1)),
    spec("A", Background),
    spec("B", Amplitude(0)),
    spec("C", Amplitude(1)),
];

const TRIPLE_GAUSSIAN_PARAMS: [ParamSpec; 10] = [
    spec("Bkg", Background),
    spec("mu", Location(0)),
    spec("sigma", Width(0)),
    spec("mu_2", Location(1)),
    spec("sigma_2", Width(1)),
    spec("mu_3", Location(2)),
    spec("sigma_3", Width(2)),
    spec("A", Amplitude(0)),
    spec("B", Amplitude(1)),
    spec("C", Amplitude(2)),
];

const ASYM_DOUBLE_GAUSSIAN_PARAMS: [ParamSpec; 9] = [
    spec("mu", Location(0)),
    spec("sigma1", Width(0)),
    spec("sigma2", Width(0)),
    spec("mu_2", Location(1)),
    spec("sigma1_2", Width(1)),
    spec("sigma2_2", Width(1)),
    spec("A", Background),
    spec("B", Amplitude(0)),
    spec("C", Amplitude(1)),
];

const LORENTZIAN_PARAMS: [ParamSpec; 4] = [
    spec("mu_1", Location(0)),
    spec("gamma_1", Width(0)),
    spec("A", Background),
    spec("B", Amplitude(0)),
];

const DOUBLE_LORENTZ_PARAMS: [ParamSpec; 7] = [
    spec("mu_1", Location(0)),
    spec("gamma_1", Width(0)),
    spec("mu_2", Location(1)),
    spec("gamma_2", Width(1)),
    spec("A", Background),
    spec("B", Amplitude(0)),
    spec("C", Amplitude(1)),
];

/// Registry of valid model identifiers, in registry order.
const MODEL_NAMES: [&str; 6] = [
    "gaussian",
    "dgaussian",
    "tgaussian",
    "asym_dgaussian",
    "lorentzian",
    "double_lorentz",
];

/// Names of every model a [`crate::fitting::PeakFitter`] accepts.
pub fn get_model_list() -> &'static [&'static str] {
    &MODEL_NAMES
}

/// A peak-shape model from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PeakModel {
    Gaussian,
    DoubleGaussian,
    TripleGaussian,
    AsymmetricDoubleGaussian,
    Lorentzian,
    DoubleLorentz,
}

impl PeakModel {
    /// All models, in registry order.
    pub const ALL: [PeakModel; 6] = [
        PeakModel::Gaussian,
        PeakModel::DoubleGaussian,
        PeakModel::TripleGaussian,
        PeakModel::AsymmetricDoubleGaussian,
        PeakModel::Lorentzian,
        PeakModel::DoubleLorentz,
    ];

    /// Registry identifier.
    pub fn name(&self) -> &'static str {
        match self {
            PeakModel::Gaussian => MODEL_NAMES[0],
            PeakModel::DoubleGaussian => MODEL_NAMES[1],
            PeakModel::TripleGaussian => MODEL_NAMES[2],
            PeakModel::AsymmetricDoubleGaussian => MODEL_NAMES[3],
            PeakModel::Lorentzian => MODEL_NAMES[4],
            PeakModel::DoubleLorentz => MODEL_NAMES[5],
        }
    }

    /// Canonical parameter list, in evaluation order.
    pub fn parameters(&self) -> &'static [ParamSpec] {
        match self {
            PeakModel::Gaussian => &GAUSSIAN_PARAMS,
            PeakModel::DoubleGaussian => &DOUBLE_GAUSSIAN_PARAMS,
            PeakModel::TripleGaussian => &TRIPLE_GAUSSIAN_PARAMS,
            PeakModel::AsymmetricDoubleGaussian => &ASYM_DOUBLE_GAUSSIAN_PARAMS,
            PeakModel::Lorentzian => &LORENTZIAN_PARAMS,
            PeakModel::DoubleLorentz => &DOUBLE_LORENTZ_PARAMS,
        }
    }

    /// Canonical parameter names.
    pub fn parameter_names(&self) -> Vec<&'static str> {
        self.parameters().iter().map(|p| p.name).collect()
    }

    /// Number of peak components.
    pub fn n_peaks(&self) -> usize {
        match self {
            PeakModel::Gaussian | PeakModel::Lorentzian => 1,
            PeakModel::DoubleGaussian
            | PeakModel::AsymmetricDoubleGaussian
            | PeakModel::DoubleLorentz => 2,
            PeakModel::TripleGaussian => 3,
        }
    }

    fn check_len(&self, params: &[f64]) -> Result<()> {
        let expected = self.parameters().len();
        if params.len() != expected {
            return Err(PulseFitError::DimensionMismatch(format!(
                "model '{}' expects {} parameters, got {}",
                self.name(),
                expected,
                params.len()
            )));
        }
        Ok(())
    }

    /// Evaluate at one phase. `params` must be in canonical order; the
    /// caller guarantees the length (see [`PeakModel::eval`] for a checked
    /// version).
    #[inline]
    pub fn eval_unchecked(&self, x: f64, p: &[f64]) -> f64 {
        match self {
            PeakModel::Gaussian => gaussian(x, p[0], p[1], p[2], p[3]),
            PeakModel::DoubleGaussian => double_gaussian(x, p[0], p[1], p[2], p[3], p[4], p[5], p[6]),
            PeakModel::TripleGaussian => {
                triple_gaussian(x, p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7], p[8], p[9])
            }
            PeakModel::AsymmetricDoubleGaussian => asymmetric_double_gaussian(
                x, p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7], p[8],
            ),
            PeakModel::Lorentzian => lorentzian(x, p[0], p[1], p[2], p[3]),
            PeakModel::DoubleLorentz => double_lorentz(x, p[0], p[1], p[2], p[3], p[4], p[5], p[6]),
        }
    }

    /// Per-parameter sign factors that map `params` onto the same curve with
    /// every width non-negative.
    ///
    /// The asymmetric Gaussian depends on its widths only through their
    /// magnitude. The normal and Cauchy components are odd in the width, so
    /// flipping a width also flips the amplitude of that peak.
    pub fn canonical_signs(&self, params: &[f64]) -> Vec<f64> {
        let specs = self.parameters();
        let mut signs = vec![1.0; specs.len()];
        for (k, spec) in specs.iter().enumerate() {
            let ParamRole::Width(peak) = spec.role else {
                continue;
            };
            if params.get(k).map_or(true, |w| *w >= 0.0) {
                continue;
            }
            signs[k] = -1.0;
            if *self != PeakModel::AsymmetricDoubleGaussian {
                if let Some(a) = specs.iter().position(|s| s.role == Amplitude(peak)) {
                    signs[a] = -signs[a];
                }
            }
        }
        signs
    }

    /// Evaluate at one phase.
    pub fn eval(&self, x: f64, params: &[f64]) -> Result<f64> {
        self.check_len(params)?;
        Ok(self.eval_unchecked(x, params))
    }

    /// Evaluate element-wise over an array of phases.
    pub fn eval_array(&self, x: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>> {
        self.check_len(params)?;
        Ok(vectorize(x, |xi| self.eval_unchecked(xi, params)))
    }

    /// Exact integral of the model over `[lo, hi]`.
    pub fn integral(&self, lo: f64, hi: f64, params: &[f64]) -> Result<f64> {
        self.check_len(params)?;
        Ok(self.integral_unchecked(lo, hi, params))
    }

    pub(crate) fn integral_unchecked(&self, lo: f64, hi: f64, p: &[f64]) -> f64 {
        use shapes::{asymmetric_gaussian_cdf as acdf, lorentz_cdf as lcdf, normal_cdf as ncdf};

        let width = hi - lo;
        let normal = |mu: f64, s: f64| ncdf(hi, mu, s) - ncdf(lo, mu, s);
        let asym = |mu: f64, s1: f64, s2: f64| acdf(hi, mu, s1, s2) - acdf(lo, mu, s1, s2);
        let cauchy = |mu: f64, g: f64| lcdf(hi, mu, g) - lcdf(lo, mu, g);

        match self {
            PeakModel::Gaussian => p[2] * width + p[3] * normal(p[0], p[1]),
            PeakModel::DoubleGaussian => {
                p[4] * width + p[5] * normal(p[0], p[1]) + p[6] * normal(p[2], p[3])
            }
            PeakModel::TripleGaussian => {
                p[0] * width
                    + p[7] * normal(p[1], p[2])
                    + p[8] * normal(p[3], p[4])
                    + p[9] * normal(p[5], p[6])
            }
            PeakModel::AsymmetricDoubleGaussian => {
                p[6] * width + p[7] * asym(p[0], p[1], p[2]) + p[8] * asym(p[3], p[4], p[5])
            }
            PeakModel::Lorentzian => p[2] * width + p[3] * cauchy(p[0], p[1]),
            PeakModel::DoubleLorentz => {
                p[4] * width + p[5] * cauchy(p[0], p[1]) + p[6] * cauchy(p[2], p[3])
            }
        }
    }
}

impl FromStr for PeakModel {
    type Err = PulseFitError;

    fn from_str(s: &str) -> Result<Self> {
        PeakModel::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| PulseFitError::InvalidModel(s.to_string()))
    }
}

impl TryFrom<String> for PeakModel {
    type Error = PulseFitError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PeakModel> for String {
    fn from(model: PeakModel) -> Self {
        model.name().to_string()
    }
}

impl fmt::Display for PeakModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
