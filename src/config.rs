//! JSON analysis configuration.
//!
//! ```rust
//! use pulsefit_rs::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::from_json_str(r#"{
//!     "cuts": { "gammaness_cut": 0.7, "zenith_cut": [0.0, 50.0] },
//!     "fit": { "model": "lorentzian", "peak": "P1", "binned": false }
//! }"#).unwrap();
//!
//! let fitter = config.fit.build().unwrap();
//! assert_eq!(fitter.model().name(), "lorentzian");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cuts::{CutEngine, CutSpec};
use crate::error::{PulseFitError, Result};
use crate::fitting::{FitMode, PeakFitter, PeakSelection};
use crate::likelihood::NewtonConfig;
use crate::lm::LmConfig;
use crate::phaseogram::{PhaseogramData, RegionLimits};

/// Which model to fit and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Registry model name.
    pub model: String,
    pub peak: PeakSelection,
    /// Least squares on the histogram when true, likelihood on phases when false.
    pub binned: bool,
    pub least_squares: LmConfig,
    pub likelihood: NewtonConfig,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            model: "dgaussian".to_string(),
            peak: PeakSelection::Both,
            binned: true,
            least_squares: LmConfig::default(),
            likelihood: NewtonConfig::default(),
        }
    }
}

impl FitSettings {
    pub fn mode(&self) -> FitMode {
        if self.binned {
            FitMode::Binned
        } else {
            FitMode::Unbinned
        }
    }

    /// A validated fitter carrying these optimizer settings.
    pub fn build(&self) -> Result<PeakFitter> {
        Ok(PeakFitter::new(&self.model, self.peak, self.mode())?
            .with_least_squares(self.least_squares.clone())
            .with_likelihood(self.likelihood.clone()))
    }
}

/// Cuts, phaseogram layout and fit settings of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cuts: CutSpec,
    pub fit: FitSettings,
    /// Phase regions; required to build a phaseogram.
    pub regions: Option<RegionLimits>,
    /// Histogram bins over one rotation.
    pub n_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cuts: CutSpec::default(),
            fit: FitSettings::default(),
            regions: None,
            n_bins: 50,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Cut engine for the configured cuts.
    pub fn cut_engine(&self) -> Result<CutEngine> {
        CutEngine::new(self.cuts.clone())
    }

    /// Histogram and region statistics for already-cut phases.
    pub fn phaseogram(&self, phases: Vec<f64>) -> Result<PhaseogramData> {
        let limits = self.regions.as_ref().ok_or_else(|| {
            PulseFitError::InvalidConfig("no phase regions configured".to_string())
        })?;
        PhaseogramData::from_phases(phases, self.n_bins, limits)
    }
}
