//! # Peak Fitting
//!
//! Fits a registry model to a phaseogram, either binned (weighted least
//! squares on histogram heights) or unbinned (maximum likelihood on event
//! phases). A [`PeakFitter`] moves through three stages:
//!
//! 1. constructed with a model, a peak selection and a mode,
//! 2. initial values estimated from the region statistics,
//! 3. fitted, holding a [`FitResult`].
//!
//! ```rust,no_run
//! use pulsefit_rs::fitting::{FitMode, PeakFitter, PeakSelection};
//! use pulsefit_rs::phaseogram::{PhaseogramData, RegionLimits, RegionName};
//!
//! # fn main() -> pulsefit_rs::error::Result<()> {
//! # let phases: Vec<f64> = Vec::new();
//! let limits = RegionLimits::new(vec![0.7, 0.95])
//!     .with_peak(RegionName::P1, vec![0.05, 0.15])
//!     .with_peak(RegionName::P2, vec![0.45, 0.65]);
//! let data = PhaseogramData::from_phases(phases, 200, &limits)?;
//!
//! let mut fitter = PeakFitter::new("dgaussian", PeakSelection::Both, FitMode::Binned)?;
//! let result = fitter.run(&data)?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

mod binned;
mod fitter;
mod initial;
mod result;

pub use binned::BinnedProblem;
pub use fitter::PeakFitter;
pub use initial::{InitialValues, PeakSeed};
pub use result::{FitResult, FitStatus, ParameterEstimate};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PulseFitError, Result};
use crate::phaseogram::RegionName;

/// Which peak(s) of the light curve a model describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeakSelection {
    P1,
    P2,
    P3,
    #[serde(rename = "both")]
    Both,
}

impl PeakSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeakSelection::P1 => "P1",
            PeakSelection::P2 => "P2",
            PeakSelection::P3 => "P3",
            PeakSelection::Both => "both",
        }
    }

    /// The single region this selection names, if any.
    pub fn region(&self) -> Option<RegionName> {
        match self {
            PeakSelection::P1 => Some(RegionName::P1),
            PeakSelection::P2 => Some(RegionName::P2),
            PeakSelection::P3 => Some(RegionName::P3),
            PeakSelection::Both => None,
        }
    }
}

impl fmt::Display for PeakSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeakSelection {
    type Err = PulseFitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P1" => Ok(PeakSelection::P1),
            "P2" => Ok(PeakSelection::P2),
            "P3" => Ok(PeakSelection::P3),
            "both" => Ok(PeakSelection::Both),
            other => Err(PulseFitError::InvalidConfig(format!(
                "unknown peak selection '{}'",
                other
            ))),
        }
    }
}

/// Binned least squares or unbinned maximum likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Binned,
    Unbinned,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMode::Binned => f.write_str("binned"),
            FitMode::Unbinned => f.write_str("unbinned"),
        }
    }
}
