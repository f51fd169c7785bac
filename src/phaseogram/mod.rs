//! # Phaseograms
//!
//! Phase-folded views of an event list: the binned light curve
//! ([`Histogram`]), the named ON/OFF phase regions with their excess and
//! background counts ([`PhaseRegions`]), and the bundle the peak fitter
//! consumes ([`PhaseogramData`]).

pub mod histogram;
pub mod regions;

pub use histogram::Histogram;
pub use regions::{PhaseRegion, PhaseRegions, RegionLimits, RegionName};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything a peak fit reads: raw phases for unbinned fits, the histogram
/// for binned fits and initial values, and the region statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseogramData {
    pub phases: Vec<f64>,
    pub histogram: Histogram,
    pub regions: PhaseRegions,
}

impl PhaseogramData {
    pub fn new(phases: Vec<f64>, histogram: Histogram, regions: PhaseRegions) -> Self {
        Self {
            phases,
            histogram,
            regions,
        }
    }

    /// Histogram and region statistics computed from the phases.
    pub fn from_phases(phases: Vec<f64>, n_bins: usize, limits: &RegionLimits) -> Result<Self> {
        let histogram = Histogram::from_phases(&phases, n_bins)?;
        let regions = PhaseRegions::from_phases(&phases, limits)?;
        Ok(Self::new(phases, histogram, regions))
    }
}
