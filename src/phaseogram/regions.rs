//! Named ON/OFF phase regions and their count statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{PulseFitError, Result};
use crate::phaseogram::Histogram;

/// Name of a phase region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegionName {
    P1,
    P2,
    P3,
    #[serde(rename = "OFF")]
    Off,
}

impl RegionName {
    pub const PEAKS: [RegionName; 3] = [RegionName::P1, RegionName::P2, RegionName::P3];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionName::P1 => "P1",
            RegionName::P2 => "P2",
            RegionName::P3 => "P3",
            RegionName::Off => "OFF",
        }
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionName {
    type Err = PulseFitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P1" => Ok(RegionName::P1),
            "P2" => Ok(RegionName::P2),
            "P3" => Ok(RegionName::P3),
            "OFF" => Ok(RegionName::Off),
            other => Err(PulseFitError::InvalidRegion(format!("unknown region '{}'", other))),
        }
    }
}

/// A phase interval, or a pair of intervals for a region wrapping through
/// phase 0, with its count statistics.
///
/// Two limits describe `[l0, l1]`. Four limits describe a region wrapping
/// through phase 0 and must read `[l0, 1, 0, l3]`, i.e. `[l0, 1] ∪ [0, l3]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRegion {
    pub limits: Vec<f64>,
    /// Excess counts over the scaled background.
    #[serde(rename = "Nex")]
    pub nex: f64,
    /// Background expectation in this region.
    pub noff: f64,
    /// Total phase width.
    #[serde(rename = "deltaP")]
    pub delta_p: f64,
}

impl PhaseRegion {
    /// Region over `limits` with zero statistics.
    pub fn new(limits: Vec<f64>) -> Result<Self> {
        if limits.len() != 2 && limits.len() != 4 {
            return Err(PulseFitError::InvalidRegion(format!(
                "expected 2 or 4 limits, got {}",
                limits.len()
            )));
        }
        if limits.iter().any(|l| !(0.0..=1.0).contains(l)) {
            return Err(PulseFitError::InvalidRegion(format!(
                "limits {:?} outside [0, 1]",
                limits
            )));
        }
        if limits.chunks(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PulseFitError::InvalidRegion(format!(
                "limits {:?} are not increasing within each interval",
                limits
            )));
        }
        if limits.len() == 4 && (limits[1] != 1.0 || limits[2] != 0.0) {
            return Err(PulseFitError::InvalidRegion(format!(
                "wrapped limits {:?} must have the form [l0, 1, 0, l3]",
                limits
            )));
        }
        let delta_p = limits.chunks(2).map(|pair| pair[1] - pair[0]).sum();
        Ok(Self {
            limits,
            nex: 0.0,
            noff: 0.0,
            delta_p,
        })
    }

    /// Attach count statistics.
    pub fn with_stats(mut self, nex: f64, noff: f64) -> Self {
        self.nex = nex;
        self.noff = noff;
        self
    }

    pub fn is_wrapped(&self) -> bool {
        self.limits.len() == 4
    }

    fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.limits.chunks(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn contains(&self, phase: f64) -> bool {
        self.intervals().any(|(lo, hi)| phase >= lo && phase <= hi)
    }

    /// True if the open bin `(left, right)` lies strictly inside one interval.
    pub fn strictly_contains_bin(&self, left: f64, right: f64) -> bool {
        self.intervals().any(|(lo, hi)| left > lo && right < hi)
    }

    /// Midpoint of the region, measured across phase 0 for a wrapped region
    /// and therefore possibly above one.
    pub fn unfolded_midpoint(&self) -> f64 {
        if self.is_wrapped() {
            0.5 * (self.limits[0] + 1.0 + self.limits[3])
        } else {
            0.5 * (self.limits[0] + self.limits[1])
        }
    }

    /// Midpoint of the region folded into [0, 1).
    pub fn midpoint(&self) -> f64 {
        self.unfolded_midpoint().rem_euclid(1.0)
    }
}

/// Phase limits of the regions of an analysis, before any counting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionLimits {
    #[serde(rename = "P1", default, skip_serializing_if = "Option::is_none")]
    pub p1: Option<Vec<f64>>,
    #[serde(rename = "P2", default, skip_serializing_if = "Option::is_none")]
    pub p2: Option<Vec<f64>>,
    #[serde(rename = "P3", default, skip_serializing_if = "Option::is_none")]
    pub p3: Option<Vec<f64>>,
    #[serde(rename = "OFF")]
    pub off: Vec<f64>,
}

impl RegionLimits {
    pub fn new(off: Vec<f64>) -> Self {
        Self {
            off,
            ..Default::default()
        }
    }

    pub fn with_peak(mut self, name: RegionName, limits: Vec<f64>) -> Self {
        match name {
            RegionName::P1 => self.p1 = Some(limits),
            RegionName::P2 => self.p2 = Some(limits),
            RegionName::P3 => self.p3 = Some(limits),
            RegionName::Off => self.off = limits,
        }
        self
    }

    fn peaks(&self) -> impl Iterator<Item = (RegionName, &Vec<f64>)> {
        [
            (RegionName::P1, self.p1.as_ref()),
            (RegionName::P2, self.p2.as_ref()),
            (RegionName::P3, self.p3.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, limits)| limits.map(|l| (name, l)))
    }
}

/// The OFF region plus whichever peak regions an analysis defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRegions {
    off: PhaseRegion,
    peaks: BTreeMap<RegionName, PhaseRegion>,
}

impl PhaseRegions {
    pub fn new(off: PhaseRegion) -> Self {
        Self {
            off,
            peaks: BTreeMap::new(),
        }
    }

    /// Add or replace a peak region.
    pub fn with(mut self, name: RegionName, region: PhaseRegion) -> Result<Self> {
        if name == RegionName::Off {
            return Err(PulseFitError::InvalidRegion(
                "OFF is set at construction".to_string(),
            ));
        }
        self.peaks.insert(name, region);
        Ok(self)
    }

    pub fn off(&self) -> &PhaseRegion {
        &self.off
    }

    pub fn get(&self, name: RegionName) -> Option<&PhaseRegion> {
        match name {
            RegionName::Off => Some(&self.off),
            peak => self.peaks.get(&peak),
        }
    }

    pub fn peak_names(&self) -> impl Iterator<Item = RegionName> + '_ {
        self.peaks.keys().copied()
    }

    fn build<F>(limits: &RegionLimits, count: F) -> Result<Self>
    where
        F: Fn(&PhaseRegion) -> f64,
    {
        let off = PhaseRegion::new(limits.off.clone())?;
        let n_off = count(&off);
        let off_delta = off.delta_p;
        let mut regions = Self::new(off.with_stats(0.0, n_off));
        for (name, peak_limits) in limits.peaks() {
            let region = PhaseRegion::new(peak_limits.clone())?;
            let n_on = count(&region);
            let noff = n_off * region.delta_p / off_delta;
            regions.peaks.insert(name, region.with_stats(n_on - noff, noff));
        }
        Ok(regions)
    }

    /// Region statistics from event phases.
    pub fn from_phases(phases: &[f64], limits: &RegionLimits) -> Result<Self> {
        Self::build(limits, |region| {
            phases.iter().filter(|p| region.contains(**p)).count() as f64
        })
    }

    /// Region statistics from a histogram, counting bins by their centers.
    pub fn from_histogram(histogram: &Histogram, limits: &RegionLimits) -> Result<Self> {
        let centers = histogram.centers();
        Self::build(limits, |region| {
            centers
                .iter()
                .zip(histogram.counts())
                .filter(|(c, _)| region.contains(**c))
                .map(|(_, n)| n)
                .sum()
        })
    }
}
