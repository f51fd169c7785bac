//! Starting values for peak fits, taken from the region statistics.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PulseFitError, Result};
use crate::fitting::{FitMode, PeakSelection};
use crate::models::{ParamRole, PeakModel};
use crate::parameters::{Parameter, ParameterSet};
use crate::phaseogram::{Histogram, PhaseRegions, RegionName};

/// Starting point for one peak component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSeed {
    pub region: RegionName,
    /// Region midpoint on the shifted phase axis.
    pub location: f64,
    /// Half the region width.
    pub width: f64,
    /// Excess counts in the region.
    pub excess: f64,
}

/// Everything a fit starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialValues {
    /// Start of the fitted phase window `[phase_shift, phase_shift + 1)`.
    pub phase_shift: f64,
    pub peaks: Vec<PeakSeed>,
    /// Mean histogram height of the bins inside the OFF region.
    pub background: f64,
    pub bin_width: f64,
    /// Canonical-order parameters, background fixed, scaled for the mode.
    pub parameters: ParameterSet,
}

/// Regions a model/selection pair needs, in peak-index order.
pub(crate) fn required_regions(model: PeakModel, peak: PeakSelection) -> Vec<RegionName> {
    match (model.n_peaks(), peak.region()) {
        (1, Some(region)) => vec![region],
        (n, _) => RegionName::PEAKS.iter().copied().take(n).collect(),
    }
}

/// Move `phase` by whole rotations into `[shift, shift + 1)`.
pub(crate) fn into_window(phase: f64, shift: f64) -> f64 {
    shift + (phase - shift).rem_euclid(1.0)
}

impl InitialValues {
    pub(crate) fn estimate(
        model: PeakModel,
        peak: PeakSelection,
        mode: FitMode,
        regions: &PhaseRegions,
        histogram: &Histogram,
    ) -> Result<Self> {
        let off = regions.off();
        let phase_shift = off.midpoint();

        let peaks = required_regions(model, peak)
            .into_iter()
            .map(|name| {
                let region = regions
                    .get(name)
                    .ok_or_else(|| PulseFitError::MissingRegion(name.to_string()))?;
                Ok(PeakSeed {
                    region: name,
                    location: into_window(region.unfolded_midpoint(), phase_shift),
                    width: 0.5 * region.delta_p,
                    excess: region.nex,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let edges = histogram.edges();
        let off_heights: Vec<f64> = histogram
            .counts()
            .iter()
            .enumerate()
            .filter(|(i, _)| off.strictly_contains_bin(edges[*i], edges[*i + 1]))
            .map(|(_, c)| *c)
            .collect();
        if off_heights.is_empty() {
            return Err(PulseFitError::InvalidRegion(format!(
                "no histogram bin lies inside the OFF region {:?}",
                off.limits
            )));
        }
        let background = off_heights.iter().sum::<f64>() / off_heights.len() as f64;
        let bin_width = histogram.bin_width();

        // Binned fits work in counts per bin, unbinned fits in counts per
        // unit phase.
        let (background_scale, amplitude_scale) = match mode {
            FitMode::Binned => (1.0, bin_width),
            FitMode::Unbinned => (1.0 / bin_width, 1.0),
        };

        let mut parameters = ParameterSet::new();
        for spec in model.parameters() {
            let param = match spec.role {
                ParamRole::Location(i) => Parameter::free(spec.name, peaks[i].location, spec.role),
                ParamRole::Width(i) => Parameter::free(spec.name, peaks[i].width, spec.role),
                ParamRole::Amplitude(i) => {
                    Parameter::free(spec.name, peaks[i].excess * amplitude_scale, spec.role)
                }
                ParamRole::Background => {
                    Parameter::fixed(spec.name, background * background_scale, spec.role)
                }
            };
            parameters.push(param)?;
        }

        debug!(
            model = %model,
            phase_shift,
            background,
            n_off_bins = off_heights.len(),
            values = ?parameters.values(),
            "initial values estimated"
        );

        Ok(Self {
            phase_shift,
            peaks,
            background,
            bin_width,
            parameters,
        })
    }
}
