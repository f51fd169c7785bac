//! Application of cuts to event tables.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cuts::spec::{CutSpec, CutValue};
use crate::error::{PulseFitError, Result};
use crate::events::{Column, EventTable};

/// Validated cuts, ready to filter event tables.
#[derive(Debug, Clone)]
pub struct CutEngine {
    spec: CutSpec,
}

type BinPredicate = fn(f64, f64) -> bool;

fn above(value: f64, cut: f64) -> bool {
    value > cut
}

fn below(value: f64, cut: f64) -> bool {
    value < cut
}

/// AND `pred(value)` into `mask` element-wise.
fn and_mask<F>(mask: &mut [bool], column: &[f64], pred: F)
where
    F: Fn(f64) -> bool + Sync,
{
    mask.par_iter_mut()
        .zip(column.par_iter())
        .for_each(|(keep, &v)| *keep &= pred(v));
}

impl CutEngine {
    /// Validate `spec` and build the engine.
    ///
    /// Threshold domains are checked here unless an energy binning is set,
    /// in which case they are checked when the cuts are applied.
    pub fn new(spec: CutSpec) -> Result<Self> {
        spec.check_structure()?;
        if spec.energy_binning.is_none() {
            spec.check_cuts()?;
        }
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &CutSpec {
        &self.spec
    }

    /// Check every configured threshold against its domain.
    pub fn check_cuts(&self) -> Result<()> {
        self.spec.check_cuts()
    }

    fn ensure_checked(&self) -> Result<()> {
        if self.spec.energy_binning.is_some() {
            self.spec.check_cuts()?;
        }
        Ok(())
    }

    /// Apply every scalar cut, keeping only events that pass all of them.
    ///
    /// Per-bin cuts are left to [`CutEngine::apply_energydep_cuts`]. Columns
    /// needed by an active cut must be present; nothing is removed if one
    /// is missing.
    pub fn apply_fixed_cut(&self, table: &mut EventTable) -> Result<()> {
        self.ensure_checked()?;
        let total = table.len();
        let mut mask = vec![true; total];

        if let Some(g) = self.spec.gammaness_cut.as_ref().and_then(CutValue::scalar) {
            and_mask(&mut mask, table.require(Column::Gammaness)?, |v| v > g);
        }
        if let Some(a) = self.spec.alpha_cut.as_ref().and_then(CutValue::scalar) {
            and_mask(&mut mask, table.require(Column::Alpha)?, |v| v < a);
        }
        if let Some(t) = self.spec.theta2_cut.as_ref().and_then(CutValue::scalar) {
            and_mask(&mut mask, table.require(Column::Theta2)?, |v| v < t);
        }
        if let Some((lo, hi)) = self.spec.zenith_cut {
            let zenith = table.zenith_deg()?;
            and_mask(&mut mask, &zenith, |z| z >= lo && z <= hi);
        }
        if let Some(i) = self.spec.intensity_cut {
            and_mask(&mut mask, table.require(Column::Intensity)?, |v| v > i);
        }
        if let Some((lo, hi)) = self.spec.energy_cut {
            and_mask(&mut mask, table.energy(), |e| e >= lo && e <= hi);
        }

        table.retain_mask(&mask)?;
        info!(kept = table.len(), total, "fixed cuts applied");
        Ok(())
    }

    /// Apply per-energy-bin cuts.
    ///
    /// Every event is assigned to its half-open bin `[e_i, e_{i+1})` and
    /// tested against that bin's threshold for every cut given as a per-bin
    /// list. The survivors of all bins are gathered in one pass and the table
    /// is left sorted by time. Events outside the binning are dropped.
    pub fn apply_energydep_cuts(&self, table: &mut EventTable) -> Result<()> {
        let edges = self
            .spec
            .energy_binning
            .as_deref()
            .ok_or(PulseFitError::MissingEnergyBinning)?;
        self.spec.check_cuts()?;
        let n_bins = edges.len() - 1;

        let (mask, kept_per_bin) = {
            let mut active: Vec<(&[f64], &[f64], BinPredicate)> = Vec::new();
            if let Some(cuts) = self.spec.gammaness_cut.as_ref().and_then(CutValue::per_bin) {
                active.push((table.require(Column::Gammaness)?, cuts, above));
            }
            if let Some(cuts) = self.spec.alpha_cut.as_ref().and_then(CutValue::per_bin) {
                active.push((table.require(Column::Alpha)?, cuts, below));
            }
            if let Some(cuts) = self.spec.theta2_cut.as_ref().and_then(CutValue::per_bin) {
                active.push((table.require(Column::Theta2)?, cuts, below));
            }

            let bin_of = |e: f64| -> Option<usize> {
                let upper = edges.partition_point(|&edge| edge <= e);
                (upper >= 1 && upper <= n_bins).then(|| upper - 1)
            };
            let bins: Vec<Option<usize>> = table.energy().par_iter().map(|&e| bin_of(e)).collect();
            let mask: Vec<bool> = bins
                .par_iter()
                .enumerate()
                .map(|(i, bin)| match bin {
                    Some(b) => active.iter().all(|(col, cuts, pass)| pass(col[i], cuts[*b])),
                    None => false,
                })
                .collect();

            let kept_per_bin = bins
                .par_iter()
                .zip(mask.par_iter())
                .fold(
                    || vec![0usize; n_bins],
                    |mut counts, (bin, &keep)| {
                        if let (Some(b), true) = (bin, keep) {
                            counts[*b] += 1;
                        }
                        counts
                    },
                )
                .reduce(
                    || vec![0usize; n_bins],
                    |mut a, b| {
                        a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                        a
                    },
                );
            (mask, kept_per_bin)
        };

        for (bin, kept) in kept_per_bin.iter().enumerate() {
            debug!(bin, low = edges[bin], high = edges[bin + 1], kept, "energy bin filtered");
        }

        let total = table.len();
        table.retain_mask(&mask)?;
        table.sort_by_time();
        info!(kept = table.len(), total, n_bins, "energy-dependent cuts applied");
        Ok(())
    }

    /// Fixed cuts, then energy-dependent cuts when a binning is configured.
    pub fn apply(&self, table: &mut EventTable) -> Result<()> {
        self.apply_fixed_cut(table)?;
        if self.spec.energy_binning.is_some() {
            self.apply_energydep_cuts(table)?;
        }
        Ok(())
    }
}
