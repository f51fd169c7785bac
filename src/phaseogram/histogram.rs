//! Binned phase light curves.

use serde::{Deserialize, Serialize};

use crate::error::{PulseFitError, Result};

/// Counts per phase bin over one rotation.
///
/// `edges.len() == counts.len() + 1`, edges strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistogram")]
pub struct Histogram {
    counts: Vec<f64>,
    edges: Vec<f64>,
}

#[derive(Deserialize)]
struct RawHistogram {
    counts: Vec<f64>,
    edges: Vec<f64>,
}

impl TryFrom<RawHistogram> for Histogram {
    type Error = PulseFitError;

    fn try_from(raw: RawHistogram) -> Result<Self> {
        Histogram::new(raw.counts, raw.edges)
    }
}

impl Histogram {
    pub fn new(counts: Vec<f64>, edges: Vec<f64>) -> Result<Self> {
        if counts.is_empty() {
            return Err(PulseFitError::InvalidHistogram("no bins".to_string()));
        }
        if edges.len() != counts.len() + 1 {
            return Err(PulseFitError::InvalidHistogram(format!(
                "{} edges for {} bins",
                edges.len(),
                counts.len()
            )));
        }
        if edges.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(PulseFitError::InvalidHistogram(
                "edges must be strictly increasing".to_string(),
            ));
        }
        if counts.iter().any(|c| !(c.is_finite() && *c >= 0.0)) {
            return Err(PulseFitError::InvalidHistogram(
                "counts must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self { counts, edges })
    }

    /// Histogram of `phases` in `n_bins` equal bins over [0, 1).
    ///
    /// Phases are folded into [0, 1) first.
    pub fn from_phases(phases: &[f64], n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(PulseFitError::InvalidHistogram("no bins".to_string()));
        }
        let mut counts = vec![0.0; n_bins];
        for phase in phases {
            let folded = phase.rem_euclid(1.0);
            let bin = ((folded * n_bins as f64) as usize).min(n_bins - 1);
            counts[bin] += 1.0;
        }
        let edges = (0..=n_bins).map(|i| i as f64 / n_bins as f64).collect();
        Self::new(counts, edges)
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Left edge of every bin.
    pub fn left_edges(&self) -> &[f64] {
        &self.edges[..self.counts.len()]
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Mean bin width.
    pub fn bin_width(&self) -> f64 {
        (self.edges[self.counts.len()] - self.edges[0]) / self.counts.len() as f64
    }
}
