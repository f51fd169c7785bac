//! Cut configuration.
//!
//! A [`CutSpec`] lists the optional selection cuts. Each quality cut is a
//! [`CutValue`], either one threshold for all events or one threshold per
//! energy bin, resolved once when the configuration is built or parsed.

use serde::{Deserialize, Serialize};

use crate::error::{PulseFitError, Result};

/// A threshold applied uniformly, or one threshold per energy bin.
///
/// In JSON a number is a [`CutValue::Scalar`] and an array is a
/// [`CutValue::PerBin`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CutValue {
    Scalar(f64),
    PerBin(Vec<f64>),
}

impl CutValue {
    /// Every threshold this value carries.
    pub fn values(&self) -> &[f64] {
        match self {
            CutValue::Scalar(v) => std::slice::from_ref(v),
            CutValue::PerBin(values) => values,
        }
    }

    pub fn scalar(&self) -> Option<f64> {
        match self {
            CutValue::Scalar(v) => Some(*v),
            CutValue::PerBin(_) => None,
        }
    }

    pub fn per_bin(&self) -> Option<&[f64]> {
        match self {
            CutValue::Scalar(_) => None,
            CutValue::PerBin(values) => Some(values),
        }
    }
}

impl From<f64> for CutValue {
    fn from(value: f64) -> Self {
        CutValue::Scalar(value)
    }
}

impl From<Vec<f64>> for CutValue {
    fn from(values: Vec<f64>) -> Self {
        CutValue::PerBin(values)
    }
}

impl From<&[f64]> for CutValue {
    fn from(values: &[f64]) -> Self {
        CutValue::PerBin(values.to_vec())
    }
}

/// Optional selection cuts over an event table.
///
/// Absent fields impose no constraint.
///
/// ```
/// use pulsefit_rs::cuts::CutSpec;
///
/// let cuts = CutSpec::new()
///     .gammaness(0.6)
///     .zenith(0.0, 50.0)
///     .theta2(vec![0.04, 0.03]);
/// assert!(cuts.energy_binning.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutSpec {
    /// Keep `gammaness > cut`. Domain [0, 1).
    pub gammaness_cut: Option<CutValue>,
    /// Keep `alpha < cut`, degrees. Domain >= 0.
    pub alpha_cut: Option<CutValue>,
    /// Keep `theta2 < cut`, deg². Domain >= 0.
    pub theta2_cut: Option<CutValue>,
    /// Keep zenith angle within `[min, max]`, degrees. Domain [0, 90].
    pub zenith_cut: Option<(f64, f64)>,
    /// Keep `intensity > cut`.
    pub intensity_cut: Option<f64>,
    /// Keep energy within `[min, max]`.
    pub energy_cut: Option<(f64, f64)>,
    /// Strictly increasing energy bin edges for per-bin cuts.
    pub energy_binning: Option<Vec<f64>>,
}

impl CutSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gammaness(mut self, cut: impl Into<CutValue>) -> Self {
        self.gammaness_cut = Some(cut.into());
        self
    }

    pub fn alpha(mut self, cut: impl Into<CutValue>) -> Self {
        self.alpha_cut = Some(cut.into());
        self
    }

    pub fn theta2(mut self, cut: impl Into<CutValue>) -> Self {
        self.theta2_cut = Some(cut.into());
        self
    }

    pub fn zenith(mut self, min: f64, max: f64) -> Self {
        self.zenith_cut = Some((min, max));
        self
    }

    pub fn intensity(mut self, cut: f64) -> Self {
        self.intensity_cut = Some(cut);
        self
    }

    pub fn energy(mut self, min: f64, max: f64) -> Self {
        self.energy_cut = Some((min, max));
        self
    }

    pub fn energy_binning(mut self, edges: Vec<f64>) -> Self {
        self.energy_binning = Some(edges);
        self
    }

    /// Number of energy bins, if a binning is configured.
    pub fn n_energy_bins(&self) -> Option<usize> {
        self.energy_binning
            .as_ref()
            .map(|edges| edges.len().saturating_sub(1))
    }

    pub(crate) fn quality_cuts(&self) -> [(&'static str, Option<&CutValue>); 3] {
        [
            ("gammaness_cut", self.gammaness_cut.as_ref()),
            ("alpha_cut", self.alpha_cut.as_ref()),
            ("theta2_cut", self.theta2_cut.as_ref()),
        ]
    }

    /// Check every configured threshold against the domain of its variable.
    ///
    /// Fails on the first offending value, naming the cut and the value.
    pub fn check_cuts(&self) -> Result<()> {
        if let Some(cut) = &self.gammaness_cut {
            for &g in cut.values() {
                if !(0.0..1.0).contains(&g) {
                    return Err(PulseFitError::invalid_cut(
                        "gammaness_cut",
                        g,
                        "gammaness must lie in [0, 1)",
                    ));
                }
            }
        }
        for (name, cut) in [("alpha_cut", &self.alpha_cut), ("theta2_cut", &self.theta2_cut)] {
            if let Some(cut) = cut {
                for &v in cut.values() {
                    if !(v >= 0.0) {
                        return Err(PulseFitError::invalid_cut(name, v, "must be non-negative"));
                    }
                }
            }
        }
        if let Some((lo, hi)) = self.zenith_cut {
            for z in [lo, hi] {
                if !(0.0..=90.0).contains(&z) {
                    return Err(PulseFitError::invalid_cut(
                        "zenith_cut",
                        format!("({}, {})", lo, hi),
                        format!("zenith angle {} outside [0, 90] degrees", z),
                    ));
                }
            }
            if lo > hi {
                return Err(PulseFitError::invalid_cut(
                    "zenith_cut",
                    format!("({}, {})", lo, hi),
                    "minimum exceeds maximum",
                ));
            }
        }
        if let Some(i) = self.intensity_cut {
            if !(i >= 0.0) || i.is_infinite() {
                return Err(PulseFitError::invalid_cut(
                    "intensity_cut",
                    i,
                    "must be a finite non-negative value",
                ));
            }
        }
        if let Some((lo, hi)) = self.energy_cut {
            if !(lo >= 0.0) || !(lo <= hi) {
                return Err(PulseFitError::invalid_cut(
                    "energy_cut",
                    format!("({}, {})", lo, hi),
                    "expected 0 <= min <= max",
                ));
            }
        }
        Ok(())
    }

    /// Shape checks that do not depend on threshold domains: the binning is
    /// strictly increasing with at least two edges, and per-bin lists exist
    /// only with a binning and have one entry per bin.
    pub(crate) fn check_structure(&self) -> Result<()> {
        if let Some(edges) = &self.energy_binning {
            if edges.len() < 2 {
                return Err(PulseFitError::InvalidConfig(format!(
                    "energy binning needs at least two edges, got {}",
                    edges.len()
                )));
            }
            if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PulseFitError::InvalidConfig(
                    "energy binning must be finite and strictly increasing".to_string(),
                ));
            }
        }
        for (name, cut) in self.quality_cuts() {
            let Some(values) = cut.and_then(CutValue::per_bin) else {
                continue;
            };
            match self.n_energy_bins() {
                None => {
                    return Err(PulseFitError::invalid_cut(
                        name,
                        format!("{:?}", values),
                        "per-bin cuts require an energy binning",
                    ))
                }
                Some(n) if n != values.len() => {
                    return Err(PulseFitError::invalid_cut(
                        name,
                        format!("{:?}", values),
                        format!("expected {} values, one per energy bin", n),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_cuts_boundaries() {
        assert!(CutSpec::new().gammaness(0.0).check_cuts().is_ok());
        assert!(CutSpec::new().gammaness(1.0).check_cuts().is_err());
        assert!(CutSpec::new().alpha(-0.1).check_cuts().is_err());
        assert!(CutSpec::new().zenith(-5.0, 90.0).check_cuts().is_err());
        assert!(CutSpec::new().zenith(0.0, 90.0).check_cuts().is_ok());
        assert!(CutSpec::new().zenith(60.0, 20.0).check_cuts().is_err());
        assert!(CutSpec::new().theta2(f64::NAN).check_cuts().is_err());
    }

    #[test]
    fn test_check_cuts_names_offending_value() {
        let err = CutSpec::new()
            .gammaness(vec![0.5, 1.2])
            .check_cuts()
            .unwrap_err();
        match err {
            PulseFitError::InvalidCut { cut, value, .. } => {
                assert_eq!(cut, "gammaness_cut");
                assert_eq!(value, "1.2");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_structure_requires_matching_binning() {
        let spec = CutSpec::new().theta2(vec![0.1, 0.2]);
        assert!(spec.check_structure().is_err());

        let spec = spec.energy_binning(vec![0.1, 1.0, 10.0]);
        assert!(spec.check_structure().is_ok());

        let spec = CutSpec::new()
            .theta2(vec![0.1, 0.2])
            .energy_binning(vec![0.1, 1.0]);
        assert!(spec.check_structure().is_err());

        let spec = CutSpec::new().energy_binning(vec![1.0, 1.0]);
        assert!(spec.check_structure().is_err());
    }

    #[test]
    fn test_deserialize_scalar_and_list() {
        let json = r#"{
            "gammaness_cut": [0.5, 0.7],
            "alpha_cut": 8.0,
            "zenith_cut": [0.0, 45.0],
            "energy_binning": [0.02, 0.2, 2.0]
        }"#;
        let spec: CutSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.gammaness_cut, Some(CutValue::PerBin(vec![0.5, 0.7])));
        assert_eq!(spec.alpha_cut, Some(CutValue::Scalar(8.0)));
        assert_eq!(spec.zenith_cut, Some((0.0, 45.0)));
        assert_eq!(spec.n_energy_bins(), Some(2));
        assert!(spec.theta2_cut.is_none());
    }
}
