//! Fit outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::fitting::{FitMode, PeakSelection};
use crate::models::{ParamRole, PeakModel};

/// Whether the optimizer reached a minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitStatus {
    Converged,
    Failed { reason: String },
}

impl FitStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, FitStatus::Converged)
    }
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitStatus::Converged => f.write_str("converged"),
            FitStatus::Failed { reason } => write!(f, "failed ({})", reason),
        }
    }
}

/// Non-finite floats are written as `null` and read back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// One fitted parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub name: String,
    #[serde(with = "nan_as_null")]
    pub value: f64,
    /// Standard error; zero for fixed parameters, NaN when unavailable.
    #[serde(with = "nan_as_null")]
    pub error: f64,
    pub role: ParamRole,
    pub fixed: bool,
}

/// Fitted parameters of one model, in canonical order.
///
/// Locations are expressed on the shifted phase axis the fit ran on, which
/// covers `[phase_shift, phase_shift + 1)`. Use [`FitResult::folded`] to map
/// them back into `[0, 1)`. Widths are always reported non-negative.
///
/// Missing numbers (errors without a covariance, the cost of a fit that
/// never ran) are NaN and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: PeakModel,
    pub mode: FitMode,
    pub peak: PeakSelection,
    pub parameters: Vec<ParameterEstimate>,
    #[serde(flatten)]
    pub status: FitStatus,
    /// Phase boundary below which phases were moved up by one rotation.
    pub phase_shift: f64,
    /// Chi-square for binned fits, negative log-likelihood for unbinned fits.
    #[serde(with = "nan_as_null")]
    pub cost: f64,
    pub iterations: usize,
    /// Covariance of the free parameters, in canonical order.
    pub covariance: Option<Vec<Vec<f64>>>,
    pub correlation: Option<Vec<Vec<f64>>>,
}

impl FitResult {
    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterEstimate> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| p.value)
    }

    pub fn error(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| p.error)
    }

    /// Parameter value with locations folded into [0, 1).
    pub fn folded(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| match p.role {
            ParamRole::Location(_) => p.value.rem_euclid(1.0),
            _ => p.value,
        })
    }

    /// `(name, value, error)` triples in canonical order.
    pub fn triples(&self) -> Vec<(String, f64, f64)> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value, p.error))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} fit of '{}' (peak {}): {}",
            self.mode, self.model, self.peak, self.status
        )?;
        writeln!(
            f,
            "phase shift {:.4}, cost {:.6e}, {} iterations",
            self.phase_shift, self.cost, self.iterations
        )?;
        writeln!(f, "{:<10} {:>15} {:>15}", "Name", "Value", "Error")?;
        for p in &self.parameters {
            write!(f, "{:<10} {:>15.6e} {:>15.6e}", p.name, p.value, p.error)?;
            if p.fixed {
                write!(f, "  (fixed)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
