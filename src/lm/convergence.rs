//! Why a minimizer stopped.
//!
//! Shared by the Levenberg-Marquardt solver of binned fits and the damped
//! Newton solver of unbinned fits, so that both report through the same
//! [`FitStatus`](crate::fitting::FitStatus) mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stopping reason of a minimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// An accepted step moved no parameter by more than `xtol` (relative).
    ParameterConvergence,
    /// An accepted step lowered the cost by less than `ftol` (relative).
    FunctionValueConvergence,
    /// Largest gradient component below `gtol`.
    GradientConvergence,
    /// Newton's estimated distance to the minimum below `edm_tol`.
    EdmConvergence,
    MaxIterationsReached,
    /// Singular system or non-finite cost that damping could not get past.
    NumericalError,
    DampingLimitReached,
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            Self::ParameterConvergence
                | Self::FunctionValueConvergence
                | Self::GradientConvergence
                | Self::EdmConvergence
        )
    }
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ParameterConvergence => "converged, parameters stopped moving",
            Self::FunctionValueConvergence => "converged, cost stopped decreasing",
            Self::GradientConvergence => "converged, gradient vanished",
            Self::EdmConvergence => "converged, estimated distance to minimum below tolerance",
            Self::MaxIterationsReached => "iteration limit reached",
            Self::NumericalError => "numerical error",
            Self::DampingLimitReached => "damping limit reached without a better point",
        };
        f.write_str(text)
    }
}
