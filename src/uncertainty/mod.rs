//! # Uncertainty Calculation
//!
//! Parameter uncertainties for fitted peak models:
//!
//! - Covariance from the residual Jacobian of a binned least-squares fit
//! - Covariance from the negative log-likelihood Hessian of an unbinned fit
//! - Standard errors and correlation coefficients from a covariance matrix

mod covariance;

pub use covariance::{
    correlation, covariance_from_hessian, covariance_from_jacobian, standard_errors,
};

use ndarray::Array2;

/// Covariance of the free parameters and what is derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyResult {
    /// Covariance matrix for the free parameters
    pub covariance: Array2<f64>,
    /// Standard error of each free parameter
    pub standard_errors: Vec<f64>,
    /// Correlation matrix for the free parameters
    pub correlation: Array2<f64>,
}

impl UncertaintyResult {
    pub fn from_covariance(covariance: Array2<f64>) -> Self {
        let standard_errors = standard_errors(&covariance).to_vec();
        let correlation = correlation(&covariance);
        Self {
            covariance,
            standard_errors,
            correlation,
        }
    }
}
