//! # Unbinned Likelihood
//!
//! The cost function and minimizer behind unbinned peak fits: a
//! window-normalized negative log-likelihood ([`UnbinnedNll`]) and a damped
//! Newton minimizer ([`NewtonMinimizer`]) whose final Hessian gives the
//! parameter covariance.

pub mod newton;
pub mod nll;

pub use newton::{NewtonConfig, NewtonMinimizer, NewtonResult};
pub use nll::UnbinnedNll;
