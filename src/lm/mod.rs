//! Levenberg-Marquardt algorithm implementation.
//!
//! Weighted least-squares minimizer used by binned phaseogram fits.

pub mod algorithm;
pub mod config;
pub mod convergence;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::ConvergenceStatus;
