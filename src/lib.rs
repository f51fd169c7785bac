//! # pulsefit-rs
//!
//! `pulsefit-rs` turns a list of gamma-ray events into a fitted pulse profile:
//! quality cuts on the events, a phase-folded light curve with ON/OFF region
//! statistics, and peak fits with parameter uncertainties.
//!
//! The library provides:
//! - A columnar event table and a cut engine with fixed and energy-dependent cuts
//! - Phaseogram histograms and ON/OFF region statistics
//! - Six peak models (Gaussian, Lorentzian and asymmetric variants)
//! - Binned fits by Levenberg-Marquardt least squares and unbinned fits by
//!   maximum likelihood, both reporting standard errors
//!
//! ## Basic Usage
//!
//! ```rust
//! use pulsefit_rs::fitting::{FitMode, PeakFitter, PeakSelection};
//! use pulsefit_rs::models::PeakModel;
//! use pulsefit_rs::phaseogram::{PhaseRegions, RegionLimits, RegionName};
//! use pulsefit_rs::synthetic::expected_histogram;
//!
//! let truth = [0.3, 0.02, 4.0, 3.0];
//! let histogram = expected_histogram(PeakModel::Gaussian, &truth, 100).unwrap();
//! let limits = RegionLimits::new(vec![0.6, 0.9]).with_peak(RegionName::P1, vec![0.25, 0.35]);
//! let regions = PhaseRegions::from_histogram(&histogram, &limits).unwrap();
//!
//! let mut fitter = PeakFitter::new("gaussian", PeakSelection::P1, FitMode::Binned).unwrap();
//! fitter.estimate_initial_values(&regions, &histogram).unwrap();
//! let result = fitter.fit_binned(&histogram).unwrap();
//! assert!((result.folded("mu").unwrap() - 0.3).abs() < 1e-3);
//! ```

pub mod config;
pub mod cuts;
pub mod error;
pub mod events;
pub mod fitting;
pub mod likelihood;
pub mod lm;
pub mod logging;
pub mod models;
pub mod parameters;
pub mod phaseogram;
pub mod problem;
pub mod synthetic;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use cuts::{CutEngine, CutSpec, CutValue};
pub use error::{PulseFitError, Result};
pub use events::EventTable;
pub use fitting::{FitMode, FitResult, FitStatus, PeakFitter, PeakSelection};
pub use models::{get_model_list, PeakModel};
pub use phaseogram::{Histogram, PhaseRegions, PhaseogramData};
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
