//! # Event Cuts
//!
//! Quality and selection cuts over [`crate::events::EventTable`]s.
//!
//! Cuts come in two modes. Fixed cuts apply one threshold per variable to
//! every event. Energy-dependent cuts split the table into energy bins and
//! apply a separate threshold per bin. Both keep the table ordered by time.
//!
//! ```rust
//! use pulsefit_rs::cuts::{CutEngine, CutSpec};
//! use pulsefit_rs::events::{Column, EventTable};
//!
//! let mut table = EventTable::new(vec![1.0, 2.0, 3.0], vec![0.1, 0.5, 0.9], vec![0.3, 0.4, 0.5])
//!     .unwrap()
//!     .with_column(Column::Gammaness, vec![0.9, 0.2, 0.8])
//!     .unwrap();
//!
//! let engine = CutEngine::new(CutSpec::new().gammaness(0.5)).unwrap();
//! engine.apply_fixed_cut(&mut table).unwrap();
//! assert_eq!(table.time(), &[1.0, 3.0]);
//! ```

pub mod engine;
pub mod spec;

pub use engine::CutEngine;
pub use spec::{CutSpec, CutValue};
