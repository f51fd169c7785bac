//! # Parameter System
//!
//! Named model parameters with an explicit fitting state. Each parameter is
//! either [`ParamState::Free`] or [`ParamState::FixedAt`] a value, and both
//! fitting modes go through [`ParameterSet`] to build the optimizer's free
//! vector and to reinsert fixed values afterwards.
//!
//! ```rust
//! use pulsefit_rs::models::ParamRole;
//! use pulsefit_rs::parameters::{Parameter, ParameterSet};
//!
//! let mut params = ParameterSet::new();
//! params.push(Parameter::free("mu", 0.3, ParamRole::Location(0))).unwrap();
//! params.push(Parameter::fixed("A", 10.0, ParamRole::Background)).unwrap();
//!
//! assert_eq!(params.free_values().to_vec(), vec![0.3]);
//! assert_eq!(params.expand(&[0.31]).unwrap(), vec![0.31, 10.0]);
//! ```

pub mod parameter;
pub mod parameters;

pub use parameter::{ParamState, Parameter};
pub use parameters::ParameterSet;
