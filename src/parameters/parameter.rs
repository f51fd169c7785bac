//! Parameter definition and implementation
//!
//! A [`Parameter`] is one named model parameter together with its fitting
//! state: it either floats during optimization or is pinned to a value.

use serde::{Deserialize, Serialize};

use crate::models::ParamRole;

/// Whether a parameter floats or is held constant during a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamState {
    /// Varied by the optimizer.
    Free,
    /// Held at the given value; reported with zero error.
    FixedAt(f64),
}

impl ParamState {
    /// Returns true if the parameter is varied.
    pub fn is_free(&self) -> bool {
        matches!(self, ParamState::Free)
    }
}

/// A parameter for optimization problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    pub name: String,

    /// Starting value for free parameters, pinned value for fixed ones
    value: f64,

    /// Free or fixed
    state: ParamState,

    /// What the parameter controls in its model
    pub role: ParamRole,
}

impl Parameter {
    /// Create a free parameter with the given starting value.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulsefit_rs::models::ParamRole;
    /// use pulsefit_rs::parameters::Parameter;
    ///
    /// let param = Parameter::free("mu", 0.3, ParamRole::Location(0));
    /// assert_eq!(param.name(), "mu");
    /// assert_eq!(param.value(), 0.3);
    /// assert!(param.state().is_free());
    /// ```
    pub fn free(name: &str, value: f64, role: ParamRole) -> Self {
        Self {
            name: name.to_string(),
            value,
            state: ParamState::Free,
            role,
        }
    }

    /// Create a parameter held at `value`.
    pub fn fixed(name: &str, value: f64, role: ParamRole) -> Self {
        Self {
            name: name.to_string(),
            value,
            state: ParamState::FixedAt(value),
            role,
        }
    }

    /// Get the name of the parameter
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value: the starting value when free, the pinned value when fixed.
    pub fn value(&self) -> f64 {
        match self.state {
            ParamState::Free => self.value,
            ParamState::FixedAt(v) => v,
        }
    }

    /// Set the starting value. Fixed parameters are re-pinned at the new value.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        if let ParamState::FixedAt(_) = self.state {
            self.state = ParamState::FixedAt(value);
        }
    }

    pub fn state(&self) -> ParamState {
        self.state
    }

    /// Pin the parameter at its current value.
    pub fn fix(&mut self) {
        self.state = ParamState::FixedAt(self.value);
    }

    /// Let the parameter float from its current value.
    pub fn release(&mut self) {
        self.value = self.value();
        self.state = ParamState::Free;
    }
}
