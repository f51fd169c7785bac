//! Ordered parameter collections.
//!
//! [`ParameterSet`] keeps a model's parameters in canonical order and is the
//! single place where the optimizer's free vector is built and where fixed
//! values are reinserted into the full parameter vector.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PulseFitError, Result};
use crate::parameters::parameter::Parameter;

/// A collection of parameters in canonical model order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Names must be unique.
    pub fn push(&mut self, param: Parameter) -> Result<()> {
        if self.get(param.name()).is_some() {
            return Err(PulseFitError::InvalidConfig(format!(
                "duplicate parameter '{}'",
                param.name()
            )));
        }
        self.params.push(param);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// All parameter names in canonical order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    /// All current values in canonical order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(Parameter::value).collect()
    }

    /// Names of the free parameters, in canonical order.
    pub fn free_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.state().is_free())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Number of free parameters.
    pub fn free_count(&self) -> usize {
        self.params.iter().filter(|p| p.state().is_free()).count()
    }

    /// Number of fixed parameters.
    pub fn fixed_count(&self) -> usize {
        self.len() - self.free_count()
    }

    /// Starting values of the free parameters, the optimizer's initial vector.
    pub fn free_values(&self) -> Array1<f64> {
        self.params
            .iter()
            .filter(|p| p.state().is_free())
            .map(Parameter::value)
            .collect()
    }

    /// Expand a free vector into the full canonical vector, reinserting
    /// fixed values in place.
    pub fn expand(&self, free: &[f64]) -> Result<Vec<f64>> {
        let mut full = Vec::with_capacity(self.len());
        self.expand_into(free, &mut full)?;
        Ok(full)
    }

    /// Like [`ParameterSet::expand`], reusing `out`'s allocation.
    pub fn expand_into(&self, free: &[f64], out: &mut Vec<f64>) -> Result<()> {
        if free.len() != self.free_count() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "expected {} free values, got {}",
                self.free_count(),
                free.len()
            )));
        }
        out.clear();
        let mut next = free.iter();
        for p in &self.params {
            match p.state() {
                crate::parameters::ParamState::Free => {
                    // Length was checked above.
                    out.push(*next.next().unwrap_or(&f64::NAN));
                }
                crate::parameters::ParamState::FixedAt(v) => out.push(v),
            }
        }
        Ok(())
    }

    /// Spread per-free-parameter quantities (e.g. standard errors) over the
    /// full canonical order, using `fill` for fixed parameters.
    pub fn spread_free(&self, free: &[f64], fill: f64) -> Result<Vec<f64>> {
        if free.len() != self.free_count() {
            return Err(PulseFitError::DimensionMismatch(format!(
                "expected {} free values, got {}",
                self.free_count(),
                free.len()
            )));
        }
        let mut next = free.iter();
        Ok(self
            .params
            .iter()
            .map(|p| {
                if p.state().is_free() {
                    *next.next().unwrap_or(&f64::NAN)
                } else {
                    fill
                }
            })
            .collect())
    }
}
