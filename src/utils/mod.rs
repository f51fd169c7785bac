//! Numerical helpers shared by the optimizers.

pub mod finite_difference;
pub mod linalg;

pub use finite_difference::{gradient, hessian, jacobian};
pub use linalg::{invert_symmetric, solve_positive_definite, solve_symmetric};
