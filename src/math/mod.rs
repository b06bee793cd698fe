//! Mathematical utilities: the logistic curve and the damped least-squares step.

pub mod logistic;
pub mod ols;

pub use logistic::*;
pub use ols::*;
