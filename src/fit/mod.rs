//! Logistic projection engine.
//!
//! Responsibilities:
//!
//! - solve the nonlinear least-squares problem (`levenberg`)
//! - fit one entity's series with the initial-guess policy (`fitter`)
//! - evaluate a fitted curve over the projection years (`projection`)

pub mod fitter;
pub mod levenberg;
pub mod projection;

pub use fitter::*;
pub use levenberg::*;
pub use projection::*;
