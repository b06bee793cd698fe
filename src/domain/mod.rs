//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observed data (`EmissionRecord`, `TimeSeries`)
//! - fit outputs (`LogisticParams`, `LogisticFit`, `Projection`)
//! - per-entity outcomes (`FitWarning`, `Notice`) and run configuration

pub mod types;

pub use types::*;
