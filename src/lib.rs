//! `co2-outlook` library crate.
//!
//! The binary (`co2`) is a thin wrapper around this library so that:
//!
//! - the projection engine is testable without spawning processes
//! - data access, reporting and rendering stay reusable
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
