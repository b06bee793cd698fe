//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - projection CSV export (`export`)
//! - projection JSON read/write (`projection_file`)

pub mod export;
pub mod ingest;
pub mod projection_file;

pub use export::*;
pub use ingest::*;
pub use projection_file::*;
