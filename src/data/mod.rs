//! Data access: the read-only source trait, sector tables, dataset paths and
//! the synthetic demo dataset.

pub mod paths;
pub mod sample;
pub mod sectors;
pub mod source;

pub use paths::DataPaths;
pub use sample::{demo_emissions, demo_sectors};
pub use sectors::{SectorRecord, SectorShare, SectorTable};
pub use source::{EmissionSource, EmissionTable, default_selection};
