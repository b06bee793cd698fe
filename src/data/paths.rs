//! Dataset locations, configured through the environment.
//!
//! `CO2_DATA_DIR` (also read from a `.env` file) points at the directory holding
//! the four CSV exports the dashboard works with. Explicit `--data` flags win
//! over these defaults.

use std::path::{Path, PathBuf};

/// Environment variable naming the dataset directory.
pub const DATA_DIR_ENV: &str = "CO2_DATA_DIR";

const DEFAULT_DATA_DIR: &str = "data";

pub const ANNUAL_FILE: &str = "WorldContinent-annual-co2-emissions.csv";
pub const AVIATION_FILE: &str = "annual-co-emissions-from-aviation.csv";
pub const SECTORS_FILE: &str = "co-emissions-by-sector.csv";
pub const AIRPORTS_FILE: &str = "modified_busiest_airports_2022.csv";

/// Resolved dataset paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load `.env` (if present) and read `CO2_DATA_DIR`, defaulting to `./data`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(dir)
    }

    pub fn annual(&self) -> PathBuf {
        self.dir.join(ANNUAL_FILE)
    }

    pub fn aviation(&self) -> PathBuf {
        self.dir.join(AVIATION_FILE)
    }

    pub fn sectors(&self) -> PathBuf {
        self.dir.join(SECTORS_FILE)
    }

    pub fn airports(&self) -> PathBuf {
        self.dir.join(AIRPORTS_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
