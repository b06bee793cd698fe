//! Deterministic synthetic emissions data for `--demo` runs.
//!
//! Each region follows a logistic trajectory with multiplicative Gaussian noise.
//! The RNG is seeded, so the same seed always yields the same tables.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::data::sectors::{SectorRecord, SectorTable};
use crate::data::source::{EmissionSource, EmissionTable};
use crate::domain::{EmissionRecord, LogisticParams, SECTOR_COLUMNS};
use crate::error::AppError;
use crate::math::evaluate;

pub const DEMO_VALUE_LABEL: &str = "Annual CO₂ emissions";

/// First and last year of the demo tables.
pub const DEMO_YEARS: (i32, i32) = (1950, 2023);

/// Relative noise (std dev) applied to each demo observation.
const NOISE_REL: f64 = 0.02;

/// Demo regions: `(name, L, x0, k, b)` in tonnes.
const REGIONS: [(&str, f64, f64, f64, f64); 7] = [
    ("World", 36.0e9, 1990.0, 0.06, 4.0e9),
    ("Asia", 24.0e9, 2005.0, 0.09, 1.0e9),
    ("Europe", 5.0e9, 1960.0, 0.08, 1.5e9),
    ("North America", 5.5e9, 1965.0, 0.07, 1.0e9),
    ("Africa", 1.6e9, 2010.0, 0.05, 0.1e9),
    ("South America", 1.3e9, 2000.0, 0.06, 0.1e9),
    ("Oceania", 0.5e9, 1990.0, 0.07, 0.05e9),
];

/// Sector split used for the demo sector table (sums to 1).
const SECTOR_WEIGHTS: [f64; 9] = [0.06, 0.06, 0.08, 0.03, 0.17, 0.12, 0.05, 0.40, 0.03];

/// Generate the demo annual emissions table.
pub fn demo_emissions(seed: u64) -> Result<EmissionTable, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE_REL)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut records = Vec::new();
    for (name, l, x0, k, b) in REGIONS {
        let params = LogisticParams::new(l, x0, k, b);
        for year in DEMO_YEARS.0..=DEMO_YEARS.1 {
            let level = evaluate(year as f64, &params);
            let factor = (1.0 + noise.sample(&mut rng)).max(0.5);
            records.push(EmissionRecord {
                entity: name.to_string(),
                year,
                value: level * factor,
            });
        }
    }

    Ok(EmissionTable::new(DEMO_VALUE_LABEL, records))
}

/// Generate a demo sector table consistent with `demo_emissions`.
pub fn demo_sectors(seed: u64) -> Result<SectorTable, AppError> {
    let emissions = demo_emissions(seed)?;
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let jitter = Normal::<f64>::new(0.0, 0.1)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut records = Vec::new();
    for (name, ..) in REGIONS {
        let Some(series) = emissions.series(name) else {
            continue;
        };
        for obs in series.points {
            let mut values = [None; SECTOR_COLUMNS.len()];
            for (slot, w) in values.iter_mut().zip(SECTOR_WEIGHTS) {
                let scale = (1.0_f64 + jitter.sample(&mut rng)).max(0.0);
                *slot = Some(obs.value * w * scale);
            }
            records.push(SectorRecord {
                entity: name.to_string(),
                year: obs.year,
                values,
            });
        }
    }

    Ok(SectorTable {
        records,
        present: [true; SECTOR_COLUMNS.len()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_deterministic() {
        let a = demo_emissions(7).unwrap();
        let b = demo_emissions(7).unwrap();
        assert_eq!(a.series("World"), b.series("World"));
        assert_ne!(a.series("World"), demo_emissions(8).unwrap().series("World"));
    }

    #[test]
    fn demo_covers_all_regions_and_years() {
        let t = demo_emissions(1).unwrap();
        assert_eq!(t.entities().len(), REGIONS.len());
        assert_eq!(t.year_range(), Some(DEMO_YEARS));
        let world = t.series("World").unwrap();
        assert!(world.values().iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn demo_sectors_have_every_column() {
        let s = demo_sectors(1).unwrap();
        let shares = s.breakdown("Europe", 2000).unwrap();
        assert!(!shares.is_empty());
        assert!(shares.iter().all(|sh| sh.value > 0.0));
    }

    #[test]
    fn sector_weights_sum_to_one() {
        let total: f64 = SECTOR_WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
