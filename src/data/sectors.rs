//! Emissions-by-sector table and breakdowns.
//!
//! Each row carries an optional value per sector column. The breakdown for one
//! `(entity, year)` keeps only sectors with a present, positive value, which is
//! what a pie chart can draw.

use crate::domain::SECTOR_COLUMNS;
use crate::error::AppError;

/// One `(entity, year)` row of the sector table.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRecord {
    pub entity: String,
    pub year: i32,
    /// Indexed like `SECTOR_COLUMNS`.
    pub values: [Option<f64>; 9],
}

/// In-memory sector table plus which sector columns the source file had.
#[derive(Debug, Clone)]
pub struct SectorTable {
    pub records: Vec<SectorRecord>,
    /// Indexed like `SECTOR_COLUMNS`.
    pub present: [bool; 9],
}

/// One slice of a sector breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorShare {
    pub sector: &'static str,
    pub value: f64,
    /// Fraction of the breakdown total, in `[0, 1]`.
    pub share: f64,
}

impl SectorTable {
    pub fn entities(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.records {
            if !out.contains(&r.entity) {
                out.push(r.entity.clone());
            }
        }
        out
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    fn ensure_columns(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = SECTOR_COLUMNS
            .iter()
            .zip(self.present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::new(2, format!("Missing columns: {missing:?}")));
        }
        Ok(())
    }

    /// Positive sector values for `(entity, year)` with their shares of the total.
    pub fn breakdown(&self, entity: &str, year: i32) -> Result<Vec<SectorShare>, AppError> {
        let row = self
            .records
            .iter()
            .find(|r| r.entity == entity && r.year == year)
            .ok_or_else(|| AppError::new(3, format!("No data available for {entity} in {year}")))?;
        self.ensure_columns()?;

        let kept: Vec<(&'static str, f64)> = SECTOR_COLUMNS
            .iter()
            .zip(row.values)
            .filter_map(|(name, v)| match v {
                Some(v) if v.is_finite() && v > 0.0 => Some((*name, v)),
                _ => None,
            })
            .collect();

        let total: f64 = kept.iter().map(|(_, v)| v).sum();
        Ok(kept
            .into_iter()
            .map(|(sector, value)| SectorShare {
                sector,
                value,
                share: if total > 0.0 { value / total } else { 0.0 },
            })
            .collect())
    }

    /// Per-sector `(year, value)` history for an entity.
    pub fn history(&self, entity: &str) -> Result<Vec<(&'static str, Vec<(i32, f64)>)>, AppError> {
        let mut rows: Vec<&SectorRecord> = self.records.iter().filter(|r| r.entity == entity).collect();
        if rows.is_empty() {
            return Err(AppError::new(3, format!("No data available for {entity}")));
        }
        self.ensure_columns()?;
        rows.sort_by_key(|r| r.year);

        let mut out = Vec::new();
        for (idx, name) in SECTOR_COLUMNS.iter().enumerate() {
            let series: Vec<(i32, f64)> = rows
                .iter()
                .filter_map(|r| r.values[idx].map(|v| (r.year, v)))
                .collect();
            out.push((*name, series));
        }
        Ok(out)
    }
}
