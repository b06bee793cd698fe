//! Read-only access to annual emissions tables.
//!
//! The projection pipeline only sees the `EmissionSource` trait. Tables are
//! loaded once (from CSV or the demo generator) and never mutated afterwards.

use std::collections::HashMap;

use crate::domain::{EmissionRecord, Observation, TimeSeries};

/// Immutable data-access interface injected into the projection pipeline.
pub trait EmissionSource {
    /// Distinct entity names, in first-seen order.
    fn entities(&self) -> Vec<String>;

    /// All observations for `entity` in source order (`None` if unknown).
    fn series(&self, entity: &str) -> Option<TimeSeries>;

    /// Human-readable label of the value column (e.g. `Annual CO₂ emissions`).
    fn value_label(&self) -> &str;
}

/// In-memory annual table.
#[derive(Debug, Clone)]
pub struct EmissionTable {
    value_label: String,
    entities: Vec<String>,
    rows: HashMap<String, Vec<Observation>>,
}

impl EmissionTable {
    pub fn new(value_label: impl Into<String>, records: Vec<EmissionRecord>) -> Self {
        let mut entities = Vec::new();
        let mut rows: HashMap<String, Vec<Observation>> = HashMap::new();
        for r in records {
            let bucket = rows.entry(r.entity.clone()).or_insert_with(|| {
                entities.push(r.entity.clone());
                Vec::new()
            });
            bucket.push(Observation {
                year: r.year,
                value: r.value,
            });
        }
        Self {
            value_label: value_label.into(),
            entities,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observations of the given entities, each in source order.
    pub fn select(&self, entities: &[String]) -> Vec<TimeSeries> {
        entities.iter().filter_map(|e| self.series(e)).collect()
    }

    /// Inclusive `(min, max)` year over the whole table.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let years = self.rows.values().flatten().map(|o| o.year);
        let min = years.clone().min()?;
        let max = years.max()?;
        Some((min, max))
    }
}

impl EmissionSource for EmissionTable {
    fn entities(&self) -> Vec<String> {
        self.entities.clone()
    }

    fn series(&self, entity: &str) -> Option<TimeSeries> {
        self.rows
            .get(entity)
            .map(|points| TimeSeries::new(entity, points.clone()))
    }

    fn value_label(&self) -> &str {
        &self.value_label
    }
}

/// Resolve the entity selection: explicit names if given, else the first `n`.
pub fn default_selection(source: &dyn EmissionSource, requested: &[String], n: usize) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    source.entities().into_iter().take(n).collect()
}
