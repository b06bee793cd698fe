//! Shared projection pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! selection -> per-entity fit -> projection sampling -> warnings/notices
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Entities are processed sequentially and independently: a failed fit for one
//! entity never affects another.

use crate::data::EmissionSource;
use crate::domain::{FitWarning, Notice, Projection, ProjectionConfig, TimeSeries};
use crate::error::FitError;
use crate::fit::{build_projection, fit_logistic};

/// All computed outputs of a single projection run.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRun {
    /// Successful projections, in selection order.
    pub projections: Vec<Projection>,
    /// Entities whose fit failed.
    pub warnings: Vec<FitWarning>,
    /// Informational messages (short series, unknown entities).
    pub notices: Vec<Notice>,
}

impl ProjectionRun {
    pub fn projection(&self, entity: &str) -> Option<&Projection> {
        self.projections.iter().find(|p| p.entity == entity)
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty() && self.warnings.is_empty() && self.notices.is_empty()
    }
}

/// Outcome of fitting a single entity.
#[derive(Debug, Clone)]
pub enum EntityOutcome {
    Projected(Projection),
    Failed(FitWarning),
    Skipped(Notice),
}

/// Fit and project every selected entity.
pub fn project_entities(
    source: &dyn EmissionSource,
    entities: &[String],
    config: &ProjectionConfig,
) -> ProjectionRun {
    let mut run = ProjectionRun::default();

    for entity in entities {
        let outcome = match source.series(entity) {
            Some(series) => project_series(&series, config),
            None => EntityOutcome::Skipped(Notice {
                entity: entity.clone(),
                message: format!("No data for {entity}"),
            }),
        };

        match outcome {
            EntityOutcome::Projected(p) => run.projections.push(p),
            EntityOutcome::Failed(w) => run.warnings.push(w),
            EntityOutcome::Skipped(n) => run.notices.push(n),
        }
    }

    tracing::debug!(
        selected = entities.len(),
        projected = run.projections.len(),
        warnings = run.warnings.len(),
        notices = run.notices.len(),
        "projection run finished"
    );
    run
}

/// Fit one series and turn the result into an outcome.
pub fn project_series(series: &TimeSeries, config: &ProjectionConfig) -> EntityOutcome {
    let entity = series.entity.clone();
    let Some(start_year) = series.min_year() else {
        return EntityOutcome::Skipped(Notice {
            message: format!("No data for {entity}"),
            entity,
        });
    };

    match fit_logistic(series, config) {
        Ok(fit) => EntityOutcome::Projected(build_projection(&entity, &fit, start_year, config)),
        Err(FitError::InsufficientData { n, min }) => {
            tracing::info!(entity = %entity, n, min, "series too short to fit");
            EntityOutcome::Skipped(Notice {
                message: format!("Not enough data points for {entity} ({n} < {min}); skipping fit."),
                entity,
            })
        }
        Err(e) => {
            let warning = FitWarning {
                entity,
                reason: e.to_string(),
            };
            tracing::warn!("{}", warning.message());
            EntityOutcome::Failed(warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EmissionTable;
    use crate::domain::EmissionRecord;
    use crate::math::logistic;

    fn records(entity: &str, pairs: impl IntoIterator<Item = (i32, f64)>) -> Vec<EmissionRecord> {
        pairs
            .into_iter()
            .map(|(year, value)| EmissionRecord {
                entity: entity.to_string(),
                year,
                value,
            })
            .collect()
    }

    fn table() -> EmissionTable {
        let mut rows = records(
            "Good",
            (2000..=2090).step_by(10).map(|y| (y, logistic(y as f64, 100.0, 2035.0, 0.1, 5.0))),
        );
        rows.extend(records("Flat", (2000..2010).map(|y| (y, 42.0))));
        rows.extend(records("Short", [(2020, 1.0), (2021, 2.0), (2022, 3.0)]));
        EmissionTable::new("Annual CO₂ emissions", rows)
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn failures_are_isolated_per_entity() {
        let run = project_entities(&table(), &names(&["Flat", "Good", "Short"]), &ProjectionConfig::default());

        assert_eq!(run.projections.len(), 1);
        let good = run.projection("Good").unwrap();
        assert_eq!(good.points.len(), 100);
        assert_eq!(good.points[0].year, 2000);
        assert_eq!(good.points[99].year, 2100);
        assert!((good.params.l - 100.0).abs() < 1.0);

        assert_eq!(run.warnings.len(), 1);
        assert_eq!(run.warnings[0].entity, "Flat");
        assert!(run.warnings[0].message().starts_with("Could not fit logistic regression for Flat: "));

        assert_eq!(run.notices.len(), 1);
        assert_eq!(run.notices[0].entity, "Short");
    }

    #[test]
    fn order_does_not_change_results() {
        let cfg = ProjectionConfig::default();
        let a = project_entities(&table(), &names(&["Good", "Flat"]), &cfg);
        let b = project_entities(&table(), &names(&["Flat", "Good"]), &cfg);
        assert_eq!(a.projections[0].params, b.projections[0].params);
        assert_eq!(a.projections[0].points, b.projections[0].points);
    }

    #[test]
    fn unknown_entity_is_a_notice() {
        let run = project_entities(&table(), &names(&["Atlantis"]), &ProjectionConfig::default());
        assert!(run.projections.is_empty() && run.warnings.is_empty());
        assert_eq!(run.notices[0].message, "No data for Atlantis");
    }

    #[test]
    fn empty_selection_is_empty_run() {
        let run = project_entities(&table(), &[], &ProjectionConfig::default());
        assert!(run.is_empty());
    }

    #[test]
    fn budget_exhaustion_is_a_warning() {
        let cfg = ProjectionConfig {
            max_evaluations: 2,
            ..ProjectionConfig::default()
        };
        let run = project_entities(&table(), &names(&["Good"]), &cfg);
        assert!(run.projections.is_empty());
        assert!(run.warnings[0].reason.contains("maxfev = 2"));
    }
}
