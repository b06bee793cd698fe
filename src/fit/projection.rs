//! Projection of a fitted curve over a year range.
//!
//! Years are sampled evenly from the first observed year through the horizon
//! and converted to integers by truncation, so short ranges may repeat a year.
//! Values come from the clamped logistic and are finite for finite parameters.

use crate::domain::{LogisticFit, LogisticParams, Projection, ProjectionConfig, ProjectionPoint};
use crate::math::evaluate;

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Sampled projection years from `start_year` through `horizon_year`.
pub fn projection_years(start_year: i32, horizon_year: i32, sample_count: usize) -> Vec<i32> {
    linspace(start_year as f64, horizon_year as f64, sample_count)
        .into_iter()
        .map(|y| y.trunc() as i32)
        .collect()
}

/// Evaluate `params` at each year.
pub fn project(params: &LogisticParams, years: &[i32]) -> Vec<ProjectionPoint> {
    years
        .iter()
        .map(|&year| ProjectionPoint {
            year,
            value: evaluate(year as f64, params),
        })
        .collect()
}

/// Build the full projection for an entity from its fit and first observed year.
pub fn build_projection(
    entity: &str,
    fit: &LogisticFit,
    start_year: i32,
    config: &ProjectionConfig,
) -> Projection {
    let years = projection_years(start_year, config.horizon_year, config.sample_count);
    Projection {
        entity: entity.to_string(),
        params: fit.params,
        quality: fit.quality.clone(),
        points: project(&fit.params, &years),
    }
}
