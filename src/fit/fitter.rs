//! Logistic fit for a single entity.
//!
//! Given a time series of `(year, emissions)` observations we:
//! - check the minimum-size precondition
//! - build the initial guess `(max(y), median(years), 1, min(y))`
//! - run Levenberg–Marquardt with the configured evaluation budget
//! - return parameters plus fit diagnostics
//!
//! The initial guess matters: with `k₀ = 1` the starting curve is a sharp step
//! at the median year, and for monotonically increasing emissions series the
//! optimizer reliably relaxes it into a slow S-curve from there.

use crate::domain::{FitQuality, LogisticFit, LogisticParams, ProjectionConfig, TimeSeries};
use crate::error::FitError;
use crate::fit::levenberg::{SolverOptions, levenberg_marquardt};
use crate::math::median;

/// Initial parameter guess for a series.
///
/// Returns `None` if the series has no finite values.
pub fn initial_guess(series: &TimeSeries) -> Option<LogisticParams> {
    let years = series.years();
    let values = series.values();

    let l0 = values.iter().copied().filter(|v| v.is_finite()).reduce(f64::max)?;
    let b0 = values.iter().copied().filter(|v| v.is_finite()).reduce(f64::min)?;
    let x00 = median(&years)?;

    Some(LogisticParams::new(l0, x00, 1.0, b0))
}

/// Fit a logistic curve to `series`.
pub fn fit_logistic(series: &TimeSeries, config: &ProjectionConfig) -> Result<LogisticFit, FitError> {
    let n = series.len();
    if n < config.min_points {
        return Err(FitError::InsufficientData {
            n,
            min: config.min_points,
        });
    }

    let years = series.years();
    let values = series.values();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite("observed values"));
    }

    // Identical values leave x0 and k unidentifiable (the best fit is L = 0),
    // which surfaces downstream as a singular covariance.
    let first = values[0];
    if values.iter().all(|&v| v == first) {
        return Err(FitError::Degenerate { n, value: first });
    }

    let guess = initial_guess(series).ok_or(FitError::NonFinite("observed values"))?;
    let opts = SolverOptions::with_budget(config.max_evaluations);
    let report = levenberg_marquardt(&years, &values, guess.to_array(), &opts)?;

    let params = LogisticParams::from_slice(&report.params);
    if !params.is_finite() || !report.sse.is_finite() {
        return Err(FitError::NonFinite("fitted parameters"));
    }

    tracing::debug!(
        entity = %series.entity,
        n,
        evaluations = report.evaluations,
        iterations = report.iterations,
        termination = ?report.termination,
        sse = report.sse,
        "logistic fit converged"
    );

    Ok(LogisticFit {
        params,
        quality: FitQuality {
            sse: report.sse,
            rmse: (report.sse / n as f64).sqrt(),
            n,
            evaluations: report.evaluations,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::evaluate;

    fn exact_series() -> TimeSeries {
        let truth = LogisticParams::new(100.0, 2035.0, 0.1, 5.0);
        let pairs: Vec<(i32, f64)> = (0..10)
            .map(|i| {
                let year = 2000 + 10 * i;
                (year, evaluate(year as f64, &truth))
            })
            .collect();
        TimeSeries::from_pairs("Synthetic", &pairs)
    }

    fn world_2013_2023() -> TimeSeries {
        let values = [35.3, 35.6, 35.5, 35.5, 36.0, 36.8, 36.7, 34.8, 36.4, 37.1, 37.8];
        let pairs: Vec<(i32, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (2013 + i as i32, v * 1e9))
            .collect();
        TimeSeries::from_pairs("World", &pairs)
    }

    fn rel_err(a: f64, b: f64) -> f64 {
        ((a - b) / b).abs()
    }

    #[test]
    fn initial_guess_follows_heuristic() {
        let s = TimeSeries::from_pairs("X", &[(2000, 3.0), (2003, 1.0), (2001, 7.0), (2010, 2.0)]);
        let g = initial_guess(&s).unwrap();
        assert_eq!(g, LogisticParams::new(7.0, 2002.0, 1.0, 1.0));
    }

    #[test]
    fn recovers_generating_parameters() {
        let fit = fit_logistic(&exact_series(), &ProjectionConfig::default()).unwrap();
        let p = fit.params;
        assert!(rel_err(p.l, 100.0) < 0.01, "{p:?}");
        assert!(rel_err(p.x0, 2035.0) < 0.01, "{p:?}");
        assert!(rel_err(p.k, 0.1) < 0.01, "{p:?}");
        assert!(rel_err(p.b, 5.0) < 0.01, "{p:?}");
        assert!(fit.quality.rmse < 1e-6);
        assert!(fit.quality.evaluations <= 10_000);
    }

    #[test]
    fn short_series_is_insufficient() {
        let s = TimeSeries::from_pairs("Tiny", &[(2000, 1.0), (2001, 2.0), (2002, 3.0), (2003, 4.0), (2004, 5.0)]);
        let err = fit_logistic(&s, &ProjectionConfig::default()).unwrap_err();
        assert_eq!(err, FitError::InsufficientData { n: 5, min: 6 });
    }

    #[test]
    fn constant_series_is_singular() {
        let pairs: Vec<(i32, f64)> = (2000..2006).map(|y| (y, 42.0)).collect();
        let s = TimeSeries::from_pairs("Flat", &pairs);
        let err = fit_logistic(&s, &ProjectionConfig::default()).unwrap_err();
        assert!(matches!(err, FitError::Degenerate { n: 6, .. }));
        assert!(err.to_string().starts_with("Singular matrix"));
    }

    #[test]
    fn world_series_converges() {
        let fit = fit_logistic(&world_2013_2023(), &ProjectionConfig::default()).unwrap();
        assert!(fit.params.is_finite());
        assert!(fit.quality.rmse < 1e9, "{:?}", fit.quality);
    }

    #[test]
    fn world_projection_for_2050_sits_between_latest_value_and_plateau() {
        let series = world_2013_2023();
        let config = ProjectionConfig::default();
        let fit = fit_logistic(&series, &config).unwrap();
        let projection = crate::fit::build_projection("World", &fit, 2013, &config);

        let latest = series.latest().unwrap().value;
        let v2050 = projection.value_at(2050).unwrap();
        assert!(v2050 > latest, "{v2050} <= {latest}");
        assert!(v2050 <= fit.params.upper_asymptote() * (1.0 + 1e-12), "{v2050} > {:?}", fit.params);
    }
}
