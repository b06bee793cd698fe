//! Four-parameter logistic curve.
//!
//! `y(x) = L / (1 + exp(-k (x - x0))) + b`
//!
//! Numerical notes:
//! - The exponent argument `-k (x - x0)` is clamped to `±EXP_ARG_LIMIT` so that
//!   `exp` never overflows. Poorly-fit parameters (huge `k`, far-away `x0`) then
//!   saturate at the asymptotes instead of producing `inf`/`NaN`.
//! - Partial derivatives are written in terms of the sigmoid `s` and `s (1 - s)`,
//!   which stay bounded in `[0, 1]` and `[0, 1/4]`.

use crate::domain::LogisticParams;

/// Largest magnitude allowed for the exponent argument (`exp(709)` is the f64 limit).
pub const EXP_ARG_LIMIT: f64 = 700.0;

/// Sigmoid part `1 / (1 + exp(-k (x - x0)))`, in `[0, 1]`.
pub fn sigmoid(x: f64, x0: f64, k: f64) -> f64 {
    let arg = -k * (x - x0);
    let arg = if arg.is_nan() {
        0.0
    } else {
        arg.clamp(-EXP_ARG_LIMIT, EXP_ARG_LIMIT)
    };
    1.0 / (1.0 + arg.exp())
}

/// Evaluate the logistic curve at `x`.
pub fn logistic(x: f64, l: f64, x0: f64, k: f64, b: f64) -> f64 {
    l * sigmoid(x, x0, k) + b
}

/// Evaluate the logistic curve at `x` for a parameter set.
pub fn evaluate(x: f64, params: &LogisticParams) -> f64 {
    logistic(x, params.l, params.x0, params.k, params.b)
}

/// Partial derivatives `[∂y/∂L, ∂y/∂x0, ∂y/∂k, ∂y/∂b]` at `x`.
pub fn gradient(x: f64, p: &[f64; 4]) -> [f64; 4] {
    let [l, x0, k, _] = *p;
    let s = sigmoid(x, x0, k);
    let ds = s * (1.0 - s);
    [s, -l * k * ds, l * (x - x0) * ds, 1.0]
}

/// Median of `values` (mean of the middle two for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> LogisticParams {
        LogisticParams::new(100.0, 2035.0, 0.1, 5.0)
    }

    #[test]
    fn midpoint_is_half_height() {
        let y = evaluate(2035.0, &params());
        assert!((y - 55.0).abs() < 1e-12);
    }

    #[test]
    fn monotonic_in_sign_of_k() {
        let xs: Vec<f64> = (1900..=2200).step_by(5).map(|y| y as f64).collect();
        for (k, dir) in [(0.1, 1.0), (-0.1, -1.0)] {
            let ys: Vec<f64> = xs.iter().map(|&x| logistic(x, 100.0, 2035.0, k, 5.0)).collect();
            for w in ys.windows(2) {
                assert!(dir * (w[1] - w[0]) >= 0.0, "k={k}: {} -> {}", w[0], w[1]);
            }
        }
        let flat: Vec<f64> = xs.iter().map(|&x| logistic(x, 100.0, 2035.0, 0.0, 5.0)).collect();
        assert!(flat.iter().all(|&y| (y - 55.0).abs() < 1e-12));
    }

    #[test]
    fn asymptotes_for_large_finite_x() {
        let p = params();
        assert!((evaluate(1e6, &p) - p.upper_asymptote()).abs() < 1e-9);
        assert!((evaluate(-1e6, &p) - p.lower_asymptote()).abs() < 1e-9);
    }

    #[test]
    fn extreme_parameters_stay_finite() {
        for &(k, x0) in &[(1e6, 2000.0), (-1e6, 2000.0), (50.0, -1e9), (f64::MAX, 0.0)] {
            for x in [1900.0, 2023.0, 2200.0] {
                let y = logistic(x, 1e10, x0, k, 1.0);
                assert!(y.is_finite(), "k={k} x0={x0} x={x} -> {y}");
            }
        }
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let p = [100.0, 2035.0, 0.1, 5.0];
        let x = 2030.0;
        let g = gradient(x, &p);
        for i in 0..4 {
            let h = 1e-6 * p[i].abs().max(1.0);
            let mut hi = p;
            let mut lo = p;
            hi[i] += h;
            lo[i] -= h;
            let fd = (logistic(x, hi[0], hi[1], hi[2], hi[3]) - logistic(x, lo[0], lo[1], lo[2], lo[3])) / (2.0 * h);
            assert!((fd - g[i]).abs() < 1e-5 * fd.abs().max(1.0), "param {i}: fd={fd} g={}", g[i]);
        }
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
