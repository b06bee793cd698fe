//! Levenberg–Marquardt nonlinear least squares for the logistic curve.
//!
//! We minimize `½ Σ (y(x_i; p) - y_i)²` over `p = (L, x0, k, b)`.
//!
//! Implementation choices:
//! - Marquardt scaling: the damping term uses `D = diag(JᵀJ)`, kept as the running
//!   maximum over iterations. Emissions are ~1e10 tonnes while years are ~2e3, so
//!   an unscaled `λ I` would be useless for one parameter or the other.
//! - Nielsen's damping update: on an accepted step `λ *= max(1/3, 1 - (2ρ - 1)³)`,
//!   on a rejected step `λ *= ν; ν *= 2`.
//! - Convergence tests follow MINPACK's `ftol` / `xtol` / `gtol` semantics.
//! - Every residual evaluation counts against `max_evaluations`.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;
use crate::math::{gradient, logistic, solve_damped_step};

const N_PARAMS: usize = 4;

/// Solver tolerances and budget.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub max_evaluations: usize,
    /// Relative reduction of the sum of squares.
    pub ftol: f64,
    /// Relative step size.
    pub xtol: f64,
    /// Infinity norm of the gradient, relative to the cost.
    pub gtol: f64,
    pub initial_lambda: f64,
    /// Damping above this means no step can reduce the residual.
    pub max_lambda: f64,
}

impl SolverOptions {
    pub fn with_budget(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            ..Self::default()
        }
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_evaluations: crate::domain::DEFAULT_MAX_EVALUATIONS,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 1e-12,
            initial_lambda: 1e-3,
            max_lambda: 1e16,
        }
    }
}

/// Which convergence test stopped the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Residuals are exactly zero.
    ExactFit,
    /// Relative reduction of the sum of squares fell below `ftol`.
    CostTolerance,
    /// Relative step size fell below `xtol`.
    StepTolerance,
    /// Gradient is numerically zero.
    GradientTolerance,
}

/// Optimizer output.
#[derive(Debug, Clone)]
pub struct SolverReport {
    pub params: [f64; 4],
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

struct Problem<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
}

impl Problem<'_> {
    fn residuals(&self, p: &[f64; 4]) -> DVector<f64> {
        DVector::from_iterator(
            self.xs.len(),
            self.xs
                .iter()
                .zip(self.ys)
                .map(|(&x, &y)| logistic(x, p[0], p[1], p[2], p[3]) - y),
        )
    }

    fn jacobian(&self, p: &[f64; 4]) -> DMatrix<f64> {
        let mut j = DMatrix::<f64>::zeros(self.xs.len(), N_PARAMS);
        for (i, &x) in self.xs.iter().enumerate() {
            let row = gradient(x, p);
            for (c, v) in row.into_iter().enumerate() {
                j[(i, c)] = v;
            }
        }
        j
    }
}

/// Fit the logistic curve to `(xs, ys)` starting from `p0`.
pub fn levenberg_marquardt(
    xs: &[f64],
    ys: &[f64],
    p0: [f64; 4],
    opts: &SolverOptions,
) -> Result<SolverReport, FitError> {
    if xs.len() != ys.len() || xs.is_empty() {
        return Err(FitError::NonFinite("empty or mismatched inputs"));
    }
    if xs.iter().chain(ys).chain(p0.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite("inputs or initial guess"));
    }

    let problem = Problem { xs, ys };
    let mut p = p0;
    let mut r = problem.residuals(&p);
    let mut evaluations = 1usize;
    let mut cost = 0.5 * r.norm_squared();
    if !cost.is_finite() {
        return Err(FitError::NonFinite("residuals at initial guess"));
    }

    let mut scale = DVector::<f64>::zeros(N_PARAMS);
    let mut lambda = opts.initial_lambda;
    let mut nu = 2.0_f64;
    let mut iterations = 0usize;

    if cost == 0.0 {
        return done(p, cost, evaluations, iterations, Termination::ExactFit);
    }

    while evaluations < opts.max_evaluations {
        iterations += 1;

        let j = problem.jacobian(&p);
        let jt = j.transpose();
        let jtj = &jt * &j;
        let grad = &jt * &r;

        for i in 0..N_PARAMS {
            scale[i] = scale[i].max(jtj[(i, i)]);
        }
        if scale.iter().all(|&d| d == 0.0) {
            return Err(FitError::SingularMatrix);
        }

        if grad.amax() <= opts.gtol * cost.max(1.0) {
            return done(p, cost, evaluations, iterations, Termination::GradientTolerance);
        }

        // Inner loop: raise damping until a step reduces the cost.
        loop {
            if evaluations >= opts.max_evaluations {
                return Err(FitError::BudgetExhausted {
                    max_evaluations: opts.max_evaluations,
                });
            }

            let Some(step) = solve_damped_step(&jtj, &grad, &scale, lambda) else {
                lambda *= nu;
                nu *= 2.0;
                if lambda > opts.max_lambda {
                    return Err(FitError::SingularMatrix);
                }
                continue;
            };

            let mut p_new = p;
            for i in 0..N_PARAMS {
                p_new[i] += step[i];
            }
            let r_new = problem.residuals(&p_new);
            evaluations += 1;
            let cost_new = 0.5 * r_new.norm_squared();

            // Predicted reduction of the linearized model: ½ δᵀ(λ D δ - g).
            let mut predicted = 0.0;
            for i in 0..N_PARAMS {
                predicted += step[i] * (lambda * scale[i] * step[i] - grad[i]);
            }
            predicted *= 0.5;

            let rho = if predicted > 0.0 {
                (cost - cost_new) / predicted
            } else {
                -1.0
            };

            if cost_new.is_finite() && rho > 0.0 {
                let step_norm = step.norm();
                let p_norm = p.iter().map(|v| v * v).sum::<f64>().sqrt();
                let actual_rel = (cost - cost_new) / cost;
                let predicted_rel = predicted / cost;

                p = p_new;
                r = r_new;
                cost = cost_new;
                lambda *= (1.0_f64 / 3.0).max(1.0 - (2.0 * rho - 1.0).powi(3));
                nu = 2.0;

                if cost == 0.0 {
                    return done(p, cost, evaluations, iterations, Termination::ExactFit);
                }
                if actual_rel <= opts.ftol && predicted_rel <= opts.ftol {
                    return done(p, cost, evaluations, iterations, Termination::CostTolerance);
                }
                if step_norm <= opts.xtol * (p_norm + opts.xtol) {
                    return done(p, cost, evaluations, iterations, Termination::StepTolerance);
                }
                break;
            }

            lambda *= nu;
            nu *= 2.0;
            if lambda > opts.max_lambda {
                return Err(FitError::Stalled);
            }
        }
    }

    Err(FitError::BudgetExhausted {
        max_evaluations: opts.max_evaluations,
    })
}

fn done(
    p: [f64; 4],
    cost: f64,
    evaluations: usize,
    iterations: usize,
    termination: Termination,
) -> Result<SolverReport, FitError> {
    Ok(SolverReport {
        params: p,
        sse: 2.0 * cost,
        evaluations,
        iterations,
        termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact_data() -> (Vec<f64>, Vec<f64>) {
        let xs: Vec<f64> = (0..10).map(|i| 2000.0 + 10.0 * i as f64).collect();
        let ys = xs.iter().map(|&x| logistic(x, 100.0, 2035.0, 0.1, 5.0)).collect();
        (xs, ys)
    }

    #[test]
    fn recovers_exact_logistic_from_nearby_guess() {
        let (xs, ys) = exact_data();
        let report =
            levenberg_marquardt(&xs, &ys, [90.0, 2040.0, 0.2, 3.0], &SolverOptions::default()).unwrap();
        let p = report.params;
        assert!((p[0] - 100.0).abs() < 1e-3, "{p:?}");
        assert!((p[1] - 2035.0).abs() < 1e-3, "{p:?}");
        assert!((p[2] - 0.1).abs() < 1e-6, "{p:?}");
        assert!((p[3] - 5.0).abs() < 1e-3, "{p:?}");
        assert!(report.sse < 1e-12);
    }

    #[test]
    fn exact_start_terminates_immediately() {
        let (xs, ys) = exact_data();
        let report =
            levenberg_marquardt(&xs, &ys, [100.0, 2035.0, 0.1, 5.0], &SolverOptions::default()).unwrap();
        assert_eq!(report.termination, Termination::ExactFit);
        assert_eq!(report.evaluations, 1);
    }

    #[test]
    fn tiny_budget_is_reported() {
        let (xs, ys) = exact_data();
        let err = levenberg_marquardt(&xs, &ys, [90.0, 2040.0, 1.0, 3.0], &SolverOptions::with_budget(2))
            .unwrap_err();
        assert_eq!(err, FitError::BudgetExhausted { max_evaluations: 2 });
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let xs = vec![1.0, 2.0, 3.0];
        let ys = vec![1.0, f64::NAN, 3.0];
        let err = levenberg_marquardt(&xs, &ys, [1.0, 2.0, 1.0, 0.0], &SolverOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::NonFinite(_)));
    }
}
