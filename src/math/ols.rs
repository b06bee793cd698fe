//! Damped least-squares step solver.
//!
//! Each Levenberg–Marquardt iteration solves a small symmetric system
//!
//! ```text
//! (JᵀJ + λ D) δ = -Jᵀr
//! ```
//!
//! where `D` is a positive diagonal scaling. The matrix is positive definite for
//! any `λ > 0` unless `JᵀJ` is degenerate *and* `D` has zeros, so we use a
//! Cholesky factorization and report failure instead of panicking.

use nalgebra::{DMatrix, DVector};

/// Solve `(jtj + lambda * diag(scale)) δ = -grad`.
///
/// Returns `None` if the damped system is not positive definite or the step
/// is not finite.
pub fn solve_damped_step(
    jtj: &DMatrix<f64>,
    grad: &DVector<f64>,
    scale: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let mut a = jtj.clone();
    for i in 0..a.nrows() {
        a[(i, i)] += lambda * scale[i];
    }

    let chol = a.cholesky()?;
    let step = chol.solve(&(-grad));
    if step.iter().all(|v| v.is_finite()) {
        Some(step)
    } else {
        None
    }
}
