//! Error types.
//!
//! - `AppError`: application-level failures that end the process (bad input files,
//!   bad flags, terminal errors). Carries the exit code the binary should return.
//! - `FitError`: failures of a single logistic fit. These never end the process;
//!   the projection pipeline turns them into per-entity warnings or notices.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a logistic fit did not produce parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Too few observations to attempt a fit. Not a failure of the optimizer.
    #[error("only {n} observations, at least {min} required")]
    InsufficientData { n: usize, min: usize },

    /// All observed values are identical, so the curve parameters are not identifiable.
    #[error("Singular matrix: all {n} observations equal {value}, logistic parameters are not identifiable")]
    Degenerate { n: usize, value: f64 },

    /// The evaluation budget ran out before the convergence tests passed.
    #[error("Optimal parameters not found: number of calls to function has reached maxfev = {max_evaluations}")]
    BudgetExhausted { max_evaluations: usize },

    /// Damping grew without bound and no step reduced the residual.
    #[error("Optimal parameters not found: no further reduction in the sum of squares is possible")]
    Stalled,

    /// The damped normal equations could not be factorized.
    #[error("Singular matrix: normal equations are not positive definite")]
    SingularMatrix,

    /// Inputs or intermediate values were NaN or infinite.
    #[error("Non-finite values encountered: {0}")]
    NonFinite(&'static str),
}

impl FitError {
    /// `true` for the precondition skip rather than an optimizer failure.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, FitError::InsufficientData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_keeps_exit_code_and_message() {
        let err = AppError::new(3, "no rows");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "no rows");
    }

    #[test]
    fn fit_error_messages_are_human_readable() {
        let err = FitError::BudgetExhausted { max_evaluations: 10_000 };
        assert!(err.to_string().contains("maxfev = 10000"));

        let err = FitError::InsufficientData { n: 4, min: 6 };
        assert!(err.is_insufficient_data());
        assert_eq!(err.to_string(), "only 4 observations, at least 6 required");
    }
}
