// Framework errors - construction-time misuse and malformed inputs

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameworkError {
    /// Argument `argument` (1-based) of a constructor was not of the expected kind
    #[error("Argument #{argument} must be a {expected}")]
    InvalidArgument {
        argument: usize,
        expected: &'static str,
    },

    #[error("Unknown color code: {0}")]
    UnknownColor(String),

    #[error("Invalid test plan: {0}")]
    InvalidPlan(String),
}
