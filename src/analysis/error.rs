use thiserror::Error;

/// Errors raised by the estimation and blend-matching computations.
///
/// Calibration resolution has no variant here: it always falls back to a
/// default coefficient set, so estimation is total over well-typed input.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("At least one sample is required")]
    EmptyInput,
}
