//! Estimation errors

use thiserror::Error;

use super::units::QuantityKind;

/// Fatal estimation errors
///
/// Data gaps are not errors; they are reported as [`super::Diagnostic`] values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("Unsupported {kind} conversion: '{from}' -> '{to}'")]
    UnsupportedConversion {
        kind: QuantityKind,
        from: String,
        to: String,
    },

    #[error("Inconsistent input: {0}")]
    InconsistentInput(String),
}

/// Result type for estimation operations
pub type EstimationResult<T> = Result<T, EstimationError>;
