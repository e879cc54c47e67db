//! Eligibility domain errors

use thiserror::Error;

use core_kernel::{GatewayError, IdentifierError, TemporalError};

/// Errors raised by local eligibility checks
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EligibilityError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error(transparent)]
    InvalidCoverageWindow(#[from] TemporalError),
}

impl From<EligibilityError> for GatewayError {
    fn from(err: EligibilityError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}
