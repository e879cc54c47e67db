//! Pre-authorization domain errors

use thiserror::Error;

use core_kernel::{GatewayError, IdentifierError};
use domain_eligibility::EligibilityError;

use crate::decision::PreAuthStatus;

/// Errors that can occur in the pre-authorization domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreAuthError {
    #[error(transparent)]
    Member(#[from] EligibilityError),

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("estimated cost must be non-negative, got {0}")]
    NegativeCost(String),

    #[error("at least one procedure code required")]
    NoProcedureCodes,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: PreAuthStatus, to: PreAuthStatus },
}

impl From<PreAuthError> for GatewayError {
    fn from(err: PreAuthError) -> Self {
        match err {
            PreAuthError::InvalidStatusTransition { .. } => GatewayError::Protocol(err.to_string()),
            _ => GatewayError::Validation(err.to_string()),
        }
    }
}
