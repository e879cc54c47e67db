//! Claims domain errors

use thiserror::Error;

use core_kernel::{GatewayError, IdentifierError, MoneyError};
use domain_eligibility::EligibilityError;

use crate::claim::ClaimStatus;

/// Errors that can occur in the claims domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error(transparent)]
    Member(#[from] EligibilityError),

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("total amount must be positive, got {0}")]
    NonPositiveTotal(String),

    #[error("total amount {total} exceeds the claim ceiling of {ceiling}")]
    ExceedsCeiling { total: String, ceiling: String },

    #[error("at least one diagnosis code required")]
    NoDiagnosisCodes,

    #[error("at least one procedure code required")]
    NoProcedureCodes,

    #[error("sum of charges {charges} does not equal total amount {total}")]
    ChargeMismatch { charges: String, total: String },

    #[error("patient responsibility {0} must be between zero and the total amount")]
    InvalidPatientResponsibility(String),

    #[error("charge line {line}: {reason}")]
    InvalidCharge { line: usize, reason: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: ClaimStatus, to: ClaimStatus },
}

impl From<ClaimError> for GatewayError {
    fn from(err: ClaimError) -> Self {
        match err {
            // The payer contradicted the stored state; nothing the caller typed is wrong
            ClaimError::InvalidStatusTransition { .. } => GatewayError::Protocol(err.to_string()),
            _ => GatewayError::Validation(err.to_string()),
        }
    }
}
