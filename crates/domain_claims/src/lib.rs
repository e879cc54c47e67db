//! Claims Domain
//!
//! This crate models professional claims on their way to a payer and the
//! status the payer reports back.
//!
//! # Lifecycle
//!
//! ```text
//! SUBMITTED -> PROCESSING -> (APPROVED | PARTIALLY_APPROVED | DENIED) -> PAID
//!                    DENIED -> APPEALED -> PROCESSING
//! ```
//!
//! The gateway reports whatever status the payer sends. Callers that keep a
//! [`ClaimResponse`] and apply later updates go through
//! [`ClaimResponse::update_status`], which enforces the lifecycle.

pub mod claim;
pub mod error;
pub mod response;
pub mod validation;

pub use claim::{ClaimCharge, ClaimStatus, ClaimSubmission, ProviderNpis, OFFICE_PLACE_OF_SERVICE};
pub use error::ClaimError;
pub use response::ClaimResponse;
pub use validation::{ClaimValidator, DEFAULT_CHARGE_TOLERANCE, DEFAULT_CLAIM_AMOUNT_CEILING};
