//! Prior Authorization Domain
//!
//! This crate models requests for payer approval before a costly service
//! and the decisions that come back.
//!
//! # Lifecycle
//!
//! ```text
//! REQUESTED -> REVIEW_PENDING -> (APPROVED | PARTIALLY_APPROVED | DENIED)
//! APPROVED | PARTIALLY_APPROVED -> (EXPIRED | CANCELLED)
//! ```
//!
//! Stored decisions are moved along it with [`PreAuthResponse::transition_to`].
//!
//! Requests at or below the provider threshold skip the payer entirely and
//! are approved by [`AutoApprovalRule`].

pub mod auto_approval;
pub mod decision;
pub mod error;
pub mod request;

pub use auto_approval::{
    generate_tracking_number, AutoApprovalRule, AUTO_APPROVAL_PREFIX, AUTO_APPROVAL_VALIDITY_DAYS,
    TRACKING_PREFIX,
};
pub use decision::{PreAuthResponse, PreAuthStatus, GENERIC_DENIAL_REASON};
pub use error::PreAuthError;
pub use request::{PreAuthRequest, Urgency};
