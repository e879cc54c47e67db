//! Eligibility Domain
//!
//! Value objects for benefit inquiries: who the member is, what service is
//! being asked about, and the payer's determination. Requests validate
//! themselves locally; nothing in this crate performs I/O.

pub mod error;
pub mod request;
pub mod response;
pub mod subscriber;

pub use error::EligibilityError;
pub use request::{EligibilityRequest, HEALTH_BENEFIT_PLAN_COVERAGE};
pub use response::{CoverageWindow, EligibilityResponse};
pub use subscriber::{Demographics, Gender, Subscriber};
