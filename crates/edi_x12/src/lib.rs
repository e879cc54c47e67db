//! EDI X12 - ANSI X12 005010 encoding and decoding for payer exchanges
//!
//! This crate converts between the gateway's domain types and X12 text:
//! - 270/271 eligibility inquiry and response
//! - 837P professional claims
//! - 278 services review request and decision
//! - 276/277 claim status inquiry and response
//!
//! Output always uses `|` `:` `^` `~` as delimiters; input delimiters are
//! detected from the ISA header. Readers are tolerant: unknown segments are
//! skipped and recoverable problems surface as warnings.

pub mod error;
pub mod segment;
pub mod control;
pub mod envelope;
pub mod elements;
pub mod codec;
mod eligibility;
mod claim;
mod prior_auth;
mod claim_status;

pub use error::EdiError;
pub use segment::{Delimiters, Segment};
pub use control::ControlNumber;
pub use envelope::{Interchange, ParseIssue, TransactionSet, UsageIndicator};
pub use codec::{Submitter, X12Codec};
