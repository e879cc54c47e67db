//! Webhook - Inbound payer notifications
//!
//! Payers push claim status changes and pre-authorization decisions as
//! signed JSON. Signatures are hex HMAC-SHA256 digests of the raw body sent
//! in the `X-Signature` header. Verification fails closed: it returns
//! `false` (or `WebhookOutcome::Rejected`) and logs the reason instead of
//! raising into caller code.

pub mod notification;
pub mod signature;
pub mod verifier;

pub use notification::WebhookNotification;
pub use signature::{sign, verify_with_secret, SignatureFailure, SIGNATURE_HEADER};
pub use verifier::{WebhookHandler, WebhookOutcome, WebhookVerifier};
