//! Payer response to a claim submission or status inquiry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimNumber, Money, ProviderId};

use crate::claim::ClaimStatus;
use crate::error::ClaimError;

/// Claim state as last reported by the payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub claim_number: ClaimNumber,
    pub provider_id: ProviderId,
    pub status: ClaimStatus,
    /// Payer-assigned claim control number
    #[serde(default)]
    pub payer_claim_id: Option<String>,
    #[serde(default)]
    pub approved_amount: Option<Money>,
    #[serde(default)]
    pub paid_amount: Option<Money>,
    #[serde(default)]
    pub denial_reason: Option<String>,
    /// Free-text payer messages
    #[serde(default)]
    pub messages: Vec<String>,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl ClaimResponse {
    pub fn new(claim_number: ClaimNumber, provider_id: ProviderId, status: ClaimStatus) -> Self {
        Self {
            claim_number,
            provider_id,
            status,
            payer_claim_id: None,
            approved_amount: None,
            paid_amount: None,
            denial_reason: None,
            messages: Vec::new(),
            received_at: Utc::now(),
            processing_time_ms: 0,
        }
    }

    pub fn with_payer_claim_id(mut self, id: impl Into<String>) -> Self {
        self.payer_claim_id = Some(id.into());
        self
    }

    pub fn with_processing_time(mut self, millis: u64) -> Self {
        self.processing_time_ms = millis;
        self
    }

    /// Applies a later payer status (e.g. from a webhook) to a stored response
    ///
    /// Repeating the current status is a no-op, so redelivered notifications
    /// are harmless.
    pub fn update_status(&mut self, next: ClaimStatus) -> Result<(), ClaimError> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(ClaimError::InvalidStatusTransition { from: self.status, to: next });
        }
        self.status = next;
        self.received_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> ClaimResponse {
        ClaimResponse::new(
            ClaimNumber::new("CLM-1").unwrap(),
            ProviderId::new("aetna").unwrap(),
            ClaimStatus::Submitted,
        )
    }

    #[test]
    fn test_builders() {
        let r = response().with_payer_claim_id("PYR-1").with_processing_time(12);
        assert_eq!(r.payer_claim_id.as_deref(), Some("PYR-1"));
        assert_eq!(r.processing_time_ms, 12);
        assert_eq!(r.status, ClaimStatus::Submitted);
    }

    #[test]
    fn test_update_status_follows_lifecycle() {
        let mut r = response();
        r.update_status(ClaimStatus::Processing).unwrap();
        r.update_status(ClaimStatus::Paid).unwrap();
        assert_eq!(r.status, ClaimStatus::Paid);
    }

    #[test]
    fn test_repeated_status_is_noop() {
        let mut r = response();
        let before = r.received_at;
        r.update_status(ClaimStatus::Submitted).unwrap();
        assert_eq!(r.received_at, before);
    }

    #[test]
    fn test_update_status_rejects_skips() {
        let mut r = response();
        let err = r.update_status(ClaimStatus::Appealed).unwrap_err();
        assert_eq!(
            err,
            ClaimError::InvalidStatusTransition { from: ClaimStatus::Submitted, to: ClaimStatus::Appealed }
        );
        assert_eq!(r.status, ClaimStatus::Submitted);
    }
}
