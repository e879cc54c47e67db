//! Pre-authorization decision
//!
//! A denial reason is carried if and only if the status is `Denied`. Both
//! fields are private so that every constructor keeps the pair consistent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{Money, PreAuthNumber, ProviderId};

use crate::error::PreAuthError;

/// Denial reason used when the payer gives none or answers with a status
/// the gateway does not recognise
pub const GENERIC_DENIAL_REASON: &str = "Denied by payer; no reason provided";

/// Pre-authorization status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreAuthStatus {
    Requested,
    ReviewPending,
    Approved,
    PartiallyApproved,
    Denied,
    Expired,
    Cancelled,
}

impl PreAuthStatus {
    /// Maps a REST payer status string, case-insensitively
    pub fn from_payer_code(code: &str) -> Option<Self> {
        let status = match code.trim().to_ascii_lowercase().as_str() {
            "requested" | "received" | "submitted" => PreAuthStatus::Requested,
            "pending" | "pended" | "review_pending" | "in_review" => PreAuthStatus::ReviewPending,
            "approved" | "certified" => PreAuthStatus::Approved,
            "partially_approved" | "partial" | "modified" => PreAuthStatus::PartiallyApproved,
            "denied" | "rejected" | "not_certified" => PreAuthStatus::Denied,
            "expired" => PreAuthStatus::Expired,
            "cancelled" | "canceled" => PreAuthStatus::Cancelled,
            _ => return None,
        };
        Some(status)
    }

    /// Whether a later payer decision may move a stored request from `self` to `next`
    ///
    /// ```text
    /// REQUESTED -> REVIEW_PENDING | APPROVED | PARTIALLY_APPROVED | DENIED | CANCELLED
    /// REVIEW_PENDING -> APPROVED | PARTIALLY_APPROVED | DENIED | CANCELLED
    /// APPROVED | PARTIALLY_APPROVED -> EXPIRED | CANCELLED
    /// ```
    pub fn can_transition_to(&self, next: PreAuthStatus) -> bool {
        use PreAuthStatus::*;
        matches!(
            (self, next),
            (Requested, ReviewPending | Approved | PartiallyApproved | Denied | Cancelled)
                | (ReviewPending, Approved | PartiallyApproved | Denied | Cancelled)
                | (Approved | PartiallyApproved, Expired | Cancelled)
        )
    }
}

impl fmt::Display for PreAuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreAuthStatus::Requested => "REQUESTED",
            PreAuthStatus::ReviewPending => "REVIEW_PENDING",
            PreAuthStatus::Approved => "APPROVED",
            PreAuthStatus::PartiallyApproved => "PARTIALLY_APPROVED",
            PreAuthStatus::Denied => "DENIED",
            PreAuthStatus::Expired => "EXPIRED",
            PreAuthStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Payer (or auto-approval) decision on a pre-authorization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPreAuthResponse")]
pub struct PreAuthResponse {
    pub pre_auth_number: PreAuthNumber,
    pub provider_id: ProviderId,
    status: PreAuthStatus,
    pub approval_amount: Option<Money>,
    denial_reason: Option<String>,
    pub conditions: Vec<String>,
    pub expiration_date: Option<NaiveDate>,
    /// True when the gateway approved locally without contacting the payer
    pub auto_approved: bool,
    pub processing_time_ms: u64,
}

#[derive(Deserialize)]
struct RawPreAuthResponse {
    pre_auth_number: PreAuthNumber,
    provider_id: ProviderId,
    status: PreAuthStatus,
    approval_amount: Option<Money>,
    denial_reason: Option<String>,
    #[serde(default)]
    conditions: Vec<String>,
    expiration_date: Option<NaiveDate>,
    #[serde(default)]
    auto_approved: bool,
    #[serde(default)]
    processing_time_ms: u64,
}

impl From<RawPreAuthResponse> for PreAuthResponse {
    fn from(raw: RawPreAuthResponse) -> Self {
        let mut response = PreAuthResponse::decided(
            raw.pre_auth_number,
            raw.provider_id,
            raw.status,
            raw.approval_amount,
            raw.denial_reason,
        );
        response.conditions = raw.conditions;
        response.expiration_date = raw.expiration_date;
        response.auto_approved = raw.auto_approved;
        response.processing_time_ms = raw.processing_time_ms;
        response
    }
}

impl PreAuthResponse {
    /// Builds a response from a payer decision
    ///
    /// A `Denied` status always ends up with a reason (the generic one when
    /// the payer gave none) and no approval amount; any other status drops
    /// the reason.
    pub fn decided(
        pre_auth_number: PreAuthNumber,
        provider_id: ProviderId,
        status: PreAuthStatus,
        approval_amount: Option<Money>,
        denial_reason: Option<String>,
    ) -> Self {
        let (approval_amount, denial_reason) = if status == PreAuthStatus::Denied {
            let reason = denial_reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| GENERIC_DENIAL_REASON.to_string());
            (None, Some(reason))
        } else {
            (approval_amount, None)
        };

        Self {
            pre_auth_number,
            provider_id,
            status,
            approval_amount,
            denial_reason,
            conditions: Vec::new(),
            expiration_date: None,
            auto_approved: false,
            processing_time_ms: 0,
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<String>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_expiration(mut self, date: Option<NaiveDate>) -> Self {
        self.expiration_date = date;
        self
    }

    pub fn with_processing_time(mut self, millis: u64) -> Self {
        self.processing_time_ms = millis;
        self
    }

    pub fn status(&self) -> PreAuthStatus {
        self.status
    }

    pub fn denial_reason(&self) -> Option<&str> {
        self.denial_reason.as_deref()
    }

    /// Applies a later payer decision (e.g. from a webhook) to a stored response
    ///
    /// Repeating the current status is a no-op. The denial reason follows the
    /// same rule as [`PreAuthResponse::decided`].
    pub fn transition_to(&mut self, next: PreAuthStatus, denial_reason: Option<String>) -> Result<(), PreAuthError> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(PreAuthError::InvalidStatusTransition { from: self.status, to: next });
        }
        if next == PreAuthStatus::Denied {
            let reason = denial_reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| GENERIC_DENIAL_REASON.to_string());
            self.denial_reason = Some(reason);
            self.approval_amount = None;
        } else {
            self.denial_reason = None;
        }
        self.status = next;
        Ok(())
    }
}
