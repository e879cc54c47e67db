//! Webhook notification payloads

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{GatewayError, Money};
use domain_claims::{ClaimResponse, ClaimStatus};
use domain_preauth::{PreAuthResponse, PreAuthStatus};

/// Asynchronous payer notification, tagged by `event`
///
/// Statuses are kept as the payer sent them; the typed accessors map them
/// the same way REST responses are mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum WebhookNotification {
    #[serde(rename = "claim.status_changed")]
    ClaimStatusChanged {
        claim_number: String,
        status: String,
        #[serde(default)]
        payer_claim_id: Option<String>,
        #[serde(default, with = "rust_decimal::serde::float_option")]
        paid_amount: Option<Decimal>,
        #[serde(default)]
        message: Option<String>,
    },

    #[serde(rename = "preauth.decision")]
    PreAuthDecision {
        pre_auth_number: String,
        status: String,
        #[serde(default, with = "rust_decimal::serde::float_option")]
        approval_amount: Option<Decimal>,
        #[serde(default)]
        denial_reason: Option<String>,
        #[serde(default)]
        expiration_date: Option<NaiveDate>,
    },
}

impl WebhookNotification {
    pub fn event(&self) -> &'static str {
        match self {
            WebhookNotification::ClaimStatusChanged { .. } => "claim.status_changed",
            WebhookNotification::PreAuthDecision { .. } => "preauth.decision",
        }
    }

    /// Mapped claim status; `None` for other events or unknown codes
    pub fn claim_status(&self) -> Option<ClaimStatus> {
        match self {
            WebhookNotification::ClaimStatusChanged { status, .. } => ClaimStatus::from_payer_code(status),
            _ => None,
        }
    }

    pub fn pre_auth_status(&self) -> Option<PreAuthStatus> {
        match self {
            WebhookNotification::PreAuthDecision { status, .. } => PreAuthStatus::from_payer_code(status),
            _ => None,
        }
    }

    /// Applies a claim status change to a response the caller kept from an earlier call
    ///
    /// Fails with `Protocol` when the event is for another claim, the status
    /// is unknown, or the payer skips a step of the claim lifecycle. The
    /// stored response is left untouched on failure.
    pub fn apply_to_claim(&self, response: &mut ClaimResponse) -> Result<(), GatewayError> {
        let WebhookNotification::ClaimStatusChanged { claim_number, status, payer_claim_id, paid_amount, message } = self
        else {
            return Err(GatewayError::protocol(format!("{} does not update a claim", self.event())));
        };
        if claim_number != response.claim_number.as_str() {
            return Err(GatewayError::protocol(format!(
                "notification for claim {claim_number} applied to claim {}",
                response.claim_number
            )));
        }
        let next = ClaimStatus::from_payer_code(status)
            .ok_or_else(|| GatewayError::protocol(format!("unknown claim status '{status}'")))?;

        response.update_status(next)?;
        if let Some(id) = payer_claim_id {
            response.payer_claim_id = Some(id.clone());
        }
        if let Some(amount) = paid_amount {
            response.paid_amount = Some(Money::usd(*amount));
        }
        if let Some(message) = message {
            response.messages.push(message.clone());
        }
        Ok(())
    }

    /// Applies a pre-authorization decision to a response the caller kept
    pub fn apply_to_pre_auth(&self, response: &mut PreAuthResponse) -> Result<(), GatewayError> {
        let WebhookNotification::PreAuthDecision {
            pre_auth_number,
            status,
            approval_amount,
            denial_reason,
            expiration_date,
        } = self
        else {
            return Err(GatewayError::protocol(format!("{} does not update a pre-authorization", self.event())));
        };
        if pre_auth_number != response.pre_auth_number.as_str() {
            return Err(GatewayError::protocol(format!(
                "notification for pre-authorization {pre_auth_number} applied to {}",
                response.pre_auth_number
            )));
        }
        let next = PreAuthStatus::from_payer_code(status)
            .ok_or_else(|| GatewayError::protocol(format!("unknown pre-authorization status '{status}'")))?;

        response.transition_to(next, denial_reason.clone())?;
        if next != PreAuthStatus::Denied {
            if let Some(amount) = approval_amount {
                response.approval_amount = Some(Money::usd(*amount));
            }
        }
        if expiration_date.is_some() {
            response.expiration_date = *expiration_date;
        }
        Ok(())
    }
}
