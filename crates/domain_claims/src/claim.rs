//! Professional claim submission

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ClaimNumber, DateRange, Money, Npi, PreAuthNumber};
use domain_eligibility::Subscriber;

/// Place of service code for an office visit
pub const OFFICE_PLACE_OF_SERVICE: &str = "11";

/// Claim status as reported by the payer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Accepted for processing
    Submitted,
    /// In adjudication
    Processing,
    Approved,
    PartiallyApproved,
    Denied,
    /// Payment issued
    Paid,
    /// Provider appealed the decision
    Appealed,
    Cancelled,
}

impl ClaimStatus {
    /// Maps a REST payer status string, case-insensitively
    pub fn from_payer_code(code: &str) -> Option<Self> {
        let status = match code.trim().to_ascii_lowercase().as_str() {
            "submitted" | "received" | "accepted" => ClaimStatus::Submitted,
            "processing" | "pending" | "in_process" | "in_review" => ClaimStatus::Processing,
            "approved" => ClaimStatus::Approved,
            "partially_approved" | "partial" => ClaimStatus::PartiallyApproved,
            "denied" | "rejected" => ClaimStatus::Denied,
            "paid" => ClaimStatus::Paid,
            "appealed" => ClaimStatus::Appealed,
            "cancelled" | "canceled" => ClaimStatus::Cancelled,
            _ => return None,
        };
        Some(status)
    }

    /// Whether a later payer update may move a stored claim from `self` to `next`
    ///
    /// ```text
    /// SUBMITTED -> PROCESSING | APPROVED | PARTIALLY_APPROVED | DENIED | CANCELLED
    /// PROCESSING -> APPROVED | PARTIALLY_APPROVED | DENIED | PAID | CANCELLED
    /// APPROVED -> PAID
    /// PARTIALLY_APPROVED -> PAID | APPEALED
    /// DENIED -> APPEALED
    /// APPEALED -> PROCESSING | APPROVED | PARTIALLY_APPROVED | DENIED
    /// ```
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, next),
            (Submitted, Processing | Approved | PartiallyApproved | Denied | Cancelled)
                | (Processing, Approved | PartiallyApproved | Denied | Paid | Cancelled)
                | (Approved, Paid)
                | (PartiallyApproved, Paid | Appealed)
                | (Denied, Appealed)
                | (Appealed, Processing | Approved | PartiallyApproved | Denied)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClaimStatus::Submitted => "SUBMITTED",
            ClaimStatus::Processing => "PROCESSING",
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::PartiallyApproved => "PARTIALLY_APPROVED",
            ClaimStatus::Denied => "DENIED",
            ClaimStatus::Paid => "PAID",
            ClaimStatus::Appealed => "APPEALED",
            ClaimStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Providers named on a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderNpis {
    /// Billing provider (2010AA)
    pub billing: Npi,
    /// Rendering provider (2310B)
    pub rendering: Npi,
    /// Service facility (2310C), when different from the billing provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<Npi>,
}

/// One itemized service line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCharge {
    /// CPT/HCPCS code
    pub procedure_code: String,
    pub amount: Money,
    #[serde(default = "default_units")]
    pub units: u32,
    pub service_date: NaiveDate,
}

fn default_units() -> u32 {
    1
}

impl ClaimCharge {
    pub fn new(procedure_code: impl Into<String>, amount: Money, service_date: NaiveDate) -> Self {
        Self {
            procedure_code: procedure_code.into(),
            amount,
            units: 1,
            service_date,
        }
    }

    pub fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }
}

/// A claim as submitted by the caller
///
/// The claim number is caller-assigned and must be unique per provider;
/// resubmitting the same number returns the earlier response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSubmission {
    pub claim_number: ClaimNumber,
    #[serde(flatten)]
    pub subscriber: Subscriber,
    pub providers: ProviderNpis,
    pub service_period: DateRange,
    #[serde(default = "default_place_of_service")]
    pub place_of_service: String,
    pub diagnosis_codes: Vec<String>,
    pub procedure_codes: Vec<String>,
    pub charges: Vec<ClaimCharge>,
    pub total_amount: Money,
    pub patient_responsibility: Money,
    /// Prior authorization obtained for the services, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_auth_number: Option<PreAuthNumber>,
}

fn default_place_of_service() -> String {
    OFFICE_PLACE_OF_SERVICE.to_string()
}

impl ClaimSubmission {
    /// Total of the itemized charges in the claim currency
    pub fn charges_total(&self) -> Result<Money, core_kernel::MoneyError> {
        Money::sum(self.charges.iter().map(|c| &c.amount), self.total_amount.currency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payer_codes() {
        assert_eq!(ClaimStatus::from_payer_code("Paid"), Some(ClaimStatus::Paid));
        assert_eq!(ClaimStatus::from_payer_code("rejected"), Some(ClaimStatus::Denied));
        assert_eq!(ClaimStatus::from_payer_code("lost"), None);
    }

    #[test]
    fn test_status_serde_name() {
        let json = serde_json::to_string(&ClaimStatus::PartiallyApproved).unwrap();
        assert_eq!(json, "\"PARTIALLY_APPROVED\"");
    }
}
