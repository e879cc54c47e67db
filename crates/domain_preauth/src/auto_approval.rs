//! Threshold-based auto-approval
//!
//! Requests whose estimated cost does not exceed the provider's threshold
//! are approved locally, without any payer round trip. The rule is a
//! business policy and runs the same way whether or not the payer is
//! reachable.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use core_kernel::temporal::add_days;
use core_kernel::{Money, PreAuthNumber, ProviderId};

use crate::decision::{PreAuthResponse, PreAuthStatus};
use crate::error::PreAuthError;
use crate::request::PreAuthRequest;

/// Prefix marking locally synthesized authorization numbers
pub const AUTO_APPROVAL_PREFIX: &str = "AUTO-";

/// Validity of an auto-approval, counted from the decision date
pub const AUTO_APPROVAL_VALIDITY_DAYS: u64 = 90;

/// Prefix of numbers assigned by the gateway to payer decisions
pub const TRACKING_PREFIX: &str = "GW-";

/// Auto-approval rule for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoApprovalRule {
    threshold: Money,
}

impl AutoApprovalRule {
    pub fn new(threshold: Money) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Money {
        self.threshold
    }

    /// True when `estimated_cost` is at or below the threshold
    ///
    /// Amounts in a different currency never qualify.
    pub fn applies_to(&self, estimated_cost: &Money) -> bool {
        estimated_cost.currency() == self.threshold.currency()
            && estimated_cost.amount() <= self.threshold.amount()
    }

    /// Synthesizes the approval for a qualifying request
    ///
    /// Callers check `applies_to` first; the approved amount is the
    /// estimated cost and the authorization expires after
    /// `AUTO_APPROVAL_VALIDITY_DAYS`.
    pub fn approve(
        &self,
        request: &PreAuthRequest,
        provider_id: ProviderId,
        today: NaiveDate,
    ) -> Result<PreAuthResponse, PreAuthError> {
        let number = generate_auto_number()?;
        info!(
            provider = %provider_id,
            pre_auth_number = %number,
            threshold = %self.threshold,
            "Pre-authorization auto-approved"
        );

        let mut response = PreAuthResponse::decided(
            number,
            provider_id,
            PreAuthStatus::Approved,
            Some(request.estimated_cost),
            None,
        )
        .with_expiration(Some(add_days(today, AUTO_APPROVAL_VALIDITY_DAYS)));
        response.auto_approved = true;
        Ok(response)
    }
}

/// Generates `AUTO-` followed by twelve hex digits
pub fn generate_auto_number() -> Result<PreAuthNumber, PreAuthError> {
    generate_number(AUTO_APPROVAL_PREFIX)
}

/// Gateway-side reference for payer decisions that carry no number
pub fn generate_tracking_number() -> Result<PreAuthNumber, PreAuthError> {
    generate_number(TRACKING_PREFIX)
}

fn generate_number(prefix: &str) -> Result<PreAuthNumber, PreAuthError> {
    let suffix = Uuid::new_v4().simple().to_string();
    let number = PreAuthNumber::new(format!("{prefix}{}", suffix[..12].to_ascii_uppercase()))?;
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Npi;
    use domain_eligibility::Subscriber;
    use rust_decimal_macros::dec;

    fn request(cost: Money) -> PreAuthRequest {
        PreAuthRequest::new(
            Subscriber::new("P-1", "POL-1", "MBR-1"),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Npi::new("1234567893").unwrap(),
            vec!["27447".to_string()],
            cost,
        )
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let rule = AutoApprovalRule::new(Money::usd(dec!(1000)));
        assert!(rule.applies_to(&Money::usd(dec!(1000))));
        assert!(rule.applies_to(&Money::usd(dec!(750))));
        assert!(!rule.applies_to(&Money::usd(dec!(1000.01))));
    }

    #[test]
    fn test_other_currency_never_qualifies() {
        let rule = AutoApprovalRule::new(Money::usd(dec!(1000)));
        assert!(!rule.applies_to(&Money::new(dec!(1), core_kernel::Currency::CAD)));
    }

    #[test]
    fn test_approval_shape() {
        let rule = AutoApprovalRule::new(Money::usd(dec!(1000)));
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let response = rule
            .approve(&request(Money::usd(dec!(750))), ProviderId::new("bcbs").unwrap(), today)
            .unwrap();

        assert_eq!(response.status(), PreAuthStatus::Approved);
        assert!(response.pre_auth_number.as_str().starts_with("AUTO-"));
        assert_eq!(response.pre_auth_number.as_str().len(), 17);
        assert_eq!(response.approval_amount, Some(Money::usd(dec!(750))));
        assert_eq!(response.expiration_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert!(response.denial_reason().is_none());
        assert!(response.auto_approved);
    }

    #[test]
    fn test_numbers_are_unique() {
        let a = generate_auto_number().unwrap();
        let b = generate_auto_number().unwrap();
        assert_ne!(a, b);
        assert!(generate_tracking_number().unwrap().as_str().starts_with(TRACKING_PREFIX));
    }
}
