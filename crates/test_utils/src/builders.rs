//! Test Data Builders
//!
//! Provides builder patterns for constructing gateway requests with sensible
//! defaults. Tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClaimNumber, DateRange, Money, Npi, PreAuthNumber};
use domain_claims::{ClaimCharge, ClaimSubmission, ProviderNpis, OFFICE_PLACE_OF_SERVICE};
use domain_eligibility::{EligibilityRequest, Subscriber};
use domain_preauth::{PreAuthRequest, Urgency};

use crate::fixtures::{ClaimFixtures, MemberFixtures, MoneyFixtures, NpiFixtures, TemporalFixtures};

/// Builder for eligibility inquiries
pub struct TestEligibilityRequestBuilder {
    subscriber: Subscriber,
    service_date: NaiveDate,
    rendering_provider: Npi,
    service_type: Option<String>,
    procedure_codes: Vec<String>,
}

impl Default for TestEligibilityRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEligibilityRequestBuilder {
    pub fn new() -> Self {
        Self {
            subscriber: MemberFixtures::subscriber(),
            service_date: TemporalFixtures::service_date(),
            rendering_provider: NpiFixtures::rendering(),
            service_type: None,
            procedure_codes: Vec::new(),
        }
    }

    pub fn with_subscriber(mut self, subscriber: Subscriber) -> Self {
        self.subscriber = subscriber;
        self
    }

    pub fn with_service_date(mut self, date: NaiveDate) -> Self {
        self.service_date = date;
        self
    }

    pub fn with_service_type(mut self, code: impl Into<String>) -> Self {
        self.service_type = Some(code.into());
        self
    }

    pub fn with_procedure_codes(mut self, codes: &[&str]) -> Self {
        self.procedure_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(self) -> EligibilityRequest {
        let mut request = EligibilityRequest::new(self.subscriber, self.service_date, self.rendering_provider)
            .with_procedure_codes(self.procedure_codes);
        if let Some(service_type) = self.service_type {
            request = request.with_service_type(service_type);
        }
        request
    }
}

/// Builder for prior authorization requests
pub struct TestPreAuthRequestBuilder {
    subscriber: Subscriber,
    service_date: NaiveDate,
    procedure_codes: Vec<String>,
    diagnosis_codes: Vec<String>,
    estimated_cost: Money,
    urgency: Urgency,
    clinical_notes: Option<String>,
}

impl Default for TestPreAuthRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPreAuthRequestBuilder {
    /// Defaults to a knee replacement well above every fixture threshold
    pub fn new() -> Self {
        Self {
            subscriber: MemberFixtures::subscriber(),
            service_date: TemporalFixtures::service_date(),
            procedure_codes: vec!["27447".to_string()],
            diagnosis_codes: vec!["M17.11".to_string()],
            estimated_cost: MoneyFixtures::major_procedure(),
            urgency: Urgency::Routine,
            clinical_notes: None,
        }
    }

    pub fn with_estimated_cost(mut self, amount: Decimal) -> Self {
        self.estimated_cost = Money::usd(amount);
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_procedure_codes(mut self, codes: &[&str]) -> Self {
        self.procedure_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_clinical_notes(mut self, notes: impl Into<String>) -> Self {
        self.clinical_notes = Some(notes.into());
        self
    }

    pub fn build(self) -> PreAuthRequest {
        let mut request = PreAuthRequest::new(
            self.subscriber,
            self.service_date,
            NpiFixtures::rendering(),
            self.procedure_codes,
            self.estimated_cost,
        )
        .with_diagnosis_codes(self.diagnosis_codes)
        .with_urgency(self.urgency);
        if let Some(notes) = self.clinical_notes {
            request = request.with_clinical_notes(notes);
        }
        request
    }
}

/// Builder for claim submissions
///
/// Charges default to one office visit line; `total_amount` follows the sum
/// of charges unless set explicitly.
pub struct TestClaimBuilder {
    claim_number: ClaimNumber,
    subscriber: Subscriber,
    service_period: DateRange,
    diagnosis_codes: Vec<String>,
    charges: Vec<ClaimCharge>,
    total_amount: Option<Money>,
    patient_responsibility: Money,
    pre_auth_number: Option<PreAuthNumber>,
    facility: Option<Npi>,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    pub fn new() -> Self {
        Self {
            claim_number: ClaimFixtures::claim_number(),
            subscriber: MemberFixtures::subscriber(),
            service_period: TemporalFixtures::service_period(),
            diagnosis_codes: vec!["J06.9".to_string()],
            charges: vec![ClaimCharge::new(
                "99213",
                Money::usd(dec!(150.00)),
                TemporalFixtures::service_date(),
            )],
            total_amount: None,
            patient_responsibility: Money::usd(dec!(25.00)),
            pre_auth_number: None,
            facility: None,
        }
    }

    pub fn with_claim_number(mut self, number: &str) -> Self {
        self.claim_number = ClaimNumber::new(number).unwrap();
        self
    }

    pub fn with_subscriber(mut self, subscriber: Subscriber) -> Self {
        self.subscriber = subscriber;
        self
    }

    pub fn with_diagnosis_codes(mut self, codes: &[&str]) -> Self {
        self.diagnosis_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Replaces the charge lines; every line is dated on the service date
    pub fn with_charges(mut self, lines: &[(&str, Decimal)]) -> Self {
        self.charges = lines
            .iter()
            .map(|(code, amount)| ClaimCharge::new(*code, Money::usd(*amount), self.service_period.start()))
            .collect();
        self
    }

    /// Overrides the claim total independently of the charges
    pub fn with_total(mut self, amount: Decimal) -> Self {
        self.total_amount = Some(Money::usd(amount));
        self
    }

    pub fn with_patient_responsibility(mut self, amount: Decimal) -> Self {
        self.patient_responsibility = Money::usd(amount);
        self
    }

    pub fn with_pre_auth_number(mut self, number: &str) -> Self {
        self.pre_auth_number = Some(PreAuthNumber::new(number).unwrap());
        self
    }

    pub fn with_facility(mut self) -> Self {
        self.facility = Some(NpiFixtures::facility());
        self
    }

    pub fn build(self) -> ClaimSubmission {
        let total_amount = match self.total_amount {
            Some(total) => total,
            None => Money::sum(self.charges.iter().map(|c| &c.amount), core_kernel::Currency::USD).unwrap(),
        };
        let mut procedure_codes: Vec<String> = Vec::new();
        for charge in &self.charges {
            if !procedure_codes.contains(&charge.procedure_code) {
                procedure_codes.push(charge.procedure_code.clone());
            }
        }

        ClaimSubmission {
            claim_number: self.claim_number,
            subscriber: self.subscriber,
            providers: ProviderNpis {
                billing: NpiFixtures::billing(),
                rendering: NpiFixtures::rendering(),
                facility: self.facility,
            },
            service_period: self.service_period,
            place_of_service: OFFICE_PLACE_OF_SERVICE.to_string(),
            diagnosis_codes: self.diagnosis_codes,
            procedure_codes,
            charges: self.charges,
            total_amount,
            patient_responsibility: self.patient_responsibility,
            pre_auth_number: self.pre_auth_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::ClaimValidator;

    #[test]
    fn test_default_claim_is_valid() {
        let claim = TestClaimBuilder::new().build();
        assert!(ClaimValidator::default().validate(&claim).is_ok());
        assert_eq!(claim.total_amount, Money::usd(dec!(150.00)));
    }

    #[test]
    fn test_total_follows_charges() {
        let claim = TestClaimBuilder::new()
            .with_charges(&[("99213", dec!(100)), ("85025", dec!(40.50))])
            .build();
        assert_eq!(claim.total_amount, Money::usd(dec!(140.50)));
        assert_eq!(claim.procedure_codes, vec!["99213", "85025"]);
    }

    #[test]
    fn test_default_requests_are_valid() {
        assert!(TestEligibilityRequestBuilder::new().build().validate().is_ok());
        assert!(TestPreAuthRequestBuilder::new().build().validate().is_ok());
    }
}
