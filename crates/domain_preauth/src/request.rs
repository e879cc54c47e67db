//! Prior authorization request

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{check_codes, check_diagnosis_codes, check_element, Money, Npi};
use domain_eligibility::{Subscriber, HEALTH_BENEFIT_PLAN_COVERAGE};

use crate::error::PreAuthError;

/// Clinical urgency of the requested service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
    Emergency,
}

impl Urgency {
    /// UM06 level of service code
    pub fn level_of_service_code(&self) -> &'static str {
        match self {
            Urgency::Routine => "E",
            Urgency::Urgent => "U",
            Urgency::Emergency => "03",
        }
    }

    pub fn from_level_of_service(code: &str) -> Self {
        match code {
            "U" => Urgency::Urgent,
            "03" => Urgency::Emergency,
            _ => Urgency::Routine,
        }
    }
}

/// Request for payer approval ahead of a costly service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthRequest {
    #[serde(flatten)]
    pub subscriber: Subscriber,
    pub service_date: NaiveDate,
    pub service_type: String,
    pub rendering_provider: Npi,
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
    pub procedure_codes: Vec<String>,
    pub estimated_cost: Money,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<String>,
    /// References to documents held by the caller (attachment control numbers)
    #[serde(default)]
    pub supporting_documents: Vec<String>,
}

impl PreAuthRequest {
    pub fn new(
        subscriber: Subscriber,
        service_date: NaiveDate,
        rendering_provider: Npi,
        procedure_codes: Vec<String>,
        estimated_cost: Money,
    ) -> Self {
        Self {
            subscriber,
            service_date,
            service_type: HEALTH_BENEFIT_PLAN_COVERAGE.to_string(),
            rendering_provider,
            diagnosis_codes: Vec::new(),
            procedure_codes,
            estimated_cost,
            urgency: Urgency::Routine,
            clinical_notes: None,
            supporting_documents: Vec::new(),
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn with_diagnosis_codes(mut self, codes: Vec<String>) -> Self {
        self.diagnosis_codes = codes;
        self
    }

    pub fn with_clinical_notes(mut self, notes: impl Into<String>) -> Self {
        self.clinical_notes = Some(notes.into());
        self
    }

    pub fn with_supporting_document(mut self, reference: impl Into<String>) -> Self {
        self.supporting_documents.push(reference.into());
        self
    }

    /// Local checks run before the auto-approval rule or any payer call
    pub fn validate(&self) -> Result<(), PreAuthError> {
        self.subscriber.validate()?;
        check_element("service type", &self.service_type, 2)?;

        if self.estimated_cost.is_negative() {
            return Err(PreAuthError::NegativeCost(self.estimated_cost.to_string()));
        }
        if self.procedure_codes.is_empty() {
            return Err(PreAuthError::NoProcedureCodes);
        }
        check_codes("procedure code", &self.procedure_codes)?;
        check_diagnosis_codes(&self.diagnosis_codes)?;
        self.supporting_documents
            .iter()
            .try_for_each(|doc| check_element("document reference", doc, 80))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(cost: rust_decimal::Decimal) -> PreAuthRequest {
        PreAuthRequest::new(
            Subscriber::new("P-1", "POL-1", "MBR-1"),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Npi::new("1234567893").unwrap(),
            vec!["27447".to_string()],
            Money::usd(cost),
        )
    }

    #[test]
    fn test_valid_request() {
        assert!(request(dec!(1500)).validate().is_ok());
    }

    #[test]
    fn test_zero_cost_is_allowed() {
        assert!(request(dec!(0)).validate().is_ok());
    }

    #[test]
    fn test_negative_cost_rejected() {
        assert!(matches!(
            request(dec!(-1)).validate(),
            Err(PreAuthError::NegativeCost(_))
        ));
    }

    #[test]
    fn test_procedure_codes_required() {
        let mut req = request(dec!(10));
        req.procedure_codes.clear();
        assert_eq!(req.validate(), Err(PreAuthError::NoProcedureCodes));
    }

    #[test]
    fn test_urgency_codes() {
        for urgency in [Urgency::Routine, Urgency::Urgent, Urgency::Emergency] {
            assert_eq!(Urgency::from_level_of_service(urgency.level_of_service_code()), urgency);
        }
        assert_eq!(serde_json::to_string(&Urgency::Emergency).unwrap(), "\"EMERGENCY\"");
    }
}
