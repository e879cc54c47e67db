//! Eligibility inquiry

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{check_codes, check_diagnosis_codes, check_element, Npi};

use crate::error::EligibilityError;
use crate::subscriber::{require, Subscriber};

/// X12 service type code for general health benefit plan coverage
pub const HEALTH_BENEFIT_PLAN_COVERAGE: &str = "30";

/// Request for a benefits determination on a given date of service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRequest {
    #[serde(flatten)]
    pub subscriber: Subscriber,
    pub service_date: NaiveDate,
    /// X12 service type code (EQ01), e.g. "30" or "MH"
    pub service_type: String,
    pub rendering_provider: Npi,
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
    #[serde(default)]
    pub procedure_codes: Vec<String>,
}

impl EligibilityRequest {
    pub fn new(subscriber: Subscriber, service_date: NaiveDate, rendering_provider: Npi) -> Self {
        Self {
            subscriber,
            service_date,
            service_type: HEALTH_BENEFIT_PLAN_COVERAGE.to_string(),
            rendering_provider,
            diagnosis_codes: Vec::new(),
            procedure_codes: Vec::new(),
        }
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn with_diagnosis_codes(mut self, codes: Vec<String>) -> Self {
        self.diagnosis_codes = codes;
        self
    }

    pub fn with_procedure_codes(mut self, codes: Vec<String>) -> Self {
        self.procedure_codes = codes;
        self
    }

    /// Local checks run before anything is sent to a payer
    pub fn validate(&self) -> Result<(), EligibilityError> {
        self.subscriber.validate()?;
        require("service type", &self.service_type)?;
        check_element("service type", &self.service_type, 2)?;
        check_diagnosis_codes(&self.diagnosis_codes)?;
        check_codes("procedure code", &self.procedure_codes)?;
        Ok(())
    }
}
