//! Subscriber and patient identification shared by every payer transaction

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::check_element;

use crate::error::EligibilityError;

/// Administrative gender as carried in the X12 DMG segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Unknown,
}

impl Gender {
    /// DMG03 code
    pub fn x12_code(&self) -> &'static str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
            Gender::Unknown => "U",
        }
    }

    pub fn from_x12(code: &str) -> Self {
        match code {
            "F" => Gender::Female,
            "M" => Gender::Male,
            _ => Gender::Unknown,
        }
    }
}

/// Optional demographics used by payers to disambiguate members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub gender: Gender,
}

/// The member a request is about and the policy they are covered under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Hospital-side patient identifier
    pub patient_id: String,
    pub policy_number: String,
    /// Member id of the policy holder (NM1*IL identification code)
    pub policy_holder_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
}

impl Subscriber {
    pub fn new(
        patient_id: impl Into<String>,
        policy_number: impl Into<String>,
        policy_holder_id: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            policy_number: policy_number.into(),
            policy_holder_id: policy_holder_id.into(),
            demographics: None,
        }
    }

    pub fn with_demographics(mut self, demographics: Demographics) -> Self {
        self.demographics = Some(demographics);
        self
    }

    /// Checks presence and X12 safety of every identifying field
    pub fn validate(&self) -> Result<(), EligibilityError> {
        require("patient id", &self.patient_id)?;
        require("policy number", &self.policy_number)?;
        require("policy holder id", &self.policy_holder_id)?;

        check_element("patient id", &self.patient_id, 80)?;
        check_element("policy number", &self.policy_number, 50)?;
        check_element("policy holder id", &self.policy_holder_id, 80)?;

        if let Some(demographics) = &self.demographics {
            check_element("first name", &demographics.first_name, 35)?;
            check_element("last name", &demographics.last_name, 60)?;
        }
        Ok(())
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), EligibilityError> {
    if value.trim().is_empty() {
        Err(EligibilityError::MissingField(field))
    } else {
        Ok(())
    }
}
