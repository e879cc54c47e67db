//! Payer REST payloads
//!
//! Outbound bodies are flat JSON objects with amounts as numbers. Reply
//! types are lenient: optional fields default, amounts are accepted as
//! numbers or strings, and common alternative field names are aliased.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimNumber, Currency, GatewayError, Money};
use domain_claims::ClaimSubmission;
use domain_eligibility::{EligibilityRequest, Gender, Subscriber};
use domain_preauth::{PreAuthRequest, Urgency};

pub const ELIGIBILITY_PATH: &str = "eligibility";
pub const PREAUTH_PATH: &str = "preauthorizations";
pub const CLAIMS_PATH: &str = "claims";

/// Status resource of one claim; the claim number is a single
/// percent-encoded path segment
///
/// # Errors
///
/// `Validation` for `.` and `..`, which URL normalisation would resolve
/// to a different resource.
pub fn claim_status_path(claim_number: &ClaimNumber) -> Result<String, GatewayError> {
    let number = claim_number.as_str();
    if number.chars().all(|c| c == '.') {
        return Err(GatewayError::validation(format!(
            "claim number '{number}' cannot be used in a payer URL"
        )));
    }
    Ok(format!("{CLAIMS_PATH}/{}/status", urlencoding::encode(number)))
}

/// Member fields shared by every outbound payload
#[derive(Debug, Serialize)]
pub struct MemberPayload<'a> {
    pub patient_id: &'a str,
    pub policy_number: &'a str,
    pub policy_holder_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl<'a> From<&'a Subscriber> for MemberPayload<'a> {
    fn from(subscriber: &'a Subscriber) -> Self {
        let demographics = subscriber.demographics.as_ref();
        Self {
            patient_id: &subscriber.patient_id,
            policy_number: &subscriber.policy_number,
            policy_holder_id: &subscriber.policy_holder_id,
            first_name: demographics.map(|d| d.first_name.as_str()),
            last_name: demographics.map(|d| d.last_name.as_str()),
            date_of_birth: demographics.map(|d| d.birth_date),
            gender: demographics.map(|d| d.gender),
        }
    }
}

/// POST `{endpoint}/eligibility`
#[derive(Debug, Serialize)]
pub struct EligibilityPayload<'a> {
    #[serde(flatten)]
    pub member: MemberPayload<'a>,
    pub service_date: NaiveDate,
    pub service_type: &'a str,
    pub provider_npi: &'a str,
    pub diagnosis_codes: &'a [String],
    pub procedure_codes: &'a [String],
}

impl<'a> From<&'a EligibilityRequest> for EligibilityPayload<'a> {
    fn from(request: &'a EligibilityRequest) -> Self {
        Self {
            member: MemberPayload::from(&request.subscriber),
            service_date: request.service_date,
            service_type: &request.service_type,
            provider_npi: request.rendering_provider.as_str(),
            diagnosis_codes: &request.diagnosis_codes,
            procedure_codes: &request.procedure_codes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EligibilityReply {
    #[serde(alias = "is_eligible")]
    pub eligible: bool,
    #[serde(default, alias = "coverage_start")]
    pub coverage_start_date: Option<NaiveDate>,
    #[serde(default, alias = "coverage_end")]
    pub coverage_end_date: Option<NaiveDate>,
    #[serde(default, alias = "requires_preauth")]
    pub requires_pre_auth: bool,
    #[serde(default)]
    pub deductible_remaining: Option<Decimal>,
    #[serde(default)]
    pub out_of_pocket_remaining: Option<Decimal>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

/// POST `{endpoint}/preauthorizations`
#[derive(Debug, Serialize)]
pub struct PreAuthPayload<'a> {
    #[serde(flatten)]
    pub member: MemberPayload<'a>,
    pub service_date: NaiveDate,
    pub service_type: &'a str,
    pub provider_npi: &'a str,
    pub diagnosis_codes: &'a [String],
    pub procedure_codes: &'a [String],
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_cost: Decimal,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<&'a str>,
    pub supporting_documents: &'a [String],
}

impl<'a> From<&'a PreAuthRequest> for PreAuthPayload<'a> {
    fn from(request: &'a PreAuthRequest) -> Self {
        Self {
            member: MemberPayload::from(&request.subscriber),
            service_date: request.service_date,
            service_type: &request.service_type,
            provider_npi: request.rendering_provider.as_str(),
            diagnosis_codes: &request.diagnosis_codes,
            procedure_codes: &request.procedure_codes,
            estimated_cost: request.estimated_cost.amount(),
            urgency: request.urgency,
            clinical_notes: request.clinical_notes.as_deref(),
            supporting_documents: &request.supporting_documents,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PreAuthReply {
    #[serde(default, alias = "authorization_number", alias = "preauth_number")]
    pub pre_auth_number: Option<String>,
    pub status: String,
    #[serde(default, alias = "approved_amount")]
    pub approval_amount: Option<Decimal>,
    #[serde(default)]
    pub denial_reason: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default, alias = "expires_on")]
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ChargePayload<'a> {
    pub procedure_code: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub units: u32,
    pub service_date: NaiveDate,
}

/// POST `{endpoint}/claims`
#[derive(Debug, Serialize)]
pub struct ClaimPayload<'a> {
    pub claim_number: &'a str,
    #[serde(flatten)]
    pub member: MemberPayload<'a>,
    pub billing_npi: &'a str,
    pub rendering_npi: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_npi: Option<&'a str>,
    pub service_start_date: NaiveDate,
    pub service_end_date: NaiveDate,
    pub place_of_service: &'a str,
    pub diagnosis_codes: &'a [String],
    pub procedure_codes: &'a [String],
    pub charges: Vec<ChargePayload<'a>>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub patient_responsibility: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_auth_number: Option<&'a str>,
}

impl<'a> From<&'a ClaimSubmission> for ClaimPayload<'a> {
    fn from(claim: &'a ClaimSubmission) -> Self {
        Self {
            claim_number: claim.claim_number.as_str(),
            member: MemberPayload::from(&claim.subscriber),
            billing_npi: claim.providers.billing.as_str(),
            rendering_npi: claim.providers.rendering.as_str(),
            facility_npi: claim.providers.facility.as_ref().map(|n| n.as_str()),
            service_start_date: claim.service_period.start(),
            service_end_date: claim.service_period.end(),
            place_of_service: &claim.place_of_service,
            diagnosis_codes: &claim.diagnosis_codes,
            procedure_codes: &claim.procedure_codes,
            charges: claim
                .charges
                .iter()
                .map(|c| ChargePayload {
                    procedure_code: &c.procedure_code,
                    amount: c.amount.amount(),
                    units: c.units,
                    service_date: c.service_date,
                })
                .collect(),
            total_amount: claim.total_amount.amount(),
            patient_responsibility: claim.patient_responsibility.amount(),
            pre_auth_number: claim.pre_auth_number.as_ref().map(|n| n.as_str()),
        }
    }
}

/// Reply to a claim submission or a status query
#[derive(Debug, Deserialize)]
pub struct ClaimReply {
    pub status: String,
    #[serde(default, alias = "claim_id", alias = "payer_claim_number")]
    pub payer_claim_id: Option<String>,
    #[serde(default)]
    pub approved_amount: Option<Decimal>,
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    #[serde(default)]
    pub denial_reason: Option<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

pub fn usd(amount: Option<Decimal>) -> Option<Money> {
    amount.map(|a| Money::new(a, Currency::USD))
}
