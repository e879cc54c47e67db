//! 278 health care services review (request and response)

use chrono::{DateTime, Utc};
use tracing::warn;

use core_kernel::{Currency, Money, Npi, PreAuthNumber, ProviderId};
use domain_preauth::{PreAuthRequest, PreAuthResponse, PreAuthStatus, Urgency};
use payer_registry::InsuranceProvider;

use crate::codec::{bht, hl, payer_id, Direction, X12Codec};
use crate::control::ControlNumber;
use crate::eligibility::{dmg, member_name, read_subscriber};
use crate::elements::{
    diagnosis_from_x12, format_d8, hi_codes, nm1_organization, parse_amount, parse_d8,
    read_hi_codes, D8,
};
use crate::envelope::{Interchange, TransactionSet};
use crate::error::EdiError;
use crate::segment::{sanitize_text, Segment};

/// MSG01 width
const MESSAGE_WIDTH: usize = 264;

/// HCR01 action code for a status
fn action_code(status: PreAuthStatus) -> &'static str {
    match status {
        PreAuthStatus::Approved => "A1",
        PreAuthStatus::PartiallyApproved => "A2",
        PreAuthStatus::Denied => "A3",
        PreAuthStatus::ReviewPending | PreAuthStatus::Requested => "A4",
        PreAuthStatus::Cancelled | PreAuthStatus::Expired => "C",
    }
}

/// Status for an HCR01 action code; `None` when the code is unknown
fn status_from_action(code: &str) -> Option<PreAuthStatus> {
    let status = match code {
        "A1" => PreAuthStatus::Approved,
        "A2" | "A6" => PreAuthStatus::PartiallyApproved,
        "A3" => PreAuthStatus::Denied,
        "A4" | "CT" => PreAuthStatus::ReviewPending,
        "C" => PreAuthStatus::Cancelled,
        _ => return None,
    };
    Some(status)
}

impl X12Codec {
    /// Encodes a services review request (278)
    ///
    /// The estimated cost travels on the first service line.
    pub fn build_prior_auth_request(
        &self,
        request: &PreAuthRequest,
        provider: &InsuranceProvider,
        submitted_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let control = ControlNumber::derive(&request.subscriber.patient_id, submitted_at);
        let reference = control.to_string();
        let subscriber = &request.subscriber;

        let mut body = vec![
            bht("0007", "13", &reference, submitted_at),
            hl(1, None, "20", true),
            nm1_organization("X3", &provider.name, "PI", payer),
            hl(2, Some(1), "21", true),
            nm1_organization("1P", &self.submitter().name, "XX", request.rendering_provider.as_str()),
            hl(3, Some(2), "22", true),
            member_name(subscriber),
            Segment::new("REF").push("IG").push(subscriber.policy_number.clone()),
            Segment::new("REF").push("EJ").push(subscriber.patient_id.clone()),
        ];
        if let Some(demographics) = &subscriber.demographics {
            body.push(dmg(demographics));
        }
        body.push(hl(4, Some(3), "EV", false));
        body.push(Segment::new("TRN").push("1").push(reference).push(self.submitter().id.clone()));
        body.push(
            Segment::new("UM")
                .push("HS")
                .push("I")
                .push(request.service_type.clone())
                .set(6, request.urgency.level_of_service_code()),
        );
        body.push(Segment::new("DTP").push("472").push(D8).push(format_d8(request.service_date)));
        body.extend(hi_codes("ABK", "ABF", &request.diagnosis_codes));

        for document in &request.supporting_documents {
            body.push(
                Segment::new("PWK")
                    .push("OZ")
                    .push("EL")
                    .set(5, "AC")
                    .push(document.clone()),
            );
        }
        if let Some(notes) = &request.clinical_notes {
            let notes = sanitize_text(notes, MESSAGE_WIDTH);
            if !notes.is_empty() {
                body.push(Segment::new("MSG").push(notes));
            }
        }

        for (index, code) in request.procedure_codes.iter().enumerate() {
            let mut line = Segment::new("SV1").push_composite(["HC", code.as_str()]);
            if index == 0 {
                line = line.push(request.estimated_cost.to_x12());
            }
            body.push(line);
        }

        self.seal(
            provider,
            Direction::Outbound,
            TransactionSet::ServicesReview,
            control,
            submitted_at,
            body,
        )
    }

    /// Decodes a services review request (278); the estimated cost is the
    /// sum of the service line amounts, in USD
    pub fn parse_prior_auth_request(&self, raw: &str) -> Result<PreAuthRequest, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::ServicesReview)?;

        let rendering = tx.require_qualified("NM1", "1P")?;
        let rendering_provider =
            Npi::new(rendering.get(9)).map_err(|e| EdiError::malformed(e.to_string()))?;
        let subscriber = read_subscriber(&tx)?;

        let um = tx.find("UM").ok_or_else(|| EdiError::missing("UM"))?;
        let service_date = tx
            .find_qualified("DTP", "472")
            .and_then(|s| parse_d8(s.get(3)))
            .ok_or_else(|| EdiError::missing("DTP*472"))?;

        let mut procedure_codes = Vec::new();
        let mut estimated_cost = Money::zero(Currency::USD);
        let mut supporting_documents = Vec::new();
        let mut diagnosis_codes = Vec::new();
        let mut clinical_notes = None;
        for (_, segment) in tx.iter() {
            match segment.id() {
                "SV1" => {
                    procedure_codes.push(segment.component(1, 2).to_string());
                    if let Some(amount) = segment.value(2) {
                        let amount = parse_amount(amount, Currency::USD)?;
                        estimated_cost = estimated_cost
                            .checked_add(&amount)
                            .map_err(|e| EdiError::malformed(e.to_string()))?;
                    }
                }
                "PWK" => supporting_documents.extend(segment.value(6).map(str::to_string)),
                "HI" => diagnosis_codes.extend(
                    read_hi_codes(segment, &["ABK", "ABF"])
                        .iter()
                        .map(|c| diagnosis_from_x12(c)),
                ),
                "MSG" => clinical_notes = clinical_notes.or(segment.value(1).map(str::to_string)),
                _ => {}
            }
        }

        Ok(PreAuthRequest {
            subscriber,
            service_date,
            service_type: um.get(3).to_string(),
            rendering_provider,
            diagnosis_codes,
            procedure_codes,
            estimated_cost,
            urgency: Urgency::from_level_of_service(um.get(6)),
            clinical_notes,
            supporting_documents,
        })
    }

    /// Encodes a services review decision (278 response) as a payer would
    pub fn build_prior_auth_response(
        &self,
        response: &PreAuthResponse,
        provider: &InsuranceProvider,
        created_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let number = response.pre_auth_number.as_str();
        let control = ControlNumber::derive(number, created_at);

        let mut body = vec![
            bht("0007", "11", &control.to_string(), created_at),
            hl(1, None, "20", true),
            nm1_organization("X3", &provider.name, "PI", payer),
            hl(2, Some(1), "21", true),
            nm1_organization("1P", &self.submitter().name, "46", &self.submitter().id),
            hl(3, Some(2), "22", false),
            Segment::new("TRN").push("2").push(number).push(payer.to_string()),
            Segment::new("HCR").push(action_code(response.status())).push(number),
        ];
        if let Some(expiration) = response.expiration_date {
            body.push(Segment::new("DTP").push("036").push(D8).push(format_d8(expiration)));
        }
        if let Some(amount) = &response.approval_amount {
            body.push(Segment::new("AMT").push("AU").push(amount.to_x12()));
        }
        let messages: Vec<&str> = match response.denial_reason() {
            Some(reason) => vec![reason],
            None => response.conditions.iter().map(String::as_str).collect(),
        };
        for message in messages {
            body.push(Segment::new("MSG").push(sanitize_text(message, MESSAGE_WIDTH)));
        }

        self.seal(
            provider,
            Direction::Inbound,
            TransactionSet::ServicesReview,
            control,
            created_at,
            body,
        )
    }

    /// Decodes a services review decision (278 response)
    ///
    /// An unrecognised HCR action code is read as a denial with the
    /// generic reason.
    pub fn parse_prior_auth_response(
        &self,
        raw: &str,
        provider_id: ProviderId,
    ) -> Result<PreAuthResponse, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::ServicesReview)?;

        let hcr = tx.find("HCR").ok_or_else(|| EdiError::missing("HCR"))?;
        let number = hcr
            .value(2)
            .or_else(|| tx.find_qualified("TRN", "2").and_then(|trn| trn.value(2)))
            .ok_or_else(|| EdiError::missing("HCR02/TRN02"))?;
        let pre_auth_number =
            PreAuthNumber::new(number).map_err(|e| EdiError::malformed(e.to_string()))?;

        let messages: Vec<String> = tx
            .iter()
            .filter(|(_, s)| s.id() == "MSG")
            .filter_map(|(_, s)| s.value(1).map(str::to_string))
            .collect();

        let (status, reason) = match status_from_action(hcr.get(1)) {
            Some(PreAuthStatus::Denied) => (PreAuthStatus::Denied, messages.first().cloned()),
            Some(status) => (status, None),
            None => {
                warn!(
                    provider = %provider_id,
                    action = hcr.get(1),
                    "unknown HCR action code, treating as denied"
                );
                (PreAuthStatus::Denied, None)
            }
        };

        let approval_amount = tx
            .find_qualified("AMT", "AU")
            .map(|amt| parse_amount(amt.get(2), Currency::USD))
            .transpose()?;
        let expiration = match tx.find_qualified("DTP", "036") {
            Some(dtp) => Some(
                parse_d8(dtp.get(3)).ok_or_else(|| EdiError::malformed("DTP*036 is not a date"))?,
            ),
            None => None,
        };

        let conditions = if status == PreAuthStatus::Denied { Vec::new() } else { messages };
        Ok(
            PreAuthResponse::decided(pre_auth_number, provider_id, status, approval_amount, reason)
                .with_conditions(conditions)
                .with_expiration(expiration),
        )
    }
}
