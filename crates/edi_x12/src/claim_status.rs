//! 276 claim status inquiry and 277 claim status response

use chrono::{DateTime, NaiveTime, Utc};

use core_kernel::{ClaimNumber, Currency, ProviderId};
use domain_claims::{ClaimResponse, ClaimStatus};
use payer_registry::InsuranceProvider;

use crate::codec::{bht, hl, payer_id, Direction, X12Codec};
use crate::control::ControlNumber;
use crate::elements::{format_d8, nm1_organization, parse_amount, parse_d8};
use crate::envelope::{Interchange, TransactionSet};
use crate::error::EdiError;
use crate::segment::{sanitize_text, Segment};

/// STC12 width
const FREE_TEXT_WIDTH: usize = 264;

/// STC01 category and status code written for a claim status
///
/// `Appealed` and `Cancelled` have no category of their own and read back
/// as `Processing` and `Denied`.
fn status_category(status: ClaimStatus) -> (&'static str, &'static str) {
    match status {
        ClaimStatus::Submitted => ("A1", "20"),
        ClaimStatus::Processing => ("P1", "20"),
        ClaimStatus::Approved => ("F0", "3"),
        ClaimStatus::Paid => ("F1", "65"),
        ClaimStatus::Denied => ("F2", "88"),
        ClaimStatus::PartiallyApproved => ("F3", "3"),
        ClaimStatus::Appealed => ("P2", "20"),
        ClaimStatus::Cancelled => ("A8", "20"),
    }
}

fn status_from_category(category: &str) -> Option<ClaimStatus> {
    let status = match category {
        "A0" | "A1" | "A2" => ClaimStatus::Submitted,
        "A3" | "A4" | "A6" | "A7" | "A8" => ClaimStatus::Denied,
        "F0" => ClaimStatus::Approved,
        "F1" => ClaimStatus::Paid,
        "F2" | "F4" => ClaimStatus::Denied,
        "F3" => ClaimStatus::PartiallyApproved,
        "D0" => ClaimStatus::Denied,
        c if c.starts_with('P') || c.starts_with('R') => ClaimStatus::Processing,
        c if c.starts_with('E') => ClaimStatus::Denied,
        _ => return None,
    };
    Some(status)
}

impl X12Codec {
    /// Encodes a claim status inquiry (276) for a previously submitted claim
    pub fn build_claim_status_inquiry(
        &self,
        claim_number: &ClaimNumber,
        provider: &InsuranceProvider,
        submitted_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let control = ControlNumber::derive(claim_number.as_str(), submitted_at);

        let body = vec![
            bht("0010", "13", &control.to_string(), submitted_at),
            hl(1, None, "20", true),
            nm1_organization("PR", &provider.name, "PI", payer),
            hl(2, Some(1), "21", true),
            nm1_organization("41", &self.submitter().name, "46", &self.submitter().id),
            hl(3, Some(2), "22", false),
            Segment::new("NM1").push("IL").push("1"),
            Segment::new("TRN").push("1").push(claim_number.as_str()),
        ];

        self.seal(
            provider,
            Direction::Outbound,
            TransactionSet::ClaimStatusInquiry,
            control,
            submitted_at,
            body,
        )
    }

    /// Reads the claim number back out of a 276
    pub fn parse_claim_status_inquiry(&self, raw: &str) -> Result<ClaimNumber, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::ClaimStatusInquiry)?;
        let trn = tx.require_qualified("TRN", "1")?;
        ClaimNumber::new(trn.get(2)).map_err(|e| EdiError::malformed(e.to_string()))
    }

    /// Encodes a claim status response (277) as a payer would
    pub fn build_claim_status_response(
        &self,
        response: &ClaimResponse,
        provider: &InsuranceProvider,
        created_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let control = ControlNumber::derive(response.claim_number.as_str(), created_at);
        let (category, code) = status_category(response.status);

        let mut stc = Segment::new("STC")
            .push_composite([category, code])
            .push(format_d8(response.received_at.date_naive()));
        if let Some(approved) = &response.approved_amount {
            stc = stc.set(4, approved.to_x12());
        }
        if let Some(paid) = &response.paid_amount {
            stc = stc.set(5, paid.to_x12());
        }
        let text = response
            .denial_reason
            .as_deref()
            .or_else(|| response.messages.first().map(String::as_str));
        if let Some(text) = text {
            stc = stc.set(12, sanitize_text(text, FREE_TEXT_WIDTH));
        }

        let mut body = vec![
            bht("0010", "08", &control.to_string(), created_at),
            hl(1, None, "20", true),
            nm1_organization("PR", &provider.name, "PI", payer),
            hl(2, Some(1), "21", true),
            nm1_organization("41", &self.submitter().name, "46", &self.submitter().id),
            hl(3, Some(2), "22", false),
            Segment::new("NM1").push("IL").push("1"),
            Segment::new("TRN").push("2").push(response.claim_number.as_str()),
            stc,
        ];
        if let Some(id) = &response.payer_claim_id {
            body.push(Segment::new("REF").push("1K").push(id.clone()));
        }

        self.seal(
            provider,
            Direction::Inbound,
            TransactionSet::ClaimStatusResponse,
            control,
            created_at,
            body,
        )
    }

    /// Decodes a claim status response (277)
    ///
    /// STC04 is read as the approved amount and STC05 as the paid amount.
    /// STC12 becomes the denial reason for denied claims and a message
    /// otherwise.
    ///
    /// # Errors
    ///
    /// `EdiError::Malformed` when the STC category is not recognised.
    pub fn parse_claim_status_response(
        &self,
        raw: &str,
        provider_id: ProviderId,
    ) -> Result<ClaimResponse, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::ClaimStatusResponse)?;

        let trn = tx.require_qualified("TRN", "2")?;
        let claim_number =
            ClaimNumber::new(trn.get(2)).map_err(|e| EdiError::malformed(e.to_string()))?;

        let stc = tx.find("STC").ok_or_else(|| EdiError::missing("STC"))?;
        let category = stc.component(1, 1);
        let status = status_from_category(category)
            .ok_or_else(|| EdiError::malformed(format!("unknown claim status category '{category}'")))?;

        let mut response = ClaimResponse::new(claim_number, provider_id, status);
        if let Some(date) = stc.value(2).and_then(parse_d8) {
            response.received_at = date.and_time(NaiveTime::MIN).and_utc();
        }
        if let Some(amount) = stc.value(4) {
            response.approved_amount = Some(parse_amount(amount, Currency::USD)?);
        }
        if let Some(amount) = stc.value(5) {
            response.paid_amount = Some(parse_amount(amount, Currency::USD)?);
        }
        if let Some(text) = stc.value(12) {
            if status == ClaimStatus::Denied {
                response.denial_reason = Some(text.to_string());
            } else {
                response.messages.push(text.to_string());
            }
        }
        if let Some(reference) = tx.find_qualified("REF", "1K").and_then(|r| r.value(2)) {
            response.payer_claim_id = Some(reference.to_string());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(status_from_category("A1"), Some(ClaimStatus::Submitted));
        assert_eq!(status_from_category("P3"), Some(ClaimStatus::Processing));
        assert_eq!(status_from_category("R4"), Some(ClaimStatus::Processing));
        assert_eq!(status_from_category("E1"), Some(ClaimStatus::Denied));
        assert_eq!(status_from_category("F3"), Some(ClaimStatus::PartiallyApproved));
        assert_eq!(status_from_category("Q9"), None);
    }

    #[test]
    fn test_lossy_categories() {
        let (appealed, _) = status_category(ClaimStatus::Appealed);
        assert_eq!(status_from_category(appealed), Some(ClaimStatus::Processing));
        let (cancelled, _) = status_category(ClaimStatus::Cancelled);
        assert_eq!(status_from_category(cancelled), Some(ClaimStatus::Denied));
    }
}
