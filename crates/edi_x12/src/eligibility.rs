//! 270 eligibility inquiry and 271 eligibility response

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use core_kernel::{Currency, Npi, ProviderId};
use domain_eligibility::{
    CoverageWindow, Demographics, EligibilityRequest, EligibilityResponse, Gender, Subscriber,
};
use payer_registry::InsuranceProvider;

use crate::codec::{bht, hl, payer_id, Direction, X12Codec};
use crate::control::ControlNumber;
use crate::elements::{
    diagnosis_from_x12, dtp_dates, format_d8, format_rd8, hi_codes, nm1_organization, nm1_person,
    parse_amount, parse_d8, read_hi_codes, D8, RD8,
};
use crate::envelope::{Interchange, ParseIssue, Transaction, TransactionSet};
use crate::error::EdiError;
use crate::segment::{sanitize_text, Segment};

/// EB06 time period qualifier for "remaining"
const REMAINING: &str = "29";

impl X12Codec {
    /// Encodes an eligibility inquiry (270)
    ///
    /// # Errors
    ///
    /// `EdiError::Configuration` when the provider has no payer id.
    pub fn build_eligibility_inquiry(
        &self,
        request: &EligibilityRequest,
        provider: &InsuranceProvider,
        submitted_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let control = ControlNumber::derive(&request.subscriber.patient_id, submitted_at);
        let reference = control.to_string();
        let subscriber = &request.subscriber;

        let mut body = vec![
            bht("0022", "13", &reference, submitted_at),
            hl(1, None, "20", true),
            nm1_organization("PR", &provider.name, "PI", payer),
            hl(2, Some(1), "21", true),
            nm1_organization("1P", &self.submitter().name, "XX", request.rendering_provider.as_str()),
            hl(3, Some(2), "22", false),
            Segment::new("TRN").push("1").push(reference.clone()).push(self.submitter().id.clone()),
            member_name(subscriber),
            Segment::new("REF").push("IG").push(subscriber.policy_number.clone()),
            Segment::new("REF").push("EJ").push(subscriber.patient_id.clone()),
        ];
        if let Some(demographics) = &subscriber.demographics {
            body.push(dmg(demographics));
        }
        body.push(Segment::new("DTP").push("291").push(D8).push(format_d8(request.service_date)));
        body.push(Segment::new("EQ").push(request.service_type.clone()));
        for code in &request.procedure_codes {
            body.push(Segment::new("EQ").push("").push_composite(["HC", code.as_str()]));
        }
        if let Some(hi) = hi_codes("ABK", "ABF", &request.diagnosis_codes) {
            body.push(hi);
        }

        self.seal(
            provider,
            Direction::Outbound,
            TransactionSet::EligibilityInquiry,
            control,
            submitted_at,
            body,
        )
    }

    /// Decodes an eligibility inquiry (270)
    pub fn parse_eligibility_inquiry(&self, raw: &str) -> Result<EligibilityRequest, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::EligibilityInquiry)?;

        let rendering = tx.require_qualified("NM1", "1P")?;
        let rendering_provider =
            Npi::new(rendering.get(9)).map_err(|e| EdiError::malformed(e.to_string()))?;
        let subscriber = read_subscriber(&tx)?;

        let service_date = tx
            .find_qualified("DTP", "291")
            .and_then(|s| parse_d8(s.get(3)))
            .ok_or_else(|| EdiError::missing("DTP*291"))?;

        let inquiries: Vec<&Segment> = tx.segments.iter().filter(|s| s.id() == "EQ").collect();
        let service_type = inquiries
            .iter()
            .find_map(|s| s.value(1))
            .ok_or_else(|| EdiError::missing("EQ"))?
            .to_string();
        let procedure_codes = inquiries
            .iter()
            .filter(|s| s.component(2, 1) == "HC")
            .map(|s| s.component(2, 2).to_string())
            .collect();

        let diagnosis_codes = tx
            .find("HI")
            .map(|hi| read_hi_codes(hi, &["ABK", "ABF"]))
            .unwrap_or_default()
            .iter()
            .map(|c| diagnosis_from_x12(c))
            .collect();

        Ok(EligibilityRequest {
            subscriber,
            service_date,
            service_type,
            rendering_provider,
            diagnosis_codes,
            procedure_codes,
        })
    }

    /// Encodes an eligibility response (271) as a payer would send it
    pub fn build_eligibility_response(
        &self,
        response: &EligibilityResponse,
        provider: &InsuranceProvider,
        member_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let control = ControlNumber::derive(member_id, created_at);
        let reference = control.to_string();

        let mut body = vec![
            bht("0022", "11", &reference, created_at),
            hl(1, None, "20", true),
            nm1_organization("PR", &provider.name, "PI", payer),
            hl(2, Some(1), "21", true),
            nm1_organization("1P", &self.submitter().name, "46", &self.submitter().id),
            hl(3, Some(2), "22", false),
            Segment::new("TRN").push("2").push(reference).push(payer.to_string()),
            nm1_person("IL", None, None, "MI", member_id),
        ];

        let coverage = response.coverage;
        match (coverage.start(), coverage.end()) {
            (Some(start), Some(end)) => {
                if let Ok(range) = core_kernel::DateRange::new(start, end) {
                    body.push(Segment::new("DTP").push("291").push(RD8).push(format_rd8(&range)));
                }
            }
            (Some(start), None) => {
                body.push(Segment::new("DTP").push("346").push(D8).push(format_d8(start)));
            }
            (None, Some(end)) => {
                body.push(Segment::new("DTP").push("347").push(D8).push(format_d8(end)));
            }
            (None, None) => {}
        }

        let mut status = Segment::new("EB")
            .push(if response.eligible { "1" } else { "6" })
            .push("IND")
            .push("30");
        if response.requires_pre_auth {
            status = status.set(11, "Y");
        }
        body.push(status);

        for (code, amount) in [
            ("C", &response.deductible_remaining),
            ("G", &response.out_of_pocket_remaining),
        ] {
            if let Some(amount) = amount {
                body.push(
                    Segment::new("EB")
                        .push(code)
                        .push("IND")
                        .push("30")
                        .set(6, REMAINING)
                        .push(amount.to_x12()),
                );
            }
        }

        for limitation in &response.limitations {
            body.push(Segment::new("EB").push("F").push("IND").push("30"));
            body.push(Segment::new("MSG").push(sanitize_text(limitation, 264)));
        }

        self.seal(
            provider,
            Direction::Inbound,
            TransactionSet::EligibilityResponse,
            control,
            created_at,
            body,
        )
    }

    /// Decodes an eligibility response (271)
    ///
    /// Unknown segments are skipped. Unreadable amounts or dates, inverted
    /// or missing coverage windows and a missing EB segment are recorded as
    /// warnings on the result instead of failing the parse.
    ///
    /// # Errors
    ///
    /// Only when the input is not an interchange or has no 271 set.
    pub fn parse_eligibility_response(
        &self,
        raw: &str,
        provider_id: ProviderId,
    ) -> Result<EligibilityResponse, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::EligibilityResponse)?;
        let mut issues: Vec<ParseIssue> = tx.issues.clone();

        let mut response = EligibilityResponse::new(provider_id, false);
        let mut saw_benefit = false;
        let mut rejected = false;
        let mut last_benefit = String::new();
        let mut start: Option<NaiveDate> = None;
        let mut end: Option<NaiveDate> = None;

        for (position, segment) in tx.iter() {
            match segment.id() {
                "EB" => {
                    saw_benefit = true;
                    last_benefit = segment.get(1).to_string();
                    match segment.get(1) {
                        "1" => response.eligible = true,
                        "C" | "G" if segment.get(6) == REMAINING => {
                            match parse_amount(segment.get(7), Currency::USD) {
                                Ok(amount) if segment.get(1) == "C" => {
                                    response.deductible_remaining = Some(amount)
                                }
                                Ok(amount) => response.out_of_pocket_remaining = Some(amount),
                                Err(e) => issues.push(ParseIssue::new("EB", position, e.to_string())),
                            }
                        }
                        "F" => {
                            if let Some(description) = segment.value(5) {
                                response.limitations.push(description.to_string());
                            }
                        }
                        _ => {}
                    }
                    if segment.get(11) == "Y" {
                        response.requires_pre_auth = true;
                    }
                }
                "MSG" if last_benefit == "F" => {
                    if let Some(text) = segment.value(1) {
                        response.limitations.push(text.to_string());
                    }
                }
                "DTP" => {
                    let qualifier = segment.get(1);
                    if !matches!(qualifier, "291" | "346" | "347" | "356" | "357") {
                        continue;
                    }
                    match dtp_dates(segment) {
                        Some((from, to)) => match qualifier {
                            "291" if segment.get(2) == RD8 => {
                                start = start.or(Some(from));
                                end = end.or(Some(to));
                            }
                            "291" | "346" | "356" => start = start.or(Some(from)),
                            _ => end = end.or(Some(to)),
                        },
                        None => issues.push(ParseIssue::new(
                            "DTP",
                            position,
                            format!("unreadable date '{}'", segment.get(3)),
                        )),
                    }
                }
                "AAA" if segment.get(1) == "N" => {
                    rejected = true;
                    response
                        .limitations
                        .push(format!("Request rejected: {}", reject_reason(segment.get(3))));
                }
                _ => {}
            }
        }

        if !saw_benefit && !rejected {
            issues.push(ParseIssue::new("EB", 0, "no benefit information; eligibility defaulted to false"));
        }

        match CoverageWindow::new(start, end) {
            Ok(window) => response.coverage = window,
            Err(e) => issues.push(ParseIssue::new("DTP", 0, format!("coverage window ignored: {e}"))),
        }
        if response.eligible && !response.coverage.is_known() {
            issues.push(ParseIssue::new("DTP", 0, "coverage dates missing"));
        }

        if !issues.is_empty() {
            warn!(
                provider = %response.provider_id,
                issues = issues.len(),
                "271 response parsed with tolerated issues"
            );
        }
        response.warnings = issues.iter().map(ToString::to_string).collect();
        Ok(response)
    }
}

/// NM1*IL built from the subscriber and its optional demographics
pub(crate) fn member_name(subscriber: &Subscriber) -> Segment {
    let demographics = subscriber.demographics.as_ref();
    nm1_person(
        "IL",
        demographics.map(|d| d.last_name.as_str()),
        demographics.map(|d| d.first_name.as_str()),
        "MI",
        &subscriber.policy_holder_id,
    )
}

pub(crate) fn dmg(demographics: &Demographics) -> Segment {
    Segment::new("DMG")
        .push(D8)
        .push(format_d8(demographics.birth_date))
        .push(demographics.gender.x12_code())
}

/// Reads NM1*IL, REF*IG, REF*EJ and DMG back into a subscriber
pub(crate) fn read_subscriber(tx: &Transaction<'_>) -> Result<Subscriber, EdiError> {
    let member = tx.require_qualified("NM1", "IL")?;
    let policy = tx.require_qualified("REF", "IG")?;
    let patient = tx.require_qualified("REF", "EJ")?;

    Ok(Subscriber {
        patient_id: patient.get(2).to_string(),
        policy_number: policy.get(2).to_string(),
        policy_holder_id: member.get(9).to_string(),
        demographics: read_demographics(tx, member)?,
    })
}

/// Names come from NM1*IL, birth date and gender from DMG
pub(crate) fn read_demographics(
    tx: &Transaction<'_>,
    member: &Segment,
) -> Result<Option<Demographics>, EdiError> {
    let Some(dmg) = tx.find("DMG") else {
        return Ok(None);
    };
    let birth_date =
        parse_d8(dmg.get(2)).ok_or_else(|| EdiError::malformed("DMG02 is not a date"))?;
    Ok(Some(Demographics {
        first_name: member.get(4).to_string(),
        last_name: member.get(3).to_string(),
        birth_date,
        gender: Gender::from_x12(dmg.get(3)),
    }))
}

/// AAA03 reject reason text
fn reject_reason(code: &str) -> String {
    let text = match code {
        "15" => "required application data missing",
        "42" => "unable to respond at current time",
        "43" => "invalid or missing provider identification",
        "58" => "invalid or missing date of birth",
        "72" => "invalid or missing subscriber id",
        "73" => "invalid or missing subscriber name",
        "75" => "subscriber not found",
        "76" => "duplicate subscriber",
        _ => return format!("reason code {code}"),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use payer_registry::{ProtocolStandard, ProviderDefinition};

    fn provider() -> InsuranceProvider {
        let mut def = ProviderDefinition::new(
            "bcbs",
            "Blue Cross",
            "https://edi.example.com",
            vec![ProtocolStandard::Edi270271],
        );
        def.payer_id = Some("BCBS001".to_string());
        InsuranceProvider::from_definition(def, |_| None).unwrap()
    }

    fn codec() -> X12Codec {
        X12Codec::new(crate::Submitter::new("HOSP01", "General Hospital"))
    }

    fn wrap_271(body: &str) -> String {
        format!(
            "ISA*00*          *00*          *ZZ*BCBS001        *ZZ*HOSP01         *240315*1200*^*00501*000000001*0*T*:~\
             GS*HB*BCBS001*HOSP01*20240315*1200*1*X*005010X279A1~ST*271*0001*005010X279A1~{body}SE*99*0001~GE*1*1~IEA*1*000000001~"
        )
    }

    #[test]
    fn test_missing_payer_id_is_configuration_error() {
        let mut def = ProviderDefinition::new("x", "X", "https://x.example.com", vec![ProtocolStandard::Edi270271]);
        def.payer_id = None;
        let provider = InsuranceProvider::from_definition(def, |_| None).unwrap();
        let request = EligibilityRequest::new(
            Subscriber::new("P", "POL", "MBR"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Npi::new("1234567893").unwrap(),
        );
        let err = codec()
            .build_eligibility_inquiry(&request, &provider, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EdiError::Configuration(_)));
    }

    #[test]
    fn test_star_delimited_271() {
        let raw = wrap_271(
            "BHT*0022*11*1*20240315*1200~NM1*PR*2*BCBS*****PI*BCBS001~\
             DTP*346*D8*20240101~DTP*347*D8*20241231~EB*1*IND*30~\
             EB*C*IND*30***29*250.5~EB*G*IND*30***29*1200~EB*F*IND*30~MSG*Visit limit 20 per year~",
        );
        let response = codec()
            .parse_eligibility_response(&raw, provider().id.clone())
            .unwrap();

        assert!(response.eligible);
        assert_eq!(response.coverage.start(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(response.coverage.end(), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(response.deductible_remaining.map(|m| m.to_x12()), Some("250.5".to_string()));
        assert_eq!(response.limitations, vec!["Visit limit 20 per year"]);
        // SE count mismatch is tolerated and flagged
        assert_eq!(response.warnings.len(), 1);
    }

    #[test]
    fn test_unknown_segments_and_bad_amounts_are_tolerated() {
        let raw = wrap_271("ZZZ*whatever~EB*1*IND*30~EB*C*IND*30***29*abc~DTP*291*RD8*20240101-20241231~");
        let response = codec().parse_eligibility_response(&raw, provider().id.clone()).unwrap();
        assert!(response.eligible);
        assert!(response.deductible_remaining.is_none());
        assert!(response.warnings.iter().any(|w| w.starts_with("EB")));
    }

    #[test]
    fn test_missing_coverage_dates_flagged() {
        let raw = wrap_271("EB*1*IND*30**********Y~");
        let response = codec().parse_eligibility_response(&raw, provider().id.clone()).unwrap();
        assert!(response.eligible);
        assert!(response.requires_pre_auth);
        assert!(!response.coverage.is_known());
        assert!(response.warnings.iter().any(|w| w.contains("coverage dates missing")));
    }

    #[test]
    fn test_inverted_coverage_is_dropped_not_fatal() {
        let raw = wrap_271("EB*1*IND*30~DTP*346*D8*20241231~DTP*347*D8*20240101~");
        let response = codec().parse_eligibility_response(&raw, provider().id.clone()).unwrap();
        assert!(!response.coverage.is_known());
        assert!(response.warnings.iter().any(|w| w.contains("coverage window ignored")));
    }

    #[test]
    fn test_inactive_and_rejection() {
        let raw = wrap_271("AAA*N**75*C~EB*6*IND*30~");
        let response = codec().parse_eligibility_response(&raw, provider().id.clone()).unwrap();
        assert!(!response.eligible);
        assert_eq!(response.limitations, vec!["Request rejected: subscriber not found"]);
    }

    #[test]
    fn test_garbage_is_protocol_failure() {
        assert!(codec().parse_eligibility_response("hello", provider().id.clone()).is_err());
    }
}
