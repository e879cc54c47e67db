//! 837 professional claim

use chrono::{DateTime, Utc};

use core_kernel::{ClaimNumber, Currency, DateRange, Money, Npi, PreAuthNumber};
use domain_claims::{ClaimCharge, ClaimSubmission, ProviderNpis};
use domain_eligibility::Subscriber;
use payer_registry::InsuranceProvider;

use crate::codec::{bht, hl, payer_id, Direction, X12Codec};
use crate::control::ControlNumber;
use crate::eligibility::{dmg, member_name, read_demographics};
use crate::elements::{
    diagnosis_from_x12, format_d8, format_rd8, hi_codes, nm1_organization, nm1_person,
    parse_amount, parse_d8, parse_rd8, read_hi_codes, D8, RD8,
};
use crate::envelope::{Interchange, Transaction, TransactionSet};
use crate::error::EdiError;
use crate::segment::Segment;

const DIAGNOSIS_QUALIFIERS: [&str; 2] = ["ABK", "ABF"];
const PROCEDURE_QUALIFIERS: [&str; 2] = ["BBR", "BBQ"];

impl X12Codec {
    /// Encodes a professional claim (837P)
    pub fn build_claim(
        &self,
        claim: &ClaimSubmission,
        provider: &InsuranceProvider,
        submitted_at: DateTime<Utc>,
    ) -> Result<String, EdiError> {
        let payer = payer_id(provider)?;
        let control = ControlNumber::derive(&claim.subscriber.patient_id, submitted_at);
        let submitter = self.submitter();
        let npis = &claim.providers;

        let mut body = vec![
            bht("0019", "00", claim.claim_number.as_str(), submitted_at).push("CH"),
            nm1_organization("41", &submitter.name, "46", &submitter.id),
            nm1_organization("40", &provider.name, "46", payer),
            hl(1, None, "20", true),
            nm1_organization("85", &submitter.name, "XX", npis.billing.as_str()),
            hl(2, Some(1), "22", false),
            Segment::new("SBR")
                .push("P")
                .push("18")
                .push(claim.subscriber.policy_number.clone())
                .set(9, "CI"),
            member_name(&claim.subscriber),
        ];
        if let Some(demographics) = &claim.subscriber.demographics {
            body.push(dmg(demographics));
        }
        body.push(nm1_organization("PR", &provider.name, "PI", payer));

        body.push(
            Segment::new("CLM")
                .push(claim.claim_number.as_str())
                .push(claim.total_amount.to_x12())
                .push("")
                .push("")
                .push_composite([claim.place_of_service.as_str(), "B", "1"])
                .push("Y")
                .push("A")
                .push("Y")
                .push("Y"),
        );
        if let Some(pre_auth) = &claim.pre_auth_number {
            body.push(Segment::new("REF").push("G1").push(pre_auth.as_str()));
        }
        body.push(Segment::new("REF").push("EA").push(claim.subscriber.patient_id.clone()));
        body.push(
            Segment::new("DTP")
                .push("434")
                .push(RD8)
                .push(format_rd8(&claim.service_period)),
        );
        if !claim.patient_responsibility.is_zero() {
            body.push(Segment::new("AMT").push("F5").push(claim.patient_responsibility.to_x12()));
        }
        body.extend(hi_codes("ABK", "ABF", &claim.diagnosis_codes));
        body.extend(hi_codes("BBR", "BBQ", &claim.procedure_codes));

        body.push(nm1_person("82", None, None, "XX", npis.rendering.as_str()));
        if let Some(facility) = &npis.facility {
            body.push(nm1_organization("77", &submitter.name, "XX", facility.as_str()));
        }

        for (index, charge) in claim.charges.iter().enumerate() {
            body.push(Segment::new("LX").push((index + 1).to_string()));
            body.push(
                Segment::new("SV1")
                    .push_composite(["HC", charge.procedure_code.as_str()])
                    .push(charge.amount.to_x12())
                    .push("UN")
                    .push(charge.units.to_string())
                    .set(7, "1"),
            );
            body.push(
                Segment::new("DTP")
                    .push("472")
                    .push(D8)
                    .push(format_d8(charge.service_date)),
            );
        }

        self.seal(
            provider,
            Direction::Outbound,
            TransactionSet::ProfessionalClaim,
            control,
            submitted_at,
            body,
        )
    }

    /// Decodes a professional claim (837P); amounts are read as USD
    pub fn parse_claim(&self, raw: &str) -> Result<ClaimSubmission, EdiError> {
        let interchange = Interchange::parse(raw)?;
        let tx = interchange.transaction(TransactionSet::ProfessionalClaim)?;

        let clm = tx.find("CLM").ok_or_else(|| EdiError::missing("CLM"))?;
        let claim_number = ClaimNumber::new(clm.get(1)).map_err(|e| EdiError::malformed(e.to_string()))?;
        let total_amount = parse_amount(clm.get(2), Currency::USD)?;
        let place_of_service = clm.component(5, 1).to_string();

        let subscriber = read_claim_subscriber(&tx)?;
        let providers = ProviderNpis {
            billing: read_npi(&tx, "85")?,
            rendering: read_npi(&tx, "82")?,
            facility: match tx.find_qualified("NM1", "77") {
                Some(_) => Some(read_npi(&tx, "77")?),
                None => None,
            },
        };

        let period = tx.require_qualified("DTP", "434")?;
        let service_period = match period.get(2) {
            RD8 => parse_rd8(period.get(3)),
            _ => parse_d8(period.get(3)).map(|d| (d, d)),
        }
        .ok_or_else(|| EdiError::malformed("DTP*434 is not a date range"))
        .and_then(|(start, end)| {
            DateRange::new(start, end).map_err(|e| EdiError::malformed(e.to_string()))
        })?;

        let patient_responsibility = match tx.find_qualified("AMT", "F5") {
            Some(amt) => parse_amount(amt.get(2), Currency::USD)?,
            None => Money::zero(Currency::USD),
        };
        let pre_auth_number = tx
            .find_qualified("REF", "G1")
            .map(|r| PreAuthNumber::new(r.get(2)).map_err(|e| EdiError::malformed(e.to_string())))
            .transpose()?;

        let mut diagnosis_codes = Vec::new();
        let mut procedure_codes = Vec::new();
        for (_, hi) in tx.iter().filter(|(_, s)| s.id() == "HI") {
            diagnosis_codes.extend(
                read_hi_codes(hi, &DIAGNOSIS_QUALIFIERS)
                    .iter()
                    .map(|c| diagnosis_from_x12(c)),
            );
            procedure_codes.extend(read_hi_codes(hi, &PROCEDURE_QUALIFIERS));
        }

        let charges = read_service_lines(&tx, service_period)?;

        Ok(ClaimSubmission {
            claim_number,
            subscriber,
            providers,
            service_period,
            place_of_service,
            diagnosis_codes,
            procedure_codes,
            charges,
            total_amount,
            patient_responsibility,
            pre_auth_number,
        })
    }
}

fn read_npi(tx: &Transaction<'_>, entity: &str) -> Result<Npi, EdiError> {
    let nm1 = tx.require_qualified("NM1", entity)?;
    Npi::new(nm1.get(9)).map_err(|e| EdiError::malformed(e.to_string()))
}

fn read_claim_subscriber(tx: &Transaction<'_>) -> Result<Subscriber, EdiError> {
    let sbr = tx.find("SBR").ok_or_else(|| EdiError::missing("SBR"))?;
    let member = tx.require_qualified("NM1", "IL")?;
    let patient = tx.require_qualified("REF", "EA")?;

    Ok(Subscriber {
        patient_id: patient.get(2).to_string(),
        policy_number: sbr.get(3).to_string(),
        policy_holder_id: member.get(9).to_string(),
        demographics: read_demographics(tx, member)?,
    })
}

/// LX / SV1 / DTP*472 loops; a line without a date takes the period start
fn read_service_lines(tx: &Transaction<'_>, period: DateRange) -> Result<Vec<ClaimCharge>, EdiError> {
    let mut charges: Vec<ClaimCharge> = Vec::new();
    let mut in_line = false;
    for (_, segment) in tx.iter() {
        match segment.id() {
            "LX" => in_line = true,
            "SV1" if in_line => {
                let amount = parse_amount(segment.get(2), Currency::USD)?;
                let units = match segment.value(4) {
                    Some(units) => units
                        .parse::<f64>()
                        .ok()
                        .filter(|u| *u >= 1.0)
                        .map(|u| u as u32)
                        .ok_or_else(|| EdiError::malformed(format!("SV104 '{units}' is not a unit count")))?,
                    None => 1,
                };
                charges.push(
                    ClaimCharge::new(segment.component(1, 2), amount, period.start()).with_units(units),
                );
            }
            "DTP" if in_line && segment.get(1) == "472" => {
                let date = parse_d8(segment.get(3))
                    .ok_or_else(|| EdiError::malformed("DTP*472 is not a date"))?;
                if let Some(line) = charges.last_mut() {
                    line.service_date = date;
                }
            }
            _ => {}
        }
    }
    Ok(charges)
}
