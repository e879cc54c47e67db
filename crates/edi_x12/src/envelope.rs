//! ISA/GS/ST envelopes
//!
//! Outbound interchanges carry exactly one functional group with exactly
//! one transaction set. Inbound interchanges may carry more; readers pick
//! the first transaction set of the expected type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::control::ControlNumber;
use crate::error::EdiError;
use crate::segment::{split_segments, Delimiters, Segment};

const ISA_ID_WIDTH: usize = 15;
const ISA_SECURITY_WIDTH: usize = 10;
const TRANSACTION_CONTROL: &str = "0001";

/// ISA15 usage indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UsageIndicator {
    #[serde(rename = "P", alias = "production")]
    Production,
    #[default]
    #[serde(rename = "T", alias = "test")]
    Test,
}

impl UsageIndicator {
    pub fn code(&self) -> &'static str {
        match self {
            UsageIndicator::Production => "P",
            UsageIndicator::Test => "T",
        }
    }
}

/// Transaction set kinds the codec writes and reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionSet {
    EligibilityInquiry,
    EligibilityResponse,
    ProfessionalClaim,
    ServicesReview,
    ClaimStatusInquiry,
    ClaimStatusResponse,
}

impl TransactionSet {
    /// ST01
    pub fn id(&self) -> &'static str {
        match self {
            TransactionSet::EligibilityInquiry => "270",
            TransactionSet::EligibilityResponse => "271",
            TransactionSet::ProfessionalClaim => "837",
            TransactionSet::ServicesReview => "278",
            TransactionSet::ClaimStatusInquiry => "276",
            TransactionSet::ClaimStatusResponse => "277",
        }
    }

    /// GS01 functional identifier code
    pub fn functional_id(&self) -> &'static str {
        match self {
            TransactionSet::EligibilityInquiry => "HS",
            TransactionSet::EligibilityResponse => "HB",
            TransactionSet::ProfessionalClaim => "HC",
            TransactionSet::ServicesReview => "HI",
            TransactionSet::ClaimStatusInquiry => "HR",
            TransactionSet::ClaimStatusResponse => "HN",
        }
    }

    /// GS08 / ST03 implementation guide reference
    pub fn implementation(&self) -> &'static str {
        match self {
            TransactionSet::EligibilityInquiry | TransactionSet::EligibilityResponse => "005010X279A1",
            TransactionSet::ProfessionalClaim => "005010X222A1",
            TransactionSet::ServicesReview => "005010X217",
            TransactionSet::ClaimStatusInquiry | TransactionSet::ClaimStatusResponse => "005010X212",
        }
    }
}

/// Everything needed to wrap one transaction set for transmission
#[derive(Debug, Clone)]
pub struct Envelope<'a> {
    pub sender_id: &'a str,
    pub receiver_id: &'a str,
    pub usage: UsageIndicator,
    pub control: ControlNumber,
    pub created_at: DateTime<Utc>,
    pub transaction: TransactionSet,
}

impl Envelope<'_> {
    /// Wraps transaction body segments (everything between ST and SE)
    pub fn wrap(&self, body: Vec<Segment>, delimiters: &Delimiters) -> String {
        let set = self.transaction;
        let date_long = self.created_at.format("%Y%m%d").to_string();
        let date_short = self.created_at.format("%y%m%d").to_string();
        let time = self.created_at.format("%H%M").to_string();
        let control = self.control.to_string();
        let group = self.control.value().to_string();

        let isa = format!(
            "ISA{e}00{e}{blank}{e}00{e}{blank}{e}ZZ{e}{sender}{e}ZZ{e}{receiver}{e}{date}{e}{time}{e}{rep}{e}00501{e}{control}{e}0{e}{usage}{e}{comp}",
            e = delimiters.element,
            blank = " ".repeat(ISA_SECURITY_WIDTH),
            sender = fixed_width(self.sender_id, ISA_ID_WIDTH),
            receiver = fixed_width(self.receiver_id, ISA_ID_WIDTH),
            date = date_short,
            time = time,
            rep = delimiters.repetition,
            control = control,
            usage = self.usage.code(),
            comp = delimiters.component,
        );

        let mut segments = Vec::with_capacity(body.len() + 5);
        segments.push(
            Segment::new("GS")
                .push(set.functional_id())
                .push(self.sender_id.trim())
                .push(self.receiver_id.trim())
                .push(date_long)
                .push(time)
                .push(group.clone())
                .push("X")
                .push(set.implementation()),
        );
        segments.push(
            Segment::new("ST")
                .push(set.id())
                .push(TRANSACTION_CONTROL)
                .push(set.implementation()),
        );
        let body_len = body.len();
        segments.extend(body);
        segments.push(
            Segment::new("SE")
                .push((body_len + 2).to_string())
                .push(TRANSACTION_CONTROL),
        );
        segments.push(Segment::new("GE").push("1").push(group));
        segments.push(Segment::new("IEA").push("1").push(control));

        let mut out = isa;
        out.push(delimiters.segment);
        for segment in segments {
            out.push_str(&segment.render(delimiters));
            out.push(delimiters.segment);
        }
        out
    }
}

/// Pads or truncates an ISA identifier to its fixed width
pub fn fixed_width(value: &str, width: usize) -> String {
    let truncated: String = value.trim().chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// Problem tolerated while reading a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub segment: String,
    /// 1-based position of the segment within the transaction set
    pub position: usize,
    pub message: String,
}

impl ParseIssue {
    pub fn new(segment: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            segment: segment.to_string(),
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at segment {}: {}", self.segment, self.position, self.message)
    }
}

/// A parsed interchange
#[derive(Debug, Clone)]
pub struct Interchange {
    pub delimiters: Delimiters,
    pub sender_id: String,
    pub receiver_id: String,
    pub control_number: String,
    pub usage: String,
    segments: Vec<Segment>,
}

impl Interchange {
    pub fn parse(raw: &str) -> Result<Self, EdiError> {
        let delimiters = Delimiters::detect(raw)?;
        let segments = split_segments(raw, &delimiters);
        let isa = segments
            .first()
            .filter(|s| s.id() == "ISA")
            .ok_or_else(|| EdiError::missing("ISA"))?;
        if isa.len() < 16 {
            return Err(EdiError::malformed(format!(
                "ISA has {} elements, expected 16",
                isa.len()
            )));
        }

        Ok(Self {
            delimiters,
            sender_id: isa.get(6).trim().to_string(),
            receiver_id: isa.get(8).trim().to_string(),
            control_number: isa.get(13).trim().to_string(),
            usage: isa.get(15).trim().to_string(),
            segments,
        })
    }

    /// Returns the first transaction set with the given type
    pub fn transaction(&self, set: TransactionSet) -> Result<Transaction<'_>, EdiError> {
        let start = self
            .segments
            .iter()
            .position(|s| s.id() == "ST" && s.get(1) == set.id())
            .ok_or_else(|| EdiError::missing(format!("ST*{}", set.id())))?;

        let mut issues = Vec::new();
        let end = match self.segments[start..].iter().position(|s| s.id() == "SE") {
            Some(offset) => start + offset,
            None => {
                issues.push(ParseIssue::new("SE", 0, "transaction set is not terminated"));
                self.segments.len()
            }
        };

        if let Some(se) = self.segments.get(end).filter(|s| s.id() == "SE") {
            let expected = end - start + 1;
            if se.get(1).parse::<usize>().ok() != Some(expected) {
                issues.push(ParseIssue::new(
                    "SE",
                    expected,
                    format!("segment count {} does not match {}", se.get(1), expected),
                ));
            }
        }

        Ok(Transaction {
            segments: &self.segments[start + 1..end],
            issues,
        })
    }
}

/// Body of one transaction set, ST and SE excluded
#[derive(Debug)]
pub struct Transaction<'a> {
    pub segments: &'a [Segment],
    pub issues: Vec<ParseIssue>,
}

impl<'a> Transaction<'a> {
    /// Segments with their 1-based position within the set (ST is 1)
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Segment)> {
        let segments = self.segments;
        segments.iter().enumerate().map(|(i, s)| (i + 2, s))
    }

    pub fn find(&self, id: &str) -> Option<&'a Segment> {
        let segments = self.segments;
        segments.iter().find(|s| s.id() == id)
    }

    /// First segment with the given id and first element
    pub fn find_qualified(&self, id: &str, qualifier: &str) -> Option<&'a Segment> {
        let segments = self.segments;
        segments
            .iter()
            .find(|s| s.id() == id && s.get(1) == qualifier)
    }

    pub fn require_qualified(&self, id: &str, qualifier: &str) -> Result<&'a Segment, EdiError> {
        self.find_qualified(id, qualifier)
            .ok_or_else(|| EdiError::missing(format!("{id}*{qualifier}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn envelope(control: u32) -> Envelope<'static> {
        Envelope {
            sender_id: "HOSPITAL01",
            receiver_id: "BCBS001",
            usage: UsageIndicator::Test,
            control: ControlNumber::new(control).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap(),
            transaction: TransactionSet::EligibilityInquiry,
        }
    }

    #[test]
    fn test_isa_is_fixed_width() {
        let raw = envelope(7).wrap(vec![Segment::new("BHT").push("0022")], &Delimiters::default());
        let isa = raw.split('~').next().unwrap();
        assert_eq!(isa.len(), 105);
        assert!(isa.contains("|000000007|0|T|:"));
        assert!(isa.contains("|ZZ|BCBS001        |240315|0930|^|"));
    }

    #[test]
    fn test_round_trip_envelope() {
        let raw = envelope(123).wrap(
            vec![Segment::new("BHT").push("0022"), Segment::new("HL").push("1")],
            &Delimiters::default(),
        );
        let interchange = Interchange::parse(&raw).unwrap();
        assert_eq!(interchange.sender_id, "HOSPITAL01");
        assert_eq!(interchange.receiver_id, "BCBS001");
        assert_eq!(interchange.control_number, "000000123");

        let tx = interchange.transaction(TransactionSet::EligibilityInquiry).unwrap();
        assert_eq!(tx.segments.len(), 2);
        assert!(tx.issues.is_empty());
        assert_eq!(tx.iter().next().map(|(pos, _)| pos), Some(2));
    }

    #[test]
    fn test_wrong_transaction_type() {
        let raw = envelope(1).wrap(Vec::new(), &Delimiters::default());
        let interchange = Interchange::parse(&raw).unwrap();
        assert!(matches!(
            interchange.transaction(TransactionSet::ClaimStatusResponse),
            Err(EdiError::MissingSegment(_))
        ));
    }

    #[test]
    fn test_bad_segment_count_is_flagged() {
        let raw = envelope(1)
            .wrap(vec![Segment::new("BHT")], &Delimiters::default())
            .replace("SE|3|0001", "SE|9|0001");
        let interchange = Interchange::parse(&raw).unwrap();
        let tx = interchange.transaction(TransactionSet::EligibilityInquiry).unwrap();
        assert_eq!(tx.issues.len(), 1);
    }

    #[test]
    fn test_fixed_width_truncates() {
        assert_eq!(fixed_width("ABCDEFGHIJKLMNOPQRS", 15), "ABCDEFGHIJKLMNO");
        assert_eq!(fixed_width("AB", 4), "AB  ");
    }
}
