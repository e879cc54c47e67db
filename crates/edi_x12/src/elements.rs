//! Element formatting shared by the transaction sets

use chrono::NaiveDate;

use core_kernel::{canonical_diagnosis, Currency, DateRange, Money};

use crate::error::EdiError;
use crate::segment::{sanitize_text, Segment};

/// Date format qualifier for a single date
pub const D8: &str = "D8";
/// Date format qualifier for a date range
pub const RD8: &str = "RD8";

/// NM103 width for organisation names
const NAME_WIDTH: usize = 60;

pub fn format_d8(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn parse_d8(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y%m%d").ok()
}

pub fn format_rd8(range: &DateRange) -> String {
    format!("{}-{}", format_d8(range.start()), format_d8(range.end()))
}

/// Parses `CCYYMMDD-CCYYMMDD` without enforcing the order of the two dates
pub fn parse_rd8(value: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = value.trim().split_once('-')?;
    Some((parse_d8(start)?, parse_d8(end)?))
}

/// Reads a DTP segment as a range; a D8 value yields a one-day range
pub fn dtp_dates(segment: &Segment) -> Option<(NaiveDate, NaiveDate)> {
    match segment.get(2) {
        D8 => parse_d8(segment.get(3)).map(|d| (d, d)),
        RD8 => parse_rd8(segment.get(3)),
        _ => None,
    }
}

/// ICD-10 codes travel without the decimal point
pub fn diagnosis_to_x12(code: &str) -> String {
    code.trim().replace('.', "").to_ascii_uppercase()
}

/// Restores the ICD-10 decimal point after the category; values that are
/// not ICD-10 shaped pass through trimmed
pub fn diagnosis_from_x12(code: &str) -> String {
    canonical_diagnosis(code).unwrap_or_else(|| code.trim().to_string())
}

pub fn parse_amount(value: &str, currency: Currency) -> Result<Money, EdiError> {
    Money::from_x12(value, currency).map_err(|e| EdiError::malformed(e.to_string()))
}

/// NM1 for an organisation identified by a qualified id
pub fn nm1_organization(entity: &str, name: &str, qualifier: &str, id: &str) -> Segment {
    Segment::new("NM1")
        .push(entity)
        .push("2")
        .push(sanitize_text(name, NAME_WIDTH))
        .set(8, qualifier)
        .push(id)
}

/// NM1 for a person, names optional
pub fn nm1_person(
    entity: &str,
    last: Option<&str>,
    first: Option<&str>,
    qualifier: &str,
    id: &str,
) -> Segment {
    Segment::new("NM1")
        .push(entity)
        .push("1")
        .push(last.map(|n| sanitize_text(n, NAME_WIDTH)).unwrap_or_default())
        .push(first.map(|n| sanitize_text(n, 35)).unwrap_or_default())
        .set(8, qualifier)
        .push(id)
}

/// HI segment listing codes under a principal and an additional qualifier
pub fn hi_codes(principal: &str, additional: &str, codes: &[String]) -> Option<Segment> {
    let (first, rest) = codes.split_first()?;
    let mut segment = Segment::new("HI").push_composite([principal.to_string(), diagnosis_to_x12(first)]);
    for code in rest {
        segment = segment.push_composite([additional.to_string(), diagnosis_to_x12(code)]);
    }
    Some(segment)
}

/// Reads every composite of an HI segment whose qualifier is in `qualifiers`
pub fn read_hi_codes(segment: &Segment, qualifiers: &[&str]) -> Vec<String> {
    (1..=segment.len())
        .filter(|&i| qualifiers.contains(&segment.component(i, 1)))
        .map(|i| segment.component(i, 2).to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_d8(date), "20240229");
        assert_eq!(parse_d8("20240229"), Some(date));
        assert_eq!(parse_d8("20240230"), None);
        assert_eq!(parse_rd8("20240101-20241231").map(|(s, _)| s), NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_diagnosis_codes() {
        assert_eq!(diagnosis_to_x12("j45.909"), "J45909");
        assert_eq!(diagnosis_from_x12("J45909"), "J45.909");
        assert_eq!(diagnosis_from_x12("I10"), "I10");
        assert_eq!(diagnosis_from_x12("ZZ-TOP"), "ZZ-TOP");
    }

    #[test]
    fn test_hi_segment() {
        let codes = vec!["E11.9".to_string(), "I10".to_string()];
        let hi = hi_codes("ABK", "ABF", &codes).unwrap();
        assert_eq!(hi.to_string(), "HI|ABK:E119|ABF:I10");
        assert_eq!(read_hi_codes(&hi, &["ABK", "ABF"]), vec!["E119", "I10"]);
        assert!(hi_codes("ABK", "ABF", &[]).is_none());
    }

    #[test]
    fn test_nm1_shapes() {
        let payer = nm1_organization("PR", "Blue Cross", "PI", "BCBS001");
        assert_eq!(payer.to_string(), "NM1|PR|2|Blue Cross|||||PI|BCBS001");

        let member = nm1_person("IL", Some("DOE"), Some("JANE"), "MI", "MBR-1");
        assert_eq!(member.to_string(), "NM1|IL|1|DOE|JANE||||MI|MBR-1");
    }
}
