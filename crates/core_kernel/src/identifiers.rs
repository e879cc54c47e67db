//! Strongly-typed identifiers used across the gateway
//!
//! Payer-facing identifiers are short codes rather than UUIDs, so each
//! newtype validates its own lexical rules on construction and refuses the
//! characters that would corrupt an X12 segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters that may never appear inside an identifier because the EDI
/// codec uses them as delimiters on input or output
pub const RESERVED_CHARACTERS: &[char] = &['|', '*', '~', ':', '^', '\n', '\r'];

/// Errors raised when an identifier fails its lexical rules
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} exceeds {max} characters")]
    TooLong { kind: &'static str, max: usize },

    #[error("{kind} contains reserved character {character:?}")]
    ReservedCharacter { kind: &'static str, character: char },

    #[error("Invalid NPI {value}: {reason}")]
    InvalidNpi { value: String, reason: String },

    #[error("diagnosis code {value:?} is not an ICD-10 code")]
    InvalidDiagnosis { value: String },

    #[error("diagnosis code {value:?} must be written {expected:?}")]
    NonCanonicalDiagnosis { value: String, expected: String },
}

/// Checks a free-form value that will be written into a single X12 element
///
/// Used for the identifier newtypes below and for caller-supplied fields
/// such as policy numbers and medical codes.
pub fn check_element(kind: &'static str, value: &str, max: usize) -> Result<(), IdentifierError> {
    if value.trim().is_empty() {
        return Err(IdentifierError::Empty { kind });
    }
    if value.chars().count() > max {
        return Err(IdentifierError::TooLong { kind, max });
    }
    if let Some(character) = value.chars().find(|c| RESERVED_CHARACTERS.contains(c)) {
        return Err(IdentifierError::ReservedCharacter { kind, character });
    }
    Ok(())
}

/// Checks every entry of a medical code list (ICD-10, CPT/HCPCS)
pub fn check_codes(kind: &'static str, codes: &[String]) -> Result<(), IdentifierError> {
    codes.iter().try_for_each(|code| check_element(kind, code, MAX_CODE_LEN))
}

/// Widest code accepted in a composite HI or SV1 element
pub const MAX_CODE_LEN: usize = 30;

/// ICD-10 category length; the decimal point follows it
const ICD10_CATEGORY_LEN: usize = 3;

/// Longest ICD-10-CM code without its decimal point
const ICD10_MAX_LEN: usize = 7;

/// Canonical spelling of an ICD-10 code: upper case, dotted after the
/// category when there is a subcategory
///
/// Returns `None` when the value cannot be an ICD-10 code at all.
pub fn canonical_diagnosis(code: &str) -> Option<String> {
    let bare: String = code.trim().chars().filter(|&c| c != '.').collect::<String>().to_ascii_uppercase();
    let mut chars = bare.chars();
    let shape_ok = (ICD10_CATEGORY_LEN..=ICD10_MAX_LEN).contains(&bare.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric());
    if !shape_ok {
        return None;
    }
    if bare.len() == ICD10_CATEGORY_LEN {
        Some(bare)
    } else {
        Some(format!("{}.{}", &bare[..ICD10_CATEGORY_LEN], &bare[ICD10_CATEGORY_LEN..]))
    }
}

/// Requires every diagnosis code to be spelled canonically
///
/// The X12 wire form drops the decimal point, so only the canonical
/// spelling comes back unchanged from a payer.
pub fn check_diagnosis_codes(codes: &[String]) -> Result<(), IdentifierError> {
    check_codes("diagnosis code", codes)?;
    for code in codes {
        match canonical_diagnosis(code) {
            Some(expected) if expected == *code => {}
            Some(expected) => {
                return Err(IdentifierError::NonCanonicalDiagnosis { value: code.clone(), expected });
            }
            None => return Err(IdentifierError::InvalidDiagnosis { value: code.clone() }),
        }
    }
    Ok(())
}

macro_rules! define_code {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier after checking its lexical rules
            pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
                let value = value.into();
                check_element($kind, &value, $max)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_code!(
    /// Gateway-local identifier of a configured payer
    ProviderId,
    "provider id",
    64
);

define_code!(
    /// Caller-assigned claim number, unique per provider (X12 CLM01 width)
    ClaimNumber,
    "claim number",
    38
);

define_code!(
    /// Payer-issued (or auto-approval) prior authorization number
    PreAuthNumber,
    "pre-authorization number",
    50
);

/// National Provider Identifier
///
/// Ten digits; the last one is a Luhn check digit computed over the nine
/// leading digits prefixed with the card issuer constant `80840`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Npi(String);

impl Npi {
    /// Health-industry issuer prefix used by the NPI check digit
    const ISSUER_PREFIX: &'static str = "80840";

    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        let invalid = |reason: &str| IdentifierError::InvalidNpi {
            value: value.clone(),
            reason: reason.to_string(),
        };

        if value.len() != 10 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must be exactly 10 digits"));
        }
        let (base, check) = value.split_at(9);
        let expected = Self::check_digit(base);
        if check.bytes().next() != Some(b'0' + expected) {
            return Err(invalid("check digit mismatch"));
        }
        Ok(Self(value))
    }

    /// Computes the check digit for the nine leading digits of an NPI
    pub fn check_digit(base: &str) -> u8 {
        let digits: Vec<u8> = Self::ISSUER_PREFIX
            .bytes()
            .chain(base.bytes())
            .map(|b| b.saturating_sub(b'0'))
            .collect();

        // Double every second digit starting from the rightmost payload digit.
        let sum: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &d)| {
                let d = u32::from(d);
                if i % 2 == 0 {
                    let doubled = d * 2;
                    if doubled > 9 { doubled - 9 } else { doubled }
                } else {
                    d
                }
            })
            .sum();

        ((10 - (sum % 10)) % 10) as u8
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Npi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Npi {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Npi {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Npi> for String {
    fn from(npi: Npi) -> String {
        npi.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_npi_is_valid() {
        // Example NPI published with the check digit algorithm
        assert!(Npi::new("1234567893").is_ok());
    }

    #[test]
    fn test_npi_check_digit_mismatch() {
        let err = Npi::new("1234567890").unwrap_err();
        assert!(matches!(err, IdentifierError::InvalidNpi { .. }));
    }

    #[test]
    fn test_npi_requires_ten_digits() {
        assert!(Npi::new("12345").is_err());
        assert!(Npi::new("12345678AB").is_err());
    }

    #[test]
    fn test_claim_number_rejects_delimiters() {
        let err = ClaimNumber::new("CLM|1").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::ReservedCharacter { kind: "claim number", character: '|' }
        );
    }

    #[test]
    fn test_claim_number_width() {
        assert!(ClaimNumber::new("X".repeat(38)).is_ok());
        assert!(matches!(
            ClaimNumber::new("X".repeat(39)),
            Err(IdentifierError::TooLong { max: 38, .. })
        ));
    }

    #[test]
    fn test_canonical_diagnosis() {
        assert_eq!(canonical_diagnosis("e119").as_deref(), Some("E11.9"));
        assert_eq!(canonical_diagnosis("Z00.00").as_deref(), Some("Z00.00"));
        assert_eq!(canonical_diagnosis("I10").as_deref(), Some("I10"));
        assert_eq!(canonical_diagnosis("S72.001A").as_deref(), Some("S72.001A"));
        assert_eq!(canonical_diagnosis("11.9"), None);
        assert_eq!(canonical_diagnosis("E1"), None);
        assert_eq!(canonical_diagnosis("E11.9-X"), None);
    }

    #[test]
    fn test_provider_id_serde_round_trip() {
        let id = ProviderId::new("bcbs-tx").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"bcbs-tx\"");
        let back: ProviderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ProviderId>("\"\"").is_err());
    }
}
