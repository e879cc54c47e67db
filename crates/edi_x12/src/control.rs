//! Interchange control numbers

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

const MAX_CONTROL_NUMBER: u64 = 999_999_999;

/// Nine-digit interchange control number (ISA13 / IEA02)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlNumber(u32);

impl ControlNumber {
    /// Fixed width of ISA13
    pub const WIDTH: usize = 9;

    /// Derives a deterministic control number from a seed (the patient id)
    /// and the submission timestamp
    ///
    /// The SHA-256 digest is folded into `1..=999_999_999`, so the rendered
    /// value is always nine numeric digits and never all zeros.
    pub fn derive(seed: &str, submitted_at: DateTime<Utc>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(b"|");
        hasher.update(submitted_at.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let folded = u64::from_be_bytes(prefix) % MAX_CONTROL_NUMBER + 1;
        Self(folded as u32)
    }

    /// Accepts values that fit the nine-digit field
    pub fn new(value: u32) -> Option<Self> {
        (1..=MAX_CONTROL_NUMBER as u32).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ControlNumber {
    /// Zero-padded to `WIDTH`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = Self::WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deterministic() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(ControlNumber::derive("PAT-1", at), ControlNumber::derive("PAT-1", at));
        assert_ne!(ControlNumber::derive("PAT-1", at), ControlNumber::derive("PAT-2", at));
    }

    #[test]
    fn test_padding() {
        assert_eq!(ControlNumber::new(42).unwrap().to_string(), "000000042");
        assert!(ControlNumber::new(0).is_none());
        assert!(ControlNumber::new(1_000_000_000).is_none());
    }
}
