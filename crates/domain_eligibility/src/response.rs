//! Eligibility determination

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, ProviderId, TemporalError};

/// Coverage window reported by the payer
///
/// Either end may be unknown. When both are known, `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCoverageWindow")]
pub struct CoverageWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RawCoverageWindow {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl TryFrom<RawCoverageWindow> for CoverageWindow {
    type Error = TemporalError;

    fn try_from(raw: RawCoverageWindow) -> Result<Self, Self::Error> {
        CoverageWindow::new(raw.start, raw.end)
    }
}

impl CoverageWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(TemporalError::InvalidRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_known(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Open ends count as unbounded
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| s <= date) && self.end.map_or(true, |e| date <= e)
    }
}

/// Benefits determination for one inquiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub provider_id: ProviderId,
    pub eligible: bool,
    #[serde(default)]
    pub coverage: CoverageWindow,
    #[serde(default)]
    pub requires_pre_auth: bool,
    #[serde(default)]
    pub deductible_remaining: Option<Money>,
    #[serde(default)]
    pub out_of_pocket_remaining: Option<Money>,
    #[serde(default)]
    pub limitations: Vec<String>,
    /// Problems tolerated while reading the payer response
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Wall-clock time of the payer round trip
    #[serde(default)]
    pub response_time_ms: u64,
}

impl EligibilityResponse {
    pub fn new(provider_id: ProviderId, eligible: bool) -> Self {
        Self {
            provider_id,
            eligible,
            coverage: CoverageWindow::default(),
            requires_pre_auth: false,
            deductible_remaining: None,
            out_of_pocket_remaining: None,
            limitations: Vec::new(),
            warnings: Vec::new(),
            response_time_ms: 0,
        }
    }

    pub fn with_coverage(mut self, coverage: CoverageWindow) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time_ms = millis;
        self
    }

    /// True when the member is eligible and the date falls in the window
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.eligible && self.coverage.contains(date)
    }

    /// True when the payer response was read without any tolerated problem
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
