//! The X12 codec
//!
//! `X12Codec` carries the submitter identity and the output delimiters.
//! Builders and readers for each transaction set live in their own modules
//! as further `impl X12Codec` blocks. Everything here is synchronous and
//! free of I/O; submission timestamps are passed in so output is
//! reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use payer_registry::InsuranceProvider;

use crate::control::ControlNumber;
use crate::envelope::{Envelope, TransactionSet, UsageIndicator};
use crate::error::EdiError;
use crate::segment::{Delimiters, Segment};

/// The organisation submitting transactions (ISA06 / GS02 / NM1*41)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub usage: UsageIndicator,
}

impl Submitter {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage: UsageIndicator::Test,
        }
    }

    pub fn with_usage(mut self, usage: UsageIndicator) -> Self {
        self.usage = usage;
        self
    }
}

/// Direction of an interchange relative to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Gateway to payer
    Outbound,
    /// Payer to gateway; used by simulated payers and tests
    Inbound,
}

/// Stateless X12 encoder/decoder
#[derive(Debug, Clone)]
pub struct X12Codec {
    submitter: Submitter,
    delimiters: Delimiters,
}

impl X12Codec {
    pub fn new(submitter: Submitter) -> Self {
        Self {
            submitter,
            delimiters: Delimiters::default(),
        }
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    /// Wraps a transaction body for the given payer
    pub(crate) fn seal(
        &self,
        provider: &InsuranceProvider,
        direction: Direction,
        transaction: TransactionSet,
        control: ControlNumber,
        created_at: DateTime<Utc>,
        body: Vec<Segment>,
    ) -> Result<String, EdiError> {
        let payer_id = payer_id(provider)?;
        let (sender_id, receiver_id) = match direction {
            Direction::Outbound => (self.submitter.id.as_str(), payer_id),
            Direction::Inbound => (payer_id, self.submitter.id.as_str()),
        };
        let envelope = Envelope {
            sender_id,
            receiver_id,
            usage: self.submitter.usage,
            control,
            created_at,
            transaction,
        };
        Ok(envelope.wrap(body, &self.delimiters))
    }
}

/// Payer id for X12 addressing; encoding fails without one
pub(crate) fn payer_id(provider: &InsuranceProvider) -> Result<&str, EdiError> {
    provider.payer_id.as_deref().ok_or_else(|| {
        EdiError::Configuration(format!(
            "provider {} has no payer_id configured",
            provider.id
        ))
    })
}

/// BHT with a purpose code, reference and creation timestamp
pub(crate) fn bht(
    structure: &str,
    purpose: &str,
    reference: &str,
    created_at: DateTime<Utc>,
) -> Segment {
    Segment::new("BHT")
        .push(structure)
        .push(purpose)
        .push(reference)
        .push(created_at.format("%Y%m%d").to_string())
        .push(created_at.format("%H%M").to_string())
}

/// HL segment; `parent` is empty for the top level
pub(crate) fn hl(id: u32, parent: Option<u32>, level: &str, has_children: bool) -> Segment {
    Segment::new("HL")
        .push(id.to_string())
        .push(parent.map(|p| p.to_string()).unwrap_or_default())
        .push(level)
        .push(if has_children { "1" } else { "0" })
}
