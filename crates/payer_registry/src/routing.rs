//! Transport routing
//!
//! Each provider gets a `RouteTable` when the registry is built. The table
//! fixes, per operation, whether the call goes out as an X12 interchange or
//! as a JSON request; services never inspect the standards set themselves.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Protocol standards a payer can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolStandard {
    /// X12 270 eligibility inquiry / 271 response
    #[serde(rename = "edi_270_271", alias = "EDI_270_271")]
    Edi270271,
    /// X12 837 claim family (837 claims, 276/277 status, 278 services review)
    #[serde(rename = "edi_837", alias = "EDI_837")]
    Edi837,
    #[serde(rename = "rest", alias = "REST")]
    Rest,
    #[serde(rename = "hl7", alias = "HL7")]
    Hl7,
    #[serde(rename = "fhir", alias = "FHIR")]
    Fhir,
}

impl fmt::Display for ProtocolStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolStandard::Edi270271 => "EDI-270/271",
            ProtocolStandard::Edi837 => "EDI-837",
            ProtocolStandard::Rest => "REST",
            ProtocolStandard::Hl7 => "HL7",
            ProtocolStandard::Fhir => "FHIR",
        };
        f.write_str(name)
    }
}

/// Flavour of JSON the payer expects on its REST surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestDialect {
    /// `application/json`
    Json,
    /// `application/fhir+json`
    Fhir,
}

impl RestDialect {
    pub fn content_type(&self) -> &'static str {
        match self {
            RestDialect::Json => "application/json",
            RestDialect::Fhir => "application/fhir+json",
        }
    }
}

/// Wire strategy for one operation against one payer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Edi,
    Rest(RestDialect),
}

/// Gateway operations that need a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Eligibility,
    PriorAuthorization,
    ClaimSubmission,
    ClaimStatus,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Eligibility => "eligibility",
            Operation::PriorAuthorization => "prior authorization",
            Operation::ClaimSubmission => "claim submission",
            Operation::ClaimStatus => "claim status",
        };
        f.write_str(name)
    }
}

/// Per-operation channel selection, computed once per provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub eligibility: Option<Channel>,
    pub prior_auth: Option<Channel>,
    pub claims: Option<Channel>,
}

impl RouteTable {
    /// Derives routes from the payer's supported standards
    ///
    /// EDI wins whenever the matching X12 transaction is supported since it
    /// is the canonical clearinghouse path. Plain REST is preferred over FHIR
    /// when both are offered. HL7 v2 has no outbound mapping.
    pub fn for_standards(standards: &BTreeSet<ProtocolStandard>) -> Self {
        let rest = if standards.contains(&ProtocolStandard::Rest) {
            Some(Channel::Rest(RestDialect::Json))
        } else if standards.contains(&ProtocolStandard::Fhir) {
            Some(Channel::Rest(RestDialect::Fhir))
        } else {
            None
        };

        let edi_or_rest = |standard: ProtocolStandard| {
            if standards.contains(&standard) {
                Some(Channel::Edi)
            } else {
                rest
            }
        };

        Self {
            eligibility: edi_or_rest(ProtocolStandard::Edi270271),
            prior_auth: edi_or_rest(ProtocolStandard::Edi837),
            claims: edi_or_rest(ProtocolStandard::Edi837),
        }
    }

    pub fn channel(&self, operation: Operation) -> Option<Channel> {
        match operation {
            Operation::Eligibility => self.eligibility,
            Operation::PriorAuthorization => self.prior_auth,
            Operation::ClaimSubmission | Operation::ClaimStatus => self.claims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(standards: &[ProtocolStandard]) -> BTreeSet<ProtocolStandard> {
        standards.iter().copied().collect()
    }

    #[test]
    fn test_edi_preferred_when_both_available() {
        let routes = RouteTable::for_standards(&set(&[
            ProtocolStandard::Rest,
            ProtocolStandard::Edi270271,
            ProtocolStandard::Edi837,
        ]));
        assert_eq!(routes.eligibility, Some(Channel::Edi));
        assert_eq!(routes.claims, Some(Channel::Edi));
        assert_eq!(routes.prior_auth, Some(Channel::Edi));
    }

    #[test]
    fn test_mixed_routes() {
        let routes = RouteTable::for_standards(&set(&[
            ProtocolStandard::Edi270271,
            ProtocolStandard::Rest,
        ]));
        assert_eq!(routes.eligibility, Some(Channel::Edi));
        assert_eq!(routes.claims, Some(Channel::Rest(RestDialect::Json)));
        assert_eq!(routes.channel(Operation::ClaimStatus), routes.claims);
    }

    #[test]
    fn test_fhir_only_uses_fhir_dialect() {
        let routes = RouteTable::for_standards(&set(&[ProtocolStandard::Fhir]));
        assert_eq!(routes.eligibility, Some(Channel::Rest(RestDialect::Fhir)));
    }

    #[test]
    fn test_hl7_only_has_no_routes() {
        let routes = RouteTable::for_standards(&set(&[ProtocolStandard::Hl7]));
        assert_eq!(routes.eligibility, None);
        assert_eq!(routes.prior_auth, None);
        assert_eq!(routes.claims, None);
    }

    #[test]
    fn test_standard_serde_names() {
        let parsed: Vec<ProtocolStandard> =
            serde_json::from_str(r#"["edi_270_271","EDI_837","rest","fhir"]"#).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[1], ProtocolStandard::Edi837);
    }
}
