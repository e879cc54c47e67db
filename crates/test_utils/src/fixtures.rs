//! Pre-built Test Fixtures
//!
//! Provides ready-to-use payers, members and dates for the gateway tests.
//! These fixtures are designed to be consistent and predictable.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::sync::Arc;

use core_kernel::{ClaimNumber, DateRange, Money, Npi, ProviderId};
use domain_eligibility::{Demographics, Gender, Subscriber};
use payer_registry::{InsuranceProvider, ProtocolStandard, ProviderDefinition, ProviderRegistry};

/// API key configured inline on every fixture payer
pub const FIXTURE_API_KEY: &str = "test-api-key";

/// Webhook secret configured on the REST fixture payer
pub const FIXTURE_WEBHOOK_SECRET: &str = "whsec_fixture";

/// Fixture for payer definitions
///
/// Definitions are returned unresolved so tests can tweak fields (most
/// often `endpoint`) before building a provider or registry.
pub struct ProviderFixtures;

impl ProviderFixtures {
    /// Clearinghouse payer speaking X12 for every operation
    pub fn edi_definition() -> ProviderDefinition {
        let mut definition = ProviderDefinition::new(
            "bcbs",
            "Blue Cross Blue Shield",
            "https://edi.bcbs.test",
            vec![ProtocolStandard::Edi270271, ProtocolStandard::Edi837],
        );
        definition.payer_id = Some("BCBS01".to_string());
        definition.edi_path = Some("x12".to_string());
        definition.requires_pre_auth = true;
        definition.pre_auth_threshold = dec!(500);
        definition.processing_time = Some("24-48 hours".to_string());
        definition.api_key = Some(SecretString::new(FIXTURE_API_KEY.to_string()));
        definition
    }

    /// JSON REST payer with webhooks
    pub fn rest_definition() -> ProviderDefinition {
        let mut definition = ProviderDefinition::new(
            "aetna",
            "Aetna",
            "https://api.aetna.test/v1",
            vec![ProtocolStandard::Rest],
        );
        definition.requires_pre_auth = true;
        definition.pre_auth_threshold = dec!(1000);
        definition.api_key = Some(SecretString::new(FIXTURE_API_KEY.to_string()));
        definition.webhook_secret = Some(SecretString::new(FIXTURE_WEBHOOK_SECRET.to_string()));
        definition
    }

    /// FHIR-only payer that never requires pre-authorization
    pub fn fhir_definition() -> ProviderDefinition {
        let mut definition = ProviderDefinition::new(
            "kaiser",
            "Kaiser Permanente",
            "https://fhir.kaiser.test",
            vec![ProtocolStandard::Fhir],
        );
        definition.api_key = Some(SecretString::new(FIXTURE_API_KEY.to_string()));
        definition
    }

    /// Resolves a definition that carries only inline credentials
    pub fn provider(definition: ProviderDefinition) -> Arc<InsuranceProvider> {
        Arc::new(InsuranceProvider::from_definition(definition, |_| None).unwrap())
    }

    pub fn edi_provider() -> Arc<InsuranceProvider> {
        Self::provider(Self::edi_definition())
    }

    pub fn rest_provider() -> Arc<InsuranceProvider> {
        Self::provider(Self::rest_definition())
    }

    /// Registry holding the EDI, REST and FHIR fixtures
    pub fn registry() -> ProviderRegistry {
        Self::registry_of(vec![
            Self::edi_definition(),
            Self::rest_definition(),
            Self::fhir_definition(),
        ])
    }

    pub fn registry_of(definitions: Vec<ProviderDefinition>) -> ProviderRegistry {
        ProviderRegistry::from_definitions_with(definitions, |_| None).unwrap()
    }

    /// Points a definition at a local mock server
    pub fn at(mut definition: ProviderDefinition, endpoint: impl Into<String>) -> ProviderDefinition {
        definition.endpoint = endpoint.into();
        definition
    }

    pub fn edi_id() -> ProviderId {
        ProviderId::new("bcbs").unwrap()
    }

    pub fn rest_id() -> ProviderId {
        ProviderId::new("aetna").unwrap()
    }
}

/// Fixture for member data
pub struct MemberFixtures;

impl MemberFixtures {
    /// Subscriber without demographics
    pub fn subscriber() -> Subscriber {
        Subscriber::new("PAT-1001", "POL-778899", "MBR-445566")
    }

    /// Subscriber with full demographics
    pub fn subscriber_with_demographics() -> Subscriber {
        Self::subscriber().with_demographics(Self::demographics())
    }

    pub fn demographics() -> Demographics {
        Demographics {
            first_name: "JANE".to_string(),
            last_name: "DOE".to_string(),
            birth_date: TemporalFixtures::birth_date(),
            gender: Gender::Female,
        }
    }
}

/// Fixture for provider NPIs (all pass the Luhn check)
pub struct NpiFixtures;

impl NpiFixtures {
    pub fn billing() -> Npi {
        Npi::new("1245319599").unwrap()
    }

    pub fn rendering() -> Npi {
        Npi::new("1234567893").unwrap()
    }

    pub fn facility() -> Npi {
        Npi::new("1003000126").unwrap()
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard date of service (May 15, 2024)
    pub fn service_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    /// Single-day service period on the standard service date
    pub fn service_period() -> DateRange {
        DateRange::single_day(Self::service_date())
    }

    pub fn coverage_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    pub fn coverage_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    }

    pub fn birth_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1985, 7, 4).unwrap()
    }

    /// Fixed interchange timestamp, for deterministic control numbers
    pub fn interchange_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 9, 30, 0).unwrap()
    }
}

/// Fixture for money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::usd(amount)
    }

    /// Below every fixture payer's auto-approval threshold
    pub fn small_procedure() -> Money {
        Money::usd(dec!(250.00))
    }

    /// Above every fixture payer's auto-approval threshold
    pub fn major_procedure() -> Money {
        Money::usd(dec!(18500.00))
    }
}

/// Fixture for claim identifiers
pub struct ClaimFixtures;

impl ClaimFixtures {
    pub fn claim_number() -> ClaimNumber {
        ClaimNumber::new("CLM-2024-0001").unwrap()
    }
}
