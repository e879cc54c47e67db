//! Core Kernel - Foundational types shared by every gateway crate
//!
//! This crate provides the building blocks used by the registry, the EDI
//! codec, the transport and the services:
//! - Money types with precise decimal arithmetic
//! - Payer-facing identifiers (provider ids, NPIs, claim numbers)
//! - Calendar date ranges for coverage windows and service periods
//! - The caller-facing error taxonomy
//! - Provider health reporting types

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod health;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{DateRange, TemporalError};
pub use identifiers::{ProviderId, ClaimNumber, PreAuthNumber, Npi, IdentifierError, check_element, check_codes,
    check_diagnosis_codes, canonical_diagnosis};
pub use error::{GatewayError, GatewayResult};
pub use health::{HealthStatus, HealthCheckResult, HealthReport};
