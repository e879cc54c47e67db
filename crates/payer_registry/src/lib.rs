//! Provider Registry - Catalog of payer definitions
//!
//! This crate loads and validates payer definitions once at startup:
//! - Endpoint, credential references and contact metadata per payer
//! - Supported protocol standards and the transport route per operation
//! - Pre-authorization policy (required flag, auto-approval threshold)

pub mod error;
pub mod provider;
pub mod registry;
pub mod routing;

pub use error::RegistryError;
pub use provider::{InsuranceProvider, ProviderContact, ProviderDefinition};
pub use registry::ProviderRegistry;
pub use routing::{Channel, Operation, ProtocolStandard, RestDialect, RouteTable};
