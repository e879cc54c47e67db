//! Insurance Provider Integration Gateway
//!
//! Single facade in front of heterogeneous payers. Callers ask for
//! eligibility, prior authorization and claim handling by provider id;
//! the gateway picks EDI X12 or REST per provider, retries transient
//! failures, and returns typed results or a `GatewayError`.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = GatewaySettings::load_config(None)?;
//! let settings = GatewaySettings::from_config(&config)?;
//! let registry = Arc::new(ProviderRegistry::from_config(&config)?);
//!
//! let gateway = InsuranceGateway::start(settings, registry)?;
//! let response = gateway.check_eligibility(&request, "aetna").await?;
//! gateway.shutdown();
//! ```

pub mod claims;
pub mod client;
pub mod eligibility;
pub mod facade;
pub mod health;
pub mod preauth;
pub mod rest;
pub mod settings;

pub use claims::ClaimService;
pub use client::PayerClient;
pub use eligibility::EligibilityService;
pub use facade::InsuranceGateway;
pub use health::{ProviderProbe, PROBE_MEMBER_ID};
pub use preauth::PreAuthService;
pub use settings::{GatewaySettings, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
