//! Payer definitions
//!
//! `ProviderDefinition` is the raw, deserializable shape read from
//! configuration. `InsuranceProvider` is the validated, immutable record the
//! rest of the gateway works with; it can only be obtained through
//! `InsuranceProvider::from_definition`, so every instance satisfies the
//! registry invariants.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;
use validator::Validate;

use core_kernel::identifiers::RESERVED_CHARACTERS;
use core_kernel::{Currency, GatewayError, Money, ProviderId};

use crate::error::RegistryError;
use crate::routing::{Channel, Operation, ProtocolStandard, RouteTable};

/// Maximum width of an X12 NM109 identification code
const MAX_PAYER_ID_LEN: usize = 80;

/// Contact metadata for payer operations staff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ProviderContact {
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub portal_url: Option<String>,
}

/// Raw provider definition as it appears in configuration
#[derive(Debug, Deserialize, Validate)]
pub struct ProviderDefinition {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    /// Payer identifier used in X12 interchange and NM1*PR segments
    #[serde(default)]
    pub payer_id: Option<String>,
    #[validate(url)]
    pub endpoint: String,
    /// Path appended to `endpoint` for X12 posts
    #[serde(default)]
    pub edi_path: Option<String>,
    #[serde(default)]
    pub standards: Vec<ProtocolStandard>,
    #[serde(default)]
    pub requires_pre_auth: bool,
    #[serde(default)]
    pub pre_auth_threshold: Decimal,
    /// Nominal turnaround quoted by the payer (e.g. "24-48 hours")
    #[serde(default)]
    pub processing_time: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub contact: ProviderContact,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Inline API key; prefer `api_key_env` outside of tests
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Name of the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,
    /// Name of the environment variable holding the webhook secret
    #[serde(default)]
    pub webhook_secret_env: Option<String>,
}

fn default_active() -> bool {
    true
}

impl ProviderDefinition {
    /// Minimal definition with everything optional left unset
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        standards: Vec<ProtocolStandard>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            payer_id: None,
            endpoint: endpoint.into(),
            edi_path: None,
            standards,
            requires_pre_auth: false,
            pre_auth_threshold: Decimal::ZERO,
            processing_time: None,
            contact: ProviderContact::default(),
            active: true,
            api_key: None,
            api_key_env: None,
            webhook_secret: None,
            webhook_secret_env: None,
        }
    }
}

/// A validated, immutable payer record
#[derive(Debug)]
pub struct InsuranceProvider {
    pub id: ProviderId,
    pub name: String,
    pub payer_id: Option<String>,
    /// Base URL without a trailing slash
    pub endpoint: String,
    pub edi_path: Option<String>,
    pub standards: BTreeSet<ProtocolStandard>,
    pub requires_pre_auth: bool,
    pub pre_auth_threshold: Money,
    pub processing_time: Option<String>,
    pub contact: ProviderContact,
    pub active: bool,
    api_key: Option<SecretString>,
    webhook_secret: Option<SecretString>,
    routes: RouteTable,
}

impl InsuranceProvider {
    /// Validates a definition and resolves its credential references
    ///
    /// `lookup` resolves environment variable names; the registry passes
    /// `std::env::var`, tests pass a closure over fixed values.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Invalid` when the endpoint is missing or not a
    /// URL, the threshold is negative, no standard is declared, the payer id
    /// contains X12 delimiters, or a referenced credential variable is unset.
    pub fn from_definition<F>(definition: ProviderDefinition, lookup: F) -> Result<Self, RegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let label = definition.id.clone();
        definition
            .validate()
            .map_err(|e| RegistryError::invalid(&label, e.to_string().replace('\n', "; ")))?;

        let id = ProviderId::new(definition.id)
            .map_err(|e| RegistryError::invalid(&label, e.to_string()))?;

        let standards: BTreeSet<ProtocolStandard> = definition.standards.into_iter().collect();
        if standards.is_empty() {
            return Err(RegistryError::invalid(&label, "at least one supported standard is required"));
        }

        if definition.pre_auth_threshold.is_sign_negative() && !definition.pre_auth_threshold.is_zero() {
            return Err(RegistryError::invalid(
                &label,
                format!("pre_auth_threshold must be non-negative, got {}", definition.pre_auth_threshold),
            ));
        }

        let payer_id = match definition.payer_id.map(|p| p.trim().to_string()) {
            Some(p) if p.is_empty() => None,
            Some(p) => {
                if p.len() > MAX_PAYER_ID_LEN || p.contains(RESERVED_CHARACTERS) {
                    return Err(RegistryError::invalid(&label, format!("payer_id '{p}' is not a valid X12 identifier")));
                }
                Some(p)
            }
            None => None,
        };

        let uses_edi = standards.contains(&ProtocolStandard::Edi270271)
            || standards.contains(&ProtocolStandard::Edi837);
        if uses_edi && payer_id.is_none() {
            warn!(provider = %id, "EDI standard declared without payer_id; X12 calls will fail");
        }

        let edi_path = definition
            .edi_path
            .filter(|p| !p.trim().is_empty())
            .map(|p| if p.starts_with('/') { p } else { format!("/{p}") });

        let api_key = resolve_secret(&label, "api_key", definition.api_key, definition.api_key_env, &lookup)?;
        let webhook_secret = resolve_secret(
            &label,
            "webhook_secret",
            definition.webhook_secret,
            definition.webhook_secret_env,
            &lookup,
        )?;

        let routes = RouteTable::for_standards(&standards);

        Ok(Self {
            id,
            name: definition.name,
            payer_id,
            endpoint: definition.endpoint.trim_end_matches('/').to_string(),
            edi_path,
            standards,
            requires_pre_auth: definition.requires_pre_auth,
            pre_auth_threshold: Money::new(definition.pre_auth_threshold, Currency::USD),
            processing_time: definition.processing_time,
            contact: definition.contact,
            active: definition.active,
            api_key,
            webhook_secret,
            routes,
        })
    }

    pub fn supports(&self, standard: ProtocolStandard) -> bool {
        self.standards.contains(&standard)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Returns the channel for an operation or a configuration error when
    /// the payer offers no compatible standard
    pub fn channel_for(&self, operation: Operation) -> Result<Channel, GatewayError> {
        self.routes.channel(operation).ok_or_else(|| {
            GatewayError::configuration(format!(
                "provider {} supports no standard usable for {} ({})",
                self.id,
                operation,
                self.standards_label()
            ))
        })
    }

    /// Fails with a configuration error when the provider is switched off
    pub fn ensure_active(&self) -> Result<(), GatewayError> {
        if self.active {
            Ok(())
        } else {
            Err(GatewayError::configuration(format!("provider {} is inactive", self.id)))
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|s| s.expose_secret().as_str())
    }

    pub fn webhook_secret(&self) -> Option<&[u8]> {
        self.webhook_secret.as_ref().map(|s| s.expose_secret().as_bytes())
    }

    /// URL for a REST resource below the payer endpoint
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// URL X12 interchanges are posted to
    pub fn edi_url(&self) -> String {
        match &self.edi_path {
            Some(path) => format!("{}{}", self.endpoint, path),
            None => self.endpoint.clone(),
        }
    }

    fn standards_label(&self) -> String {
        self.standards
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn resolve_secret<F>(
    provider: &str,
    field: &str,
    inline: Option<SecretString>,
    env_name: Option<String>,
    lookup: &F,
) -> Result<Option<SecretString>, RegistryError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = inline {
        return Ok(Some(secret));
    }
    match env_name {
        Some(name) => lookup(&name)
            .filter(|v| !v.is_empty())
            .map(|v| Some(SecretString::new(v)))
            .ok_or_else(|| {
                RegistryError::invalid(provider, format!("{field} variable {name} is not set"))
            }),
        None => Ok(None),
    }
}
