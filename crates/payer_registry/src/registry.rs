//! The provider catalog
//!
//! Built once at startup and shared read-only behind `Arc`. There is no
//! mutation API, so concurrent readers need no locking.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use core_kernel::{GatewayError, ProviderId};

use crate::error::RegistryError;
use crate::provider::{InsuranceProvider, ProviderDefinition};

/// Immutable catalog of configured payers
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderId, Arc<InsuranceProvider>>,
}

impl ProviderRegistry {
    /// Builds the registry, resolving credential references from the
    /// process environment
    pub fn from_definitions(definitions: Vec<ProviderDefinition>) -> Result<Self, RegistryError> {
        Self::from_definitions_with(definitions, |name| std::env::var(name).ok())
    }

    /// Builds the registry with a custom credential lookup
    ///
    /// # Errors
    ///
    /// Fails on the first malformed definition or duplicate id.
    pub fn from_definitions_with<F>(
        definitions: Vec<ProviderDefinition>,
        lookup: F,
    ) -> Result<Self, RegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut providers = BTreeMap::new();
        for definition in definitions {
            let provider = InsuranceProvider::from_definition(definition, &lookup)?;
            if providers.contains_key(&provider.id) {
                return Err(RegistryError::Duplicate(provider.id.to_string()));
            }
            providers.insert(provider.id.clone(), Arc::new(provider));
        }

        let registry = Self { providers };
        info!(
            providers = registry.len(),
            active = registry.active().count(),
            "Provider registry loaded"
        );
        Ok(registry)
    }

    /// Reads the `providers` list from layered configuration
    pub fn from_config(config: &config::Config) -> Result<Self, RegistryError> {
        let definitions: Vec<ProviderDefinition> = match config.get("providers") {
            Ok(definitions) => definitions,
            Err(config::ConfigError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(RegistryError::Load(e)),
        };
        Self::from_definitions(definitions)
    }

    /// Looks up a provider by id
    pub fn get(&self, id: &ProviderId) -> Result<Arc<InsuranceProvider>, GatewayError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::provider_not_found(id))
    }

    /// Looks up a provider by its raw id string
    pub fn lookup(&self, id: &str) -> Result<Arc<InsuranceProvider>, GatewayError> {
        let id = ProviderId::new(id).map_err(|_| GatewayError::provider_not_found(id))?;
        self.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<InsuranceProvider>> {
        self.providers.values()
    }

    /// Providers with the active flag set
    pub fn active(&self) -> impl Iterator<Item = &Arc<InsuranceProvider>> {
        self.providers.values().filter(|p| p.active)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
