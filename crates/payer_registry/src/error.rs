//! Registry errors

use thiserror::Error;

use core_kernel::GatewayError;

/// Errors raised while loading the provider catalog
///
/// All of them are fatal at startup: a malformed definition never produces a
/// partially usable registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to load provider configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid provider definition '{provider}': {reason}")]
    Invalid { provider: String, reason: String },

    #[error("Duplicate provider id: {0}")]
    Duplicate(String),
}

impl RegistryError {
    pub fn invalid(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistryError::Invalid {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

impl From<RegistryError> for GatewayError {
    fn from(err: RegistryError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}
