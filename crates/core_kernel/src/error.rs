//! Gateway error taxonomy
//!
//! Every entry point returns `GatewayError`. Callers decide on user-facing
//! messaging and fallbacks; the gateway never collapses distinct failure
//! modes into a boolean except for webhook signature checks.

use thiserror::Error;

use crate::identifiers::IdentifierError;
use crate::money::MoneyError;
use crate::temporal::TemporalError;

/// Error type returned by all gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad or missing provider definition; fatal, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied data failed a local business rule; never sent to a payer
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider {0} does not require pre-authorization")]
    PreAuthNotRequired(String),

    /// The payer answered with a non-retryable (4xx) status
    #[error("Provider rejected request with status {status}: {message}")]
    ProviderRejected { status: u16, message: String },

    /// Network failure, timeout or 5xx after the retry budget was spent
    #[error("Transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// Payer response could not be understood
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Webhook signature verification failed
    #[error("Signature error: {0}")]
    Signature(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        GatewayError::Configuration(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        GatewayError::Protocol(message.into())
    }

    pub fn provider_not_found(id: impl std::fmt::Display) -> Self {
        GatewayError::ProviderNotFound(id.to_string())
    }

    /// Returns true if retrying the same call later could succeed
    ///
    /// Only exhausted transport failures qualify. Validation, configuration
    /// and payer rejections are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Transport { .. })
    }

    /// Stable machine-readable code for the caller's own error mapping
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Configuration(_) => "CONFIGURATION_ERROR",
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::ProviderNotFound(_) => "PROVIDER_NOT_FOUND",
            GatewayError::PreAuthNotRequired(_) => "PREAUTH_NOT_REQUIRED",
            GatewayError::ProviderRejected { .. } => "PROVIDER_REJECTED",
            GatewayError::Transport { .. } => "TRANSPORT_ERROR",
            GatewayError::Protocol(_) => "PROTOCOL_ERROR",
            GatewayError::Signature(_) => "SIGNATURE_ERROR",
        }
    }
}

impl From<MoneyError> for GatewayError {
    fn from(err: MoneyError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

impl From<IdentifierError> for GatewayError {
    fn from(err: IdentifierError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

impl From<TemporalError> for GatewayError {
    fn from(err: TemporalError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;
