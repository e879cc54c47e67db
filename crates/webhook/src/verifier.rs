//! Provider-aware verification and dispatch

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use core_kernel::{GatewayError, ProviderId};
use payer_registry::ProviderRegistry;

use crate::notification::WebhookNotification;
use crate::signature::{verify_with_secret, SignatureFailure};

/// Caller-supplied consumer of verified notifications
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    async fn handle(
        &self,
        provider_id: &ProviderId,
        notification: WebhookNotification,
    ) -> Result<(), GatewayError>;
}

/// Result of a dispatch that did not fail outright
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Signature valid, handler ran
    Delivered { event: &'static str },
    /// Signature refused; nothing was parsed or handed over
    Rejected(SignatureFailure),
}

/// Verifies inbound payer webhooks against the registry's secrets
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    registry: Arc<ProviderRegistry>,
}

impl WebhookVerifier {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Returns true only for a correct HMAC-SHA256 over `payload`
    ///
    /// Unknown providers, missing secrets, malformed signatures and
    /// mismatches all return false and are logged.
    pub fn verify_signature(&self, payload: &[u8], signature: &str, provider_id: &str) -> bool {
        match self.check(payload, signature, provider_id) {
            Ok(()) => true,
            Err(reason) => {
                warn!(provider = provider_id, reason = %reason, "Webhook signature rejected");
                false
            }
        }
    }

    fn check(&self, payload: &[u8], signature: &str, provider_id: &str) -> Result<(), SignatureFailure> {
        let provider = self
            .registry
            .lookup(provider_id)
            .map_err(|_| SignatureFailure::UnknownProvider)?;
        let secret = provider.webhook_secret().ok_or(SignatureFailure::MissingSecret)?;
        verify_with_secret(secret, payload, signature)
    }

    /// Verifies, parses and forwards a notification
    ///
    /// # Errors
    ///
    /// `GatewayError::Protocol` when a correctly signed payload is not a
    /// known notification; handler errors are passed through.
    pub async fn dispatch(
        &self,
        provider_id: &str,
        payload: &[u8],
        signature: &str,
        handler: &dyn WebhookHandler,
    ) -> Result<WebhookOutcome, GatewayError> {
        if let Err(reason) = self.check(payload, signature, provider_id) {
            warn!(provider = provider_id, reason = %reason, "Webhook signature rejected");
            return Ok(WebhookOutcome::Rejected(reason));
        }

        let notification: WebhookNotification = serde_json::from_slice(payload)
            .map_err(|e| GatewayError::protocol(format!("webhook payload: {e}")))?;
        let event = notification.event();
        let provider = ProviderId::new(provider_id)?;

        info!(provider = %provider, event, "Dispatching verified webhook");
        handler.handle(&provider, notification).await?;
        Ok(WebhookOutcome::Delivered { event })
    }
}
