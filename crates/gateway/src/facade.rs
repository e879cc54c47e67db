//! Gateway facade
//!
//! `InsuranceGateway` owns the payer transport for its whole lifetime and
//! is the only entry point callers use. Providers are resolved by id
//! through the registry handed in at start.

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use core_kernel::{ClaimNumber, GatewayError, HealthCheckResult, HealthReport, ProviderId};
use domain_claims::{ClaimResponse, ClaimSubmission};
use domain_eligibility::{EligibilityRequest, EligibilityResponse};
use domain_preauth::{PreAuthRequest, PreAuthResponse};
use edi_x12::X12Codec;
use infra_http::{HttpTransport, PayerExchange, ReqwestExchange};
use payer_registry::ProviderRegistry;
use webhook::{WebhookHandler, WebhookOutcome, WebhookVerifier};

use crate::claims::ClaimService;
use crate::client::PayerClient;
use crate::eligibility::EligibilityService;
use crate::health::ProviderProbe;
use crate::preauth::PreAuthService;
use crate::settings::GatewaySettings;

type SubmissionKey = (ProviderId, ClaimNumber);

pub struct InsuranceGateway {
    registry: Arc<ProviderRegistry>,
    settings: GatewaySettings,
    eligibility: EligibilityService,
    preauth: PreAuthService,
    claims: ClaimService,
    probe: ProviderProbe,
    webhooks: WebhookVerifier,
    /// One cell per (provider, claim number); a filled cell is the answer
    /// every later duplicate receives
    submissions: DashMap<SubmissionKey, Arc<OnceCell<ClaimResponse>>>,
}

impl InsuranceGateway {
    /// Opens the pooled HTTP client and wires the services
    ///
    /// # Errors
    ///
    /// `Configuration` when the settings are invalid or the client cannot
    /// be built.
    pub fn start(settings: GatewaySettings, registry: Arc<ProviderRegistry>) -> Result<Self, GatewayError> {
        settings.validate()?;
        let exchange = ReqwestExchange::new(&settings.client_config())?;
        Self::with_exchange(settings, registry, Arc::new(exchange))
    }

    /// Starts the gateway over a caller-supplied exchange
    pub fn with_exchange(
        settings: GatewaySettings,
        registry: Arc<ProviderRegistry>,
        exchange: Arc<dyn PayerExchange>,
    ) -> Result<Self, GatewayError> {
        settings.validate()?;

        let transport = HttpTransport::new(exchange, settings.retry_policy(), settings.timeout());
        let client = PayerClient::new(transport, X12Codec::new(settings.submitter()));

        info!(
            providers = registry.len(),
            max_attempts = settings.max_retries,
            timeout_ms = settings.timeout().as_millis() as u64,
            "Insurance gateway started"
        );

        Ok(Self {
            eligibility: EligibilityService::new(client.clone()),
            preauth: PreAuthService::new(client.clone()),
            claims: ClaimService::new(client.clone(), settings.claim_validator()),
            probe: ProviderProbe::new(&client),
            webhooks: WebhookVerifier::new(Arc::clone(&registry)),
            submissions: DashMap::new(),
            registry,
            settings,
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Closes the transport; in-flight calls held elsewhere are dropped
    pub fn shutdown(self) {
        info!(cached_claims = self.tracked_submissions(), "Insurance gateway shutting down");
    }

    pub async fn check_eligibility(
        &self,
        request: &EligibilityRequest,
        provider_id: &str,
    ) -> Result<EligibilityResponse, GatewayError> {
        let provider = self.registry.lookup(provider_id)?;
        self.eligibility.check(request, &provider).await
    }

    pub async fn request_pre_authorization(
        &self,
        request: &PreAuthRequest,
        provider_id: &str,
    ) -> Result<PreAuthResponse, GatewayError> {
        let provider = self.registry.lookup(provider_id)?;
        self.preauth.request(request, &provider).await
    }

    /// Submits a claim at most once per provider and claim number
    ///
    /// A duplicate gets the stored response of the first successful
    /// submission without another payer call. Concurrent duplicates wait
    /// for the first one. Failed submissions are not remembered.
    #[instrument(skip(self, claim), fields(claim_number = %claim.claim_number))]
    pub async fn submit_claim(&self, claim: &ClaimSubmission, provider_id: &str) -> Result<ClaimResponse, GatewayError> {
        let provider = self.registry.lookup(provider_id)?;
        self.claims.validate(claim)?;

        let key = (provider.id.clone(), claim.claim_number.clone());
        let cell = Arc::clone(self.submissions.entry(key.clone()).or_default().value());

        if let Some(existing) = cell.get() {
            info!(provider = %provider.id, "Duplicate claim submission answered from cache");
            return Ok(existing.clone());
        }

        match cell.get_or_try_init(|| self.claims.submit(claim, &provider)).await {
            Ok(response) => Ok(response.clone()),
            Err(e) => {
                // Only the map and this call hold the cell: nobody is still waiting on it
                self.submissions
                    .remove_if(&key, |_, held| Arc::ptr_eq(held, &cell) && Arc::strong_count(held) == 2);
                Err(e)
            }
        }
    }

    /// Claim numbers with a cached or in-flight submission
    pub fn tracked_submissions(&self) -> usize {
        self.submissions.len()
    }

    pub async fn get_claim_status(&self, claim_number: &ClaimNumber, provider_id: &str) -> Result<ClaimResponse, GatewayError> {
        let provider = self.registry.lookup(provider_id)?;
        self.claims.status(claim_number, &provider).await
    }

    /// Checks a webhook signature; never fails, only answers
    pub fn verify_signature(&self, payload: &[u8], signature: &str, provider_id: &str) -> bool {
        self.webhooks.verify_signature(payload, signature, provider_id)
    }

    /// Verifies a webhook and hands the notification to `handler`
    pub async fn handle_webhook(
        &self,
        provider_id: &str,
        payload: &[u8],
        signature: &str,
        handler: &dyn WebhookHandler,
    ) -> Result<WebhookOutcome, GatewayError> {
        self.webhooks.dispatch(provider_id, payload, signature, handler).await
    }

    pub async fn probe_provider(&self, provider_id: &str) -> Result<HealthCheckResult, GatewayError> {
        let provider = self.registry.lookup(provider_id)?;
        Ok(self.probe.probe(&provider).await)
    }

    /// Probes every registered provider with bounded fan-out
    pub async fn probe_all(&self) -> HealthReport {
        let results: Vec<HealthCheckResult> = stream::iter(self.registry.iter().cloned())
            .map(|provider| async move { self.probe.probe(&provider).await })
            .buffer_unordered(self.settings.probe_concurrency())
            .collect()
            .await;

        let report = HealthReport::from_results(results);
        info!(
            healthy = report.healthy_count,
            degraded = report.degraded_count,
            unhealthy = report.unhealthy_count,
            "Provider probes finished"
        );
        report
    }
}

impl Drop for InsuranceGateway {
    fn drop(&mut self) {
        info!("Payer transport released");
    }
}
