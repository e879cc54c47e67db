//! Provider connectivity probes
//!
//! A probe is a synthetic eligibility check sent once, without retries.
//!
//! | Outcome                                    | Status      |
//! |--------------------------------------------|-------------|
//! | parsed eligibility reply                   | `Healthy`   |
//! | 4xx, unreadable body, unexpected status    | `Degraded`  |
//! | timeout, connect error, 5xx, anything else | `Unhealthy` |
//!
//! Any reply counts as reachable: the payer is up even when it refuses the
//! placeholder member or answers with something the gateway cannot read.

use std::time::Instant;
use tracing::{debug, warn};

use chrono::Utc;
use core_kernel::{GatewayError, HealthCheckResult, HealthStatus, Npi};
use domain_eligibility::{EligibilityRequest, Subscriber};
use infra_http::RetryPolicy;
use payer_registry::InsuranceProvider;

use crate::client::PayerClient;
use crate::eligibility::EligibilityService;

/// Placeholder member id sent by probes
pub const PROBE_MEMBER_ID: &str = "HEALTHCHECK";

const PROBE_NPI: &str = "1234567893";

#[derive(Clone)]
pub struct ProviderProbe {
    eligibility: EligibilityService,
}

impl ProviderProbe {
    pub fn new(client: &PayerClient) -> Self {
        Self {
            eligibility: EligibilityService::new(client.with_policy(RetryPolicy::single_attempt())),
        }
    }

    pub async fn probe(&self, provider: &InsuranceProvider) -> HealthCheckResult {
        if !provider.active {
            return HealthCheckResult::new(provider.id.clone(), HealthStatus::Unknown, 0)
                .with_message("provider inactive; not probed");
        }

        let started = Instant::now();
        let outcome = match synthetic_request() {
            Ok(request) => self.eligibility.check(&request, provider).await.map(|_| ()),
            Err(e) => Err(e),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                debug!(provider = %provider.id, latency_ms, "Provider probe succeeded");
                HealthCheckResult::new(provider.id.clone(), HealthStatus::Healthy, latency_ms)
            }
            Err(GatewayError::ProviderRejected { status, .. }) => {
                warn!(provider = %provider.id, status, latency_ms, "Provider probe rejected");
                HealthCheckResult::new(provider.id.clone(), HealthStatus::Degraded, latency_ms)
                    .with_message(format!("payer answered with status {status}"))
            }
            Err(GatewayError::Protocol(reason)) => {
                warn!(provider = %provider.id, latency_ms, "Provider probe reply unreadable");
                HealthCheckResult::new(provider.id.clone(), HealthStatus::Degraded, latency_ms).with_message(reason)
            }
            Err(e) => {
                warn!(provider = %provider.id, error_code = e.error_code(), latency_ms, "Provider probe failed");
                HealthCheckResult::new(provider.id.clone(), HealthStatus::Unhealthy, latency_ms)
                    .with_message(e.to_string())
            }
        }
    }
}

fn synthetic_request() -> Result<EligibilityRequest, GatewayError> {
    let subscriber = Subscriber::new(PROBE_MEMBER_ID, PROBE_MEMBER_ID, PROBE_MEMBER_ID);
    Ok(EligibilityRequest::new(subscriber, Utc::now().date_naive(), Npi::new(PROBE_NPI)?))
}
