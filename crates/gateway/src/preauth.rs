//! Prior authorization service

use chrono::Utc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use core_kernel::{GatewayError, PreAuthNumber, ProviderId};
use domain_preauth::{generate_tracking_number, AutoApprovalRule, PreAuthRequest, PreAuthResponse, PreAuthStatus};
use payer_registry::{Channel, InsuranceProvider, Operation, RestDialect};

use crate::client::PayerClient;
use crate::rest::{usd, PreAuthPayload, PreAuthReply, PREAUTH_PATH};

#[derive(Clone)]
pub struct PreAuthService {
    client: PayerClient,
}

impl PreAuthService {
    pub fn new(client: PayerClient) -> Self {
        Self { client }
    }

    /// Requests authorization for a planned service
    ///
    /// Requests whose estimated cost is at or below the provider threshold
    /// are approved locally without contacting the payer. Everything else
    /// goes over EDI 278 or REST.
    ///
    /// # Errors
    ///
    /// `PreAuthNotRequired` when the provider does not mandate
    /// authorization, `Validation` for bad request data, plus the transport
    /// and protocol failures of a payer call.
    #[instrument(skip(self, request, provider), fields(provider = %provider.id))]
    pub async fn request(
        &self,
        request: &PreAuthRequest,
        provider: &InsuranceProvider,
    ) -> Result<PreAuthResponse, GatewayError> {
        if !provider.requires_pre_auth {
            return Err(GatewayError::PreAuthNotRequired(provider.id.to_string()));
        }
        request.validate()?;

        let started = Instant::now();
        let rule = AutoApprovalRule::new(provider.pre_auth_threshold);
        if rule.applies_to(&request.estimated_cost) {
            let response = rule.approve(request, provider.id.clone(), Utc::now().date_naive())?;
            return Ok(response.with_processing_time(started.elapsed().as_millis() as u64));
        }

        provider.ensure_active()?;
        let response = match provider.channel_for(Operation::PriorAuthorization)? {
            Channel::Edi => self.via_edi(request, provider).await?,
            Channel::Rest(dialect) => self.via_rest(request, provider, dialect).await?,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            pre_auth_number = %response.pre_auth_number,
            status = ?response.status(),
            elapsed_ms,
            "Pre-authorization decided by payer"
        );
        Ok(response.with_processing_time(elapsed_ms))
    }

    async fn via_edi(&self, request: &PreAuthRequest, provider: &InsuranceProvider) -> Result<PreAuthResponse, GatewayError> {
        let codec = self.client.codec();
        let outbound = codec.build_prior_auth_request(request, provider, Utc::now())?;
        let raw = self.client.post_edi(provider, outbound).await?;
        Ok(codec.parse_prior_auth_response(&raw, provider.id.clone())?)
    }

    async fn via_rest(
        &self,
        request: &PreAuthRequest,
        provider: &InsuranceProvider,
        dialect: RestDialect,
    ) -> Result<PreAuthResponse, GatewayError> {
        let reply: PreAuthReply = self
            .client
            .post_json(provider, dialect, PREAUTH_PATH, &PreAuthPayload::from(request))
            .await?;
        from_reply(provider.id.clone(), reply)
    }
}

/// Maps a REST decision; unknown statuses become denials
fn from_reply(provider_id: ProviderId, reply: PreAuthReply) -> Result<PreAuthResponse, GatewayError> {
    let number = match reply.pre_auth_number.filter(|n| !n.trim().is_empty()) {
        Some(number) => PreAuthNumber::new(number)
            .map_err(|e| GatewayError::protocol(format!("payer authorization number: {e}")))?,
        None => {
            let number = generate_tracking_number()?;
            warn!(provider = %provider_id, tracking_number = %number, "Payer decision carried no authorization number");
            number
        }
    };

    let (status, denial_reason) = match PreAuthStatus::from_payer_code(&reply.status) {
        Some(status) => (status, reply.denial_reason),
        None => {
            warn!(provider = %provider_id, payer_status = %reply.status, "Unknown pre-authorization status treated as denial");
            (PreAuthStatus::Denied, None)
        }
    };

    Ok(
        PreAuthResponse::decided(number, provider_id, status, usd(reply.approval_amount), denial_reason)
            .with_conditions(reply.conditions)
            .with_expiration(reply.expiration_date),
    )
}
