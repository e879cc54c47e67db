//! Claim submission and status service
//!
//! Claims are checked locally before anything is sent; a claim that fails
//! validation never reaches the payer. Duplicate suppression lives in the
//! facade, this service submits whatever it is given.

use chrono::Utc;
use std::time::Instant;
use tracing::{info, instrument};

use core_kernel::{ClaimNumber, GatewayError, ProviderId};
use domain_claims::{ClaimResponse, ClaimStatus, ClaimSubmission, ClaimValidator};
use payer_registry::{Channel, InsuranceProvider, Operation, RestDialect};

use crate::client::PayerClient;
use crate::rest::{claim_status_path, usd, ClaimPayload, ClaimReply, CLAIMS_PATH};

#[derive(Clone)]
pub struct ClaimService {
    client: PayerClient,
    validator: ClaimValidator,
}

impl ClaimService {
    pub fn new(client: PayerClient, validator: ClaimValidator) -> Self {
        Self { client, validator }
    }

    /// Runs the local checks only
    pub fn validate(&self, claim: &ClaimSubmission) -> Result<(), GatewayError> {
        Ok(self.validator.validate(claim)?)
    }

    /// Validates and submits a claim over EDI 837 or REST
    ///
    /// # Errors
    ///
    /// `Validation` before any network call, `Protocol` when the payer
    /// answers with a status that has no `ClaimStatus` mapping, plus the
    /// transport failures of the payer call.
    #[instrument(skip(self, claim, provider), fields(provider = %provider.id, claim_number = %claim.claim_number))]
    pub async fn submit(&self, claim: &ClaimSubmission, provider: &InsuranceProvider) -> Result<ClaimResponse, GatewayError> {
        self.validate(claim)?;
        provider.ensure_active()?;

        let started = Instant::now();
        let response = match provider.channel_for(Operation::ClaimSubmission)? {
            Channel::Edi => {
                let codec = self.client.codec();
                let interchange = codec.build_claim(claim, provider, Utc::now())?;
                let raw = self.client.post_edi(provider, interchange).await?;
                codec.parse_claim_status_response(&raw, provider.id.clone())?
            }
            Channel::Rest(dialect) => {
                let reply: ClaimReply = self
                    .client
                    .post_json(provider, dialect, CLAIMS_PATH, &ClaimPayload::from(claim))
                    .await?;
                from_reply(claim.claim_number.clone(), provider.id.clone(), reply)?
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        info!(status = %response.status, elapsed_ms, "Claim accepted by payer");
        Ok(response.with_processing_time(elapsed_ms))
    }

    /// Asks the payer for the current state of a submitted claim
    #[instrument(skip(self, provider), fields(provider = %provider.id))]
    pub async fn status(&self, claim_number: &ClaimNumber, provider: &InsuranceProvider) -> Result<ClaimResponse, GatewayError> {
        provider.ensure_active()?;

        let started = Instant::now();
        let response = match provider.channel_for(Operation::ClaimStatus)? {
            Channel::Edi => {
                let codec = self.client.codec();
                let inquiry = codec.build_claim_status_inquiry(claim_number, provider, Utc::now())?;
                let raw = self.client.post_edi(provider, inquiry).await?;
                codec.parse_claim_status_response(&raw, provider.id.clone())?
            }
            Channel::Rest(dialect) => self.status_via_rest(claim_number, provider, dialect).await?,
        };

        Ok(response.with_processing_time(started.elapsed().as_millis() as u64))
    }

    async fn status_via_rest(
        &self,
        claim_number: &ClaimNumber,
        provider: &InsuranceProvider,
        dialect: RestDialect,
    ) -> Result<ClaimResponse, GatewayError> {
        let reply: ClaimReply = self
            .client
            .get_json(provider, dialect, &claim_status_path(claim_number)?)
            .await?;
        from_reply(claim_number.clone(), provider.id.clone(), reply)
    }
}

fn from_reply(claim_number: ClaimNumber, provider_id: ProviderId, reply: ClaimReply) -> Result<ClaimResponse, GatewayError> {
    let status = ClaimStatus::from_payer_code(&reply.status).ok_or_else(|| {
        GatewayError::protocol(format!(
            "provider {provider_id} returned unknown claim status '{}'",
            reply.status
        ))
    })?;

    let mut response = ClaimResponse::new(claim_number, provider_id, status);
    response.payer_claim_id = reply.payer_claim_id.filter(|id| !id.trim().is_empty());
    response.approved_amount = usd(reply.approved_amount);
    response.paid_amount = usd(reply.paid_amount);
    response.denial_reason = reply.denial_reason;
    response.messages = reply.messages;
    Ok(response)
}
