//! Eligibility service
//!
//! Every call goes to the payer; nothing is cached since coverage can
//! change between two visits.

use chrono::Utc;
use std::time::Instant;
use tracing::{info, instrument};

use core_kernel::GatewayError;
use domain_eligibility::{CoverageWindow, EligibilityRequest, EligibilityResponse};
use payer_registry::{Channel, InsuranceProvider, Operation, RestDialect};

use crate::client::PayerClient;
use crate::rest::{usd, EligibilityPayload, EligibilityReply, ELIGIBILITY_PATH};

#[derive(Clone)]
pub struct EligibilityService {
    client: PayerClient,
}

impl EligibilityService {
    pub fn new(client: PayerClient) -> Self {
        Self { client }
    }

    /// Checks coverage for one member and service date
    ///
    /// The wall-clock latency of the whole call, retries included, is
    /// attached as `response_time_ms`.
    ///
    /// # Errors
    ///
    /// `Validation` for incomplete member data, `Configuration` for an
    /// inactive or unroutable provider, `Transport`/`ProviderRejected` for
    /// payer failures and `Protocol` for unreadable replies.
    #[instrument(skip(self, request, provider), fields(provider = %provider.id))]
    pub async fn check(
        &self,
        request: &EligibilityRequest,
        provider: &InsuranceProvider,
    ) -> Result<EligibilityResponse, GatewayError> {
        request.validate()?;
        provider.ensure_active()?;
        let channel = provider.channel_for(Operation::Eligibility)?;

        let started = Instant::now();
        let response = match channel {
            Channel::Edi => self.via_edi(request, provider).await?,
            Channel::Rest(dialect) => self.via_rest(request, provider, dialect).await?,
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        info!(
            eligible = response.eligible,
            latency_ms,
            warnings = response.warnings.len(),
            "Eligibility determined"
        );
        Ok(response.with_response_time(latency_ms))
    }

    async fn via_edi(
        &self,
        request: &EligibilityRequest,
        provider: &InsuranceProvider,
    ) -> Result<EligibilityResponse, GatewayError> {
        let codec = self.client.codec();
        let inquiry = codec.build_eligibility_inquiry(request, provider, Utc::now())?;
        let raw = self.client.post_edi(provider, inquiry).await?;
        Ok(codec.parse_eligibility_response(&raw, provider.id.clone())?)
    }

    async fn via_rest(
        &self,
        request: &EligibilityRequest,
        provider: &InsuranceProvider,
        dialect: RestDialect,
    ) -> Result<EligibilityResponse, GatewayError> {
        let reply: EligibilityReply = self
            .client
            .post_json(provider, dialect, ELIGIBILITY_PATH, &EligibilityPayload::from(request))
            .await?;
        Ok(from_reply(provider, reply))
    }
}

fn from_reply(provider: &InsuranceProvider, reply: EligibilityReply) -> EligibilityResponse {
    let mut warnings = Vec::new();
    let coverage = match CoverageWindow::new(reply.coverage_start_date, reply.coverage_end_date) {
        Ok(window) => window,
        Err(e) => {
            warnings.push(format!("coverage window ignored: {e}"));
            CoverageWindow::default()
        }
    };
    if reply.eligible && !coverage.is_known() && warnings.is_empty() {
        warnings.push("coverage dates missing from payer response".to_string());
    }

    let mut response = EligibilityResponse::new(provider.id.clone(), reply.eligible).with_coverage(coverage);
    response.requires_pre_auth = reply.requires_pre_auth;
    response.deductible_remaining = usd(reply.deductible_remaining);
    response.out_of_pocket_remaining = usd(reply.out_of_pocket_remaining);
    response.limitations = reply.limitations;
    response.warnings = warnings;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::Money;
    use rust_decimal_macros::dec;
    use test_utils::ProviderFixtures;

    fn reply(start: Option<NaiveDate>, end: Option<NaiveDate>) -> EligibilityReply {
        EligibilityReply {
            eligible: true,
            coverage_start_date: start,
            coverage_end_date: end,
            requires_pre_auth: false,
            deductible_remaining: Some(dec!(250)),
            out_of_pocket_remaining: None,
            limitations: Vec::new(),
        }
    }

    #[test]
    fn test_reply_mapping() {
        let provider = ProviderFixtures::rest_provider();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        let end = NaiveDate::from_ymd_opt(2024, 12, 31);

        let response = from_reply(&provider, reply(start, end));
        assert!(response.is_clean());
        assert_eq!(response.coverage.start(), start);
        assert_eq!(response.deductible_remaining, Some(Money::usd(dec!(250))));
    }

    #[test]
    fn test_inverted_window_becomes_warning() {
        let provider = ProviderFixtures::rest_provider();
        let response = from_reply(
            &provider,
            reply(NaiveDate::from_ymd_opt(2024, 12, 31), NaiveDate::from_ymd_opt(2024, 1, 1)),
        );
        assert!(!response.coverage.is_known());
        assert!(response.warnings[0].contains("coverage window ignored"));
    }

    #[test]
    fn test_missing_dates_flagged() {
        let provider = ProviderFixtures::rest_provider();
        let response = from_reply(&provider, reply(None, None));
        assert!(response.warnings[0].contains("coverage dates missing"));
    }
}
