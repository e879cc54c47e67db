//! Payer client shared by the services
//!
//! Wraps the retrying transport and the X12 codec. Every call returns the
//! decoded body plus the number of attempts it took.

use serde::de::DeserializeOwned;
use serde::Serialize;

use core_kernel::GatewayError;
use edi_x12::X12Codec;
use infra_http::{HttpTransport, PayerRequest, RetryPolicy};
use payer_registry::{InsuranceProvider, RestDialect};

#[derive(Clone)]
pub struct PayerClient {
    transport: HttpTransport,
    codec: X12Codec,
}

impl PayerClient {
    pub fn new(transport: HttpTransport, codec: X12Codec) -> Self {
        Self { transport, codec }
    }

    pub fn codec(&self) -> &X12Codec {
        &self.codec
    }

    /// Same exchange and codec under a different retry policy
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            transport: self.transport.with_policy(policy),
            codec: self.codec.clone(),
        }
    }

    /// POSTs an interchange to the payer's EDI endpoint and returns the raw reply
    pub async fn post_edi(&self, provider: &InsuranceProvider, interchange: String) -> Result<String, GatewayError> {
        let delivery = self.transport.execute(&PayerRequest::edi(provider, interchange)).await?;
        Ok(delivery.reply.body)
    }

    pub async fn post_json<P, R>(
        &self,
        provider: &InsuranceProvider,
        dialect: RestDialect,
        path: &str,
        payload: &P,
    ) -> Result<R, GatewayError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = PayerRequest::post_json(provider, dialect, path, payload)?;
        let delivery = self.transport.execute(&request).await?;
        decode(provider, path, &delivery.reply.body)
    }

    pub async fn get_json<R>(&self, provider: &InsuranceProvider, dialect: RestDialect, path: &str) -> Result<R, GatewayError>
    where
        R: DeserializeOwned,
    {
        let delivery = self.transport.execute(&PayerRequest::get_json(provider, dialect, path)).await?;
        decode(provider, path, &delivery.reply.body)
    }
}

fn decode<R: DeserializeOwned>(provider: &InsuranceProvider, path: &str, body: &str) -> Result<R, GatewayError> {
    serde_json::from_str(body).map_err(|e| {
        GatewayError::protocol(format!("provider {} returned an unreadable {path} response: {e}", provider.id))
    })
}
