//! Single-attempt payer exchange
//!
//! `PayerExchange` is the seam between the retry policy and the wire. The
//! production implementation is `ReqwestExchange`; tests substitute a
//! scripted payer that records every request.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use core_kernel::ProviderId;
use payer_registry::{InsuranceProvider, RestDialect};

use crate::error::TransportError;

/// Content type of X12 payloads
pub const EDI_CONTENT_TYPE: &str = "application/edi-x12";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        })
    }
}

/// Outbound request to one payer, headers included
#[derive(Clone)]
pub struct PayerRequest {
    pub provider_id: ProviderId,
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl fmt::Debug for PayerRequest {
    /// Header values and bodies carry credentials and PHI
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayerRequest")
            .field("provider_id", &self.provider_id)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("body_len", &self.body.as_ref().map(String::len))
            .finish()
    }
}

impl PayerRequest {
    /// X12 interchange posted to the provider's EDI endpoint
    pub fn edi(provider: &InsuranceProvider, interchange: String) -> Self {
        let mut request = Self {
            provider_id: provider.id.clone(),
            method: HttpMethod::Post,
            url: provider.edi_url(),
            headers: vec![
                ("Content-Type".to_string(), EDI_CONTENT_TYPE.to_string()),
                ("Accept".to_string(), EDI_CONTENT_TYPE.to_string()),
            ],
            body: Some(interchange),
        };
        request.add_bearer(provider);
        request
    }

    /// JSON body posted to `{endpoint}{path}`
    pub fn post_json<T: Serialize>(
        provider: &InsuranceProvider,
        dialect: RestDialect,
        path: &str,
        payload: &T,
    ) -> Result<Self, TransportError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| TransportError::InvalidRequest(format!("cannot serialise payload: {e}")))?;
        let mut request = Self::rest(provider, dialect, HttpMethod::Post, path);
        request
            .headers
            .push(("Content-Type".to_string(), dialect.content_type().to_string()));
        request.body = Some(body);
        Ok(request)
    }

    pub fn get_json(provider: &InsuranceProvider, dialect: RestDialect, path: &str) -> Self {
        Self::rest(provider, dialect, HttpMethod::Get, path)
    }

    fn rest(provider: &InsuranceProvider, dialect: RestDialect, method: HttpMethod, path: &str) -> Self {
        let mut request = Self {
            provider_id: provider.id.clone(),
            method,
            url: provider.rest_url(path),
            headers: vec![("Accept".to_string(), dialect.content_type().to_string())],
            body: None,
        };
        request.add_bearer(provider);
        if let Some(key) = provider.api_key() {
            request.headers.push(("X-API-Key".to_string(), key.to_string()));
        }
        request
    }

    fn add_bearer(&mut self, provider: &InsuranceProvider) {
        if let Some(key) = provider.api_key() {
            self.headers
                .push(("Authorization".to_string(), format!("Bearer {key}")));
        }
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw payer reply; any HTTP status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerReply {
    pub status: u16,
    pub body: String,
}

impl PayerReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Failure before any HTTP status was received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeFailure {
    Connect(String),
    Timeout,
    Io(String),
    /// The request itself cannot be sent (bad URL or header value)
    Invalid(String),
}

impl fmt::Display for ExchangeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeFailure::Connect(msg) => write!(f, "connection failed: {msg}"),
            ExchangeFailure::Timeout => f.write_str("request timed out"),
            ExchangeFailure::Io(msg) => write!(f, "I/O error: {msg}"),
            ExchangeFailure::Invalid(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

/// One attempt against a payer
#[async_trait]
pub trait PayerExchange: Send + Sync {
    async fn send(&self, request: &PayerRequest) -> Result<PayerReply, ExchangeFailure>;
}
