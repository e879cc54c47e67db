//! Pooled reqwest client
//!
//! One `reqwest::Client` is shared by every payer call. Dropping the last
//! handle closes all pooled connections.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::TransportError;
use crate::exchange::{ExchangeFailure, HttpMethod, PayerExchange, PayerReply, PayerRequest};

/// Connection pool and client options
///
/// # Example
///
/// ```rust
/// use infra_http::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .request_timeout(Duration::from_secs(10))
///     .pool_max_idle_per_host(4);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for one request, connect included
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Idle connections kept per payer host
    pub pool_max_idle_per_host: usize,
    /// Idle connections are closed after this long
    pub pool_idle_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: concat!("payer-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// `PayerExchange` over a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestExchange {
    client: Client,
}

impl ReqwestExchange {
    /// Builds the pooled client
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Client` if the TLS backend cannot be set up
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        info!(
            pool_max_idle_per_host = config.pool_max_idle_per_host,
            timeout_secs = config.request_timeout.as_secs(),
            "Creating payer HTTP client"
        );

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PayerExchange for ReqwestExchange {
    async fn send(&self, request: &PayerRequest) -> Result<PayerReply, ExchangeFailure> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            let name = HeaderName::from_str(name)
                .map_err(|_| ExchangeFailure::Invalid(format!("header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ExchangeFailure::Invalid(format!("value of header '{name}'")))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;
        Ok(PayerReply { status, body })
    }
}

fn classify(err: reqwest::Error) -> ExchangeFailure {
    if err.is_timeout() {
        ExchangeFailure::Timeout
    } else if err.is_connect() {
        ExchangeFailure::Connect(err.to_string())
    } else if err.is_builder() {
        ExchangeFailure::Invalid(err.to_string())
    } else {
        ExchangeFailure::Io(err.to_string())
    }
}
