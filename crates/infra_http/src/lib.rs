//! Infrastructure HTTP Layer
//!
//! Outbound transport shared by the REST and EDI-over-HTTP payer paths:
//! - a pooled reqwest client behind the `PayerExchange` seam
//! - per-attempt timeouts and a fixed or exponential retry policy
//! - standard payer headers (content type, accept, bearer token, API key)
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_http::{ClientConfig, HttpTransport, ReqwestExchange, RetryPolicy};
//!
//! let exchange = ReqwestExchange::new(&ClientConfig::default())?;
//! let transport = HttpTransport::new(Arc::new(exchange), RetryPolicy::default(), timeout);
//! let delivery = transport.execute(&PayerRequest::edi(&provider, interchange)).await?;
//! ```

pub mod client;
pub mod error;
pub mod exchange;
pub mod retry;
pub mod transport;

pub use client::{ClientConfig, ReqwestExchange};
pub use error::TransportError;
pub use exchange::{
    ExchangeFailure, HttpMethod, PayerExchange, PayerReply, PayerRequest, EDI_CONTENT_TYPE,
};
pub use retry::{Backoff, BackoffKind, RetryPolicy};
pub use transport::{Delivery, HttpTransport};
