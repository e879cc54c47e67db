//! Transport error types

use thiserror::Error;

use core_kernel::GatewayError;

/// Longest payer body excerpt kept in a rejection
const REJECTION_EXCERPT: usize = 512;

/// Errors surfaced by the HTTP transport after the retry policy ran
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The payer answered 4xx; never retried
    #[error("Payer rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The payer answered outside 2xx, 4xx and 5xx; never retried
    #[error("Payer answered with unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    /// Every attempt failed with a transient error
    #[error("Gave up after {attempts} attempt(s): {message}")]
    Exhausted { attempts: u32, message: String },

    /// The request cannot be built or sent as configured
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client could not be created
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    pub fn rejected(status: u16, body: &str) -> Self {
        TransportError::Rejected {
            status,
            body: body.chars().take(REJECTION_EXCERPT).collect(),
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected { status, body } => GatewayError::ProviderRejected {
                status,
                message: body,
            },
            TransportError::UnexpectedStatus { status } => {
                GatewayError::Protocol(format!("payer answered with unexpected status {status}"))
            }
            TransportError::Exhausted { attempts, message } => {
                GatewayError::Transport { attempts, message }
            }
            TransportError::InvalidRequest(message) | TransportError::Client(message) => {
                GatewayError::Configuration(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_mapping() {
        let err: GatewayError = TransportError::rejected(404, "no such member").into();
        assert!(matches!(err, GatewayError::ProviderRejected { status: 404, .. }));

        let err: GatewayError = TransportError::Exhausted {
            attempts: 3,
            message: "status 503".to_string(),
        }
        .into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("3 attempt"));

        let err: GatewayError = TransportError::UnexpectedStatus { status: 302 }.into();
        assert!(matches!(err, GatewayError::Protocol(ref m) if m.contains("302")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rejection_body_is_truncated() {
        let body = "x".repeat(2000);
        match TransportError::rejected(400, &body) {
            TransportError::Rejected { body, .. } => assert_eq!(body.len(), REJECTION_EXCERPT),
            other => panic!("unexpected {other:?}"),
        }
    }
}
