//! EDI codec errors

use thiserror::Error;

use core_kernel::GatewayError;

/// Errors raised while building or reading X12 interchanges
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EdiError {
    /// A provider field required for encoding is absent
    #[error("EDI configuration error: {0}")]
    Configuration(String),

    /// Input is not a readable interchange
    #[error("Malformed X12: {0}")]
    Malformed(String),

    #[error("Missing required segment {0}")]
    MissingSegment(String),

    /// A typed value cannot be represented in the target element
    #[error("Cannot encode {0}")]
    Encoding(String),
}

impl EdiError {
    pub fn malformed(message: impl Into<String>) -> Self {
        EdiError::Malformed(message.into())
    }

    pub fn missing(segment: impl Into<String>) -> Self {
        EdiError::MissingSegment(segment.into())
    }
}

impl From<EdiError> for GatewayError {
    fn from(err: EdiError) -> Self {
        match err {
            EdiError::Configuration(message) => GatewayError::Configuration(message),
            EdiError::Encoding(_) => GatewayError::Validation(err.to_string()),
            EdiError::Malformed(_) | EdiError::MissingSegment(_) => {
                GatewayError::Protocol(err.to_string())
            }
        }
    }
}
