//! Tests for the gateway error taxonomy

use core_kernel::{ClaimNumber, GatewayError, Money, Currency};
use rust_decimal_macros::dec;

#[test]
fn test_validation_helper() {
    let error = GatewayError::validation("at least one diagnosis code required");

    match error {
        GatewayError::Validation(msg) => assert_eq!(msg, "at least one diagnosis code required"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_only_transport_errors_are_retryable() {
    let transport = GatewayError::Transport { attempts: 3, message: "503".to_string() };
    assert!(transport.is_retryable());

    assert!(!GatewayError::validation("bad").is_retryable());
    assert!(!GatewayError::configuration("bad").is_retryable());
    assert!(!GatewayError::ProviderRejected { status: 400, message: "bad".to_string() }.is_retryable());
}

#[test]
fn test_error_codes_are_distinct() {
    let errors = [
        GatewayError::configuration("x"),
        GatewayError::validation("x"),
        GatewayError::provider_not_found("x"),
        GatewayError::PreAuthNotRequired("x".to_string()),
        GatewayError::ProviderRejected { status: 422, message: "x".to_string() },
        GatewayError::Transport { attempts: 1, message: "x".to_string() },
        GatewayError::protocol("x"),
        GatewayError::Signature("x".to_string()),
    ];
    let mut codes: Vec<&str> = errors.iter().map(GatewayError::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn test_identifier_errors_become_validation_errors() {
    let err: GatewayError = ClaimNumber::new("").unwrap_err().into();
    assert!(matches!(err, GatewayError::Validation(_)));
}

#[test]
fn test_money_errors_become_validation_errors() {
    let usd = Money::usd(dec!(1));
    let eur = Money::new(dec!(1), Currency::EUR);
    let err: GatewayError = usd.checked_add(&eur).unwrap_err().into();
    assert!(matches!(err, GatewayError::Validation(_)));
}

#[test]
fn test_transport_display_includes_attempts() {
    let error = GatewayError::Transport { attempts: 3, message: "HTTP 503".to_string() };
    assert!(error.to_string().contains("3 attempt(s)"));
}
