//! Custom Test Assertions
//!
//! Provides assertion helpers for money values, X12 interchanges and
//! recorded payer requests that give more meaningful failure messages than
//! standard assertions.

use rust_decimal::Decimal;

use core_kernel::Money;
use infra_http::PayerRequest;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that money values sum to a total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = Money::sum(parts.iter(), total.currency()).expect("Currency mismatch in sum");
    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Splits an interchange on its segment terminator
///
/// The terminator is the character right after the 106-character ISA.
pub fn x12_segments(raw: &str) -> Vec<String> {
    let terminator = raw.chars().nth(105).expect("interchange shorter than an ISA header");
    raw.split(terminator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Asserts the interchange opens with ISA and closes with IEA
pub fn assert_x12_envelope(raw: &str) {
    let segments = x12_segments(raw);
    assert!(
        segments.first().is_some_and(|s| s.starts_with("ISA")),
        "Interchange does not start with ISA: {:?}",
        segments.first()
    );
    assert!(
        segments.last().is_some_and(|s| s.starts_with("IEA")),
        "Interchange does not end with IEA: {:?}",
        segments.last()
    );
}

/// Asserts that a segment starting with `prefix` is present
///
/// `prefix` uses the interchange's own element separator, e.g. `"NM1|IL"`.
pub fn assert_segment_present(raw: &str, prefix: &str) {
    let segments = x12_segments(raw);
    assert!(
        segments.iter().any(|s| s.starts_with(prefix)),
        "No segment starting with {prefix:?} in {segments:?}"
    );
}

/// Asserts that a recorded request carried a header value
pub fn assert_header(request: &PayerRequest, name: &str, expected: &str) {
    assert_eq!(
        request.header(name),
        Some(expected),
        "Header {name} mismatch on request to {}",
        request.url
    );
}
