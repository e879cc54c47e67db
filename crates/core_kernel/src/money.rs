//! Money types with precise decimal arithmetic
//!
//! Charges, thresholds and payer-approved amounts are carried as `Money` so
//! that claim totals can be reconciled exactly against their itemized lines.
//! Amounts cross the wire either as X12 monetary elements (`R` type, no
//! thousands separators, at most two decimals) or as JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    USD,
    CAD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::CAD => "C$",
            Currency::EUR => "€",
            Currency::GBP => "£",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::CAD => "CAD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A monetary amount with associated currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value, rounded to the currency's minor unit
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(currency.decimal_places()),
            currency,
        }
    }

    /// Shorthand for a US dollar amount
    pub fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }

    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        Self::new(Decimal::new(minor_units, currency.decimal_places()), currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Sums a sequence of amounts that must all share `currency`
    pub fn sum<'a, I>(items: I, currency: Currency) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    /// Returns true when both amounts share a currency and differ by no more
    /// than `tolerance`
    pub fn approx_eq(&self, other: &Money, tolerance: Decimal) -> bool {
        self.currency == other.currency && (self.amount - other.amount).abs() <= tolerance
    }

    /// Renders the amount as an X12 `R` element: plain decimal, no trailing
    /// zeros, no leading `+`
    pub fn to_x12(&self) -> String {
        self.amount.normalize().to_string()
    }

    /// Parses an X12 monetary element
    pub fn from_x12(value: &str, currency: Currency) -> Result<Money, MoneyError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::InvalidAmount("empty monetary element".to_string()));
        }
        Decimal::from_str(trimmed)
            .map(|amount| Money::new(amount, currency))
            .map_err(|e| MoneyError::InvalidAmount(format!("{trimmed}: {e}")))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{}{:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_rounds_to_cents() {
        let m = Money::usd(dec!(100.505));
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::usd(dec!(100.00));
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_x12_rendering_drops_trailing_zeros() {
        assert_eq!(Money::usd(dec!(1500.00)).to_x12(), "1500");
        assert_eq!(Money::usd(dec!(75.50)).to_x12(), "75.5");
        assert_eq!(Money::usd(dec!(0.05)).to_x12(), "0.05");
    }

    #[test]
    fn test_x12_parse() {
        let m = Money::from_x12("250.75", Currency::USD).unwrap();
        assert_eq!(m.amount(), dec!(250.75));
        assert!(Money::from_x12("", Currency::USD).is_err());
        assert!(Money::from_x12("12,00", Currency::USD).is_err());
    }

    #[test]
    fn test_sum_and_approx_eq() {
        let lines = [Money::usd(dec!(100.10)), Money::usd(dec!(49.90))];
        let total = Money::sum(lines.iter(), Currency::USD).unwrap();
        assert_eq!(total.amount(), dec!(150.00));
        assert!(total.approx_eq(&Money::usd(dec!(150.00)), dec!(0.005)));
        assert!(!total.approx_eq(&Money::usd(dec!(150.01)), dec!(0.005)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::usd(dec!(1400)).to_string(), "$1400.00");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn x12_rendering_round_trips(minor in 0i64..10_000_000_000i64) {
            let money = Money::from_minor(minor, Currency::USD);
            let parsed = Money::from_x12(&money.to_x12(), Currency::USD).unwrap();
            prop_assert_eq!(parsed, money);
        }

        #[test]
        fn sum_matches_minor_unit_total(parts in proptest::collection::vec(0i64..1_000_000i64, 1..20)) {
            let lines: Vec<Money> = parts.iter().map(|p| Money::from_minor(*p, Currency::USD)).collect();
            let total = Money::sum(lines.iter(), Currency::USD).unwrap();
            prop_assert_eq!(total, Money::from_minor(parts.iter().sum(), Currency::USD));
        }
    }
}
