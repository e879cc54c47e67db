//! Local claim validation
//!
//! Everything here runs before a claim is encoded, so a failing claim never
//! reaches a payer.

use rust_decimal::Decimal;

use core_kernel::{check_codes, check_diagnosis_codes, check_element, Money};

use crate::claim::ClaimSubmission;
use crate::error::ClaimError;

/// Default hard limit on a single claim total
pub const DEFAULT_CLAIM_AMOUNT_CEILING: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Half a cent; itemized charges must reconcile with the total within this
pub const DEFAULT_CHARGE_TOLERANCE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Pre-submission rules for claims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimValidator {
    ceiling: Decimal,
    tolerance: Decimal,
}

impl Default for ClaimValidator {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CLAIM_AMOUNT_CEILING,
            tolerance: DEFAULT_CHARGE_TOLERANCE,
        }
    }
}

impl ClaimValidator {
    pub fn new(ceiling: Decimal) -> Self {
        Self {
            ceiling,
            ..Self::default()
        }
    }

    pub fn ceiling(&self) -> Decimal {
        self.ceiling
    }

    /// Validates a claim
    ///
    /// # Errors
    ///
    /// Returns the first rule the claim breaks, in this order: amount
    /// bounds, code lists, charge reconciliation, patient responsibility,
    /// per-line checks, member identifiers.
    pub fn validate(&self, claim: &ClaimSubmission) -> Result<(), ClaimError> {
        let currency = claim.total_amount.currency();

        if !claim.total_amount.is_positive() {
            return Err(ClaimError::NonPositiveTotal(claim.total_amount.to_string()));
        }
        if claim.total_amount.amount() > self.ceiling {
            return Err(ClaimError::ExceedsCeiling {
                total: claim.total_amount.to_string(),
                ceiling: Money::new(self.ceiling, currency).to_string(),
            });
        }

        if claim.diagnosis_codes.is_empty() {
            return Err(ClaimError::NoDiagnosisCodes);
        }
        if claim.procedure_codes.is_empty() {
            return Err(ClaimError::NoProcedureCodes);
        }

        let charges = claim.charges_total()?;
        if !charges.approx_eq(&claim.total_amount, self.tolerance) {
            return Err(ClaimError::ChargeMismatch {
                charges: charges.to_string(),
                total: claim.total_amount.to_string(),
            });
        }

        self.check_patient_responsibility(&claim.patient_responsibility, &claim.total_amount)?;

        for (index, charge) in claim.charges.iter().enumerate() {
            let line = index + 1;
            if !charge.amount.is_positive() {
                return Err(ClaimError::InvalidCharge {
                    line,
                    reason: format!("amount must be positive, got {}", charge.amount),
                });
            }
            if charge.units == 0 {
                return Err(ClaimError::InvalidCharge {
                    line,
                    reason: "units must be at least 1".to_string(),
                });
            }
            if !claim.service_period.contains(charge.service_date) {
                return Err(ClaimError::InvalidCharge {
                    line,
                    reason: format!("service date {} is outside the claim service period", charge.service_date),
                });
            }
            check_element("procedure code", &charge.procedure_code, core_kernel::identifiers::MAX_CODE_LEN)?;
        }

        check_diagnosis_codes(&claim.diagnosis_codes)?;
        check_codes("procedure code", &claim.procedure_codes)?;
        check_element("place of service", &claim.place_of_service, 2)?;
        claim.subscriber.validate()?;
        Ok(())
    }

    fn check_patient_responsibility(&self, amount: &Money, total: &Money) -> Result<(), ClaimError> {
        if amount.currency() != total.currency() {
            return Err(core_kernel::MoneyError::CurrencyMismatch(
                amount.currency().to_string(),
                total.currency().to_string(),
            )
            .into());
        }
        if amount.is_negative() || amount.amount() > total.amount() {
            return Err(ClaimError::InvalidPatientResponsibility(amount.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_CLAIM_AMOUNT_CEILING, Decimal::new(1_000_000, 0));
        assert_eq!(DEFAULT_CHARGE_TOLERANCE, Decimal::new(5, 3));
    }

    #[test]
    fn test_custom_ceiling() {
        let validator = ClaimValidator::new(Decimal::new(5_000, 0));
        assert_eq!(validator.ceiling(), Decimal::new(5_000, 0));
    }
}
