//! Comprehensive tests for domain_claims

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{ClaimNumber, Currency, DateRange, GatewayError, IdentifierError, Money, Npi};
use domain_eligibility::Subscriber;

use domain_claims::*;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

fn create_test_claim() -> ClaimSubmission {
    ClaimSubmission {
        claim_number: ClaimNumber::new("CLM-2024-0001").unwrap(),
        subscriber: Subscriber::new("PAT-1", "POL-1", "MBR-1"),
        providers: ProviderNpis {
            billing: Npi::new("1234567893").unwrap(),
            rendering: Npi::new("1234567893").unwrap(),
            facility: None,
        },
        service_period: DateRange::new(date(1), date(3)).unwrap(),
        place_of_service: OFFICE_PLACE_OF_SERVICE.to_string(),
        diagnosis_codes: vec!["J45.909".to_string()],
        procedure_codes: vec!["99213".to_string(), "94640".to_string()],
        charges: vec![
            ClaimCharge::new("99213", Money::usd(dec!(150.00)), date(1)),
            ClaimCharge::new("94640", Money::usd(dec!(75.50)), date(3)).with_units(2),
        ],
        total_amount: Money::usd(dec!(225.50)),
        patient_responsibility: Money::usd(dec!(25)),
        pre_auth_number: None,
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_claim_passes() {
        assert!(ClaimValidator::default().validate(&create_test_claim()).is_ok());
    }

    #[test]
    fn test_empty_diagnosis_codes() {
        let mut claim = create_test_claim();
        claim.diagnosis_codes.clear();

        let err = ClaimValidator::default().validate(&claim).unwrap_err();
        assert_eq!(err, ClaimError::NoDiagnosisCodes);

        let gateway: GatewayError = err.into();
        assert!(matches!(
            gateway,
            GatewayError::Validation(ref msg) if msg == "at least one diagnosis code required"
        ));
    }

    #[test]
    fn test_empty_procedure_codes() {
        let mut claim = create_test_claim();
        claim.procedure_codes.clear();
        assert_eq!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::NoProcedureCodes)
        );
    }

    #[test]
    fn test_diagnosis_codes_must_be_canonical() {
        let mut claim = create_test_claim();
        claim.diagnosis_codes = vec!["E119".to_string(), "z00.00".to_string()];
        assert_eq!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::InvalidIdentifier(IdentifierError::NonCanonicalDiagnosis {
                value: "E119".to_string(),
                expected: "E11.9".to_string(),
            }))
        );

        claim.diagnosis_codes = vec!["E11.9".to_string(), "z00.00".to_string()];
        let err: GatewayError = ClaimValidator::default().validate(&claim).unwrap_err().into();
        assert_eq!(err.to_string(), "Validation error: diagnosis code \"z00.00\" must be written \"Z00.00\"");

        claim.diagnosis_codes = vec!["NOT-A-CODE".to_string()];
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::InvalidIdentifier(IdentifierError::InvalidDiagnosis { .. }))
        ));
    }

    #[test]
    fn test_charge_mismatch() {
        let mut claim = create_test_claim();
        claim.total_amount = Money::usd(dec!(230.00));
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::ChargeMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_total_rejected() {
        let mut claim = create_test_claim();
        claim.total_amount = Money::zero(Currency::USD);
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::NonPositiveTotal(_))
        ));
    }

    #[test]
    fn test_ceiling() {
        let claim = create_test_claim();
        let strict = ClaimValidator::new(dec!(200));
        assert!(matches!(
            strict.validate(&claim),
            Err(ClaimError::ExceedsCeiling { .. })
        ));

        let mut big = create_test_claim();
        big.total_amount = Money::usd(dec!(1000000.01));
        assert!(matches!(
            ClaimValidator::default().validate(&big),
            Err(ClaimError::ExceedsCeiling { .. })
        ));
    }

    #[test]
    fn test_total_at_ceiling_is_allowed() {
        let mut claim = create_test_claim();
        claim.charges = vec![ClaimCharge::new("99213", Money::usd(dec!(1000000)), date(1))];
        claim.total_amount = Money::usd(dec!(1000000));
        assert!(ClaimValidator::default().validate(&claim).is_ok());
    }

    #[test]
    fn test_patient_responsibility_bounds() {
        let mut claim = create_test_claim();
        claim.patient_responsibility = Money::usd(dec!(-1));
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::InvalidPatientResponsibility(_))
        ));

        claim.patient_responsibility = Money::usd(dec!(300));
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::InvalidPatientResponsibility(_))
        ));
    }

    #[test]
    fn test_mixed_currency_rejected() {
        let mut claim = create_test_claim();
        claim.charges[1].amount = Money::new(dec!(75.50), Currency::CAD);
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::Money(_))
        ));
    }

    #[test]
    fn test_charge_outside_service_period() {
        let mut claim = create_test_claim();
        claim.charges[0].service_date = date(9);
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::InvalidCharge { line: 1, .. })
        ));
    }

    #[test]
    fn test_zero_units_rejected() {
        let mut claim = create_test_claim();
        claim.charges[1].units = 0;
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::InvalidCharge { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_member_fields() {
        let mut claim = create_test_claim();
        claim.subscriber.policy_number = String::new();
        assert!(matches!(
            ClaimValidator::default().validate(&claim),
            Err(ClaimError::Member(_))
        ));
    }
}

// ============================================================================
// Status Tests
// ============================================================================

mod status_tests {
    use super::*;

    #[test]
    fn test_payer_status_codes() {
        use ClaimStatus::*;
        assert_eq!(ClaimStatus::from_payer_code(" In_Review "), Some(Processing));
        assert_eq!(ClaimStatus::from_payer_code("canceled"), Some(Cancelled));
        assert_eq!(ClaimStatus::from_payer_code("partial"), Some(PartiallyApproved));
        assert_eq!(ClaimStatus::from_payer_code("teleported"), None);
    }

    #[test]
    fn test_valid_transitions() {
        use ClaimStatus::*;
        assert!(Submitted.can_transition_to(Processing));
        assert!(Processing.can_transition_to(PartiallyApproved));
        assert!(PartiallyApproved.can_transition_to(Appealed));
        assert!(Denied.can_transition_to(Appealed));
        assert!(Appealed.can_transition_to(Processing));
        assert!(Approved.can_transition_to(Paid));
    }

    #[test]
    fn test_final_statuses_have_no_exit() {
        use ClaimStatus::*;
        let all = [Submitted, Processing, Approved, PartiallyApproved, Denied, Paid, Appealed, Cancelled];
        for from in [Paid, Cancelled] {
            assert!(all.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_transition_error_maps_to_protocol() {
        let err: GatewayError =
            ClaimError::InvalidStatusTransition { from: ClaimStatus::Paid, to: ClaimStatus::Denied }.into();
        assert!(matches!(err, GatewayError::Protocol(ref m) if m == "Invalid status transition from PAID to DENIED"));
    }

    #[test]
    fn test_all_claim_statuses_serialize() {
        let statuses = [
            ClaimStatus::Submitted,
            ClaimStatus::Processing,
            ClaimStatus::Approved,
            ClaimStatus::PartiallyApproved,
            ClaimStatus::Denied,
            ClaimStatus::Paid,
            ClaimStatus::Appealed,
            ClaimStatus::Cancelled,
        ];

        for status in statuses {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mismatched_totals_always_fail(
            lines in proptest::collection::vec(1i64..100_000, 1..6),
            delta in 1i64..10_000,
        ) {
            let mut claim = create_test_claim();
            claim.charges = lines
                .iter()
                .map(|cents| ClaimCharge::new("99213", Money::from_minor(*cents, Currency::USD), date(2)))
                .collect();
            let sum: i64 = lines.iter().sum();
            claim.total_amount = Money::from_minor(sum + delta, Currency::USD);
            claim.patient_responsibility = Money::zero(Currency::USD);

            let result = ClaimValidator::default().validate(&claim);
            let is_mismatch = matches!(result, Err(ClaimError::ChargeMismatch { .. }));
            prop_assert!(is_mismatch);
        }

        #[test]
        fn matching_totals_pass(lines in proptest::collection::vec(1i64..100_000, 1..6)) {
            let mut claim = create_test_claim();
            claim.charges = lines
                .iter()
                .map(|cents| ClaimCharge::new("99213", Money::from_minor(*cents, Currency::USD), date(2)))
                .collect();
            claim.total_amount = Money::from_minor(lines.iter().sum(), Currency::USD);
            claim.patient_responsibility = Money::zero(Currency::USD);

            prop_assert!(ClaimValidator::default().validate(&claim).is_ok());
        }
    }
}
