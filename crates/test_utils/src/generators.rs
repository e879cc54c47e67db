//! Property-Based Test Generators
//!
//! Provides proptest strategies for gateway requests. Every generated value
//! passes local validation, so properties exercise the wire path rather than
//! the validators.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{ClaimNumber, DateRange, Money, Npi, PreAuthNumber};
use domain_claims::{ClaimCharge, ClaimSubmission, ProviderNpis, OFFICE_PLACE_OF_SERVICE};
use domain_eligibility::{Demographics, EligibilityRequest, Gender, Subscriber};
use domain_preauth::{PreAuthRequest, Urgency};

/// Strategy for X12-safe alphanumeric identifiers
pub fn identifier_strategy(prefix: &'static str) -> impl Strategy<Value = String> {
    "[A-Z0-9]{4,12}".prop_map(move |s| format!("{prefix}{s}"))
}

/// Strategy for upper-case names without delimiters
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2,16}"
}

/// Strategy for dates in a plausible service window
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2030, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

pub fn birth_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1930i32..2020, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Strategy for valid NPIs (Luhn check digit computed)
pub fn npi_strategy() -> impl Strategy<Value = Npi> {
    "[12][0-9]{8}".prop_map(|base| {
        let check = Npi::check_digit(&base);
        Npi::new(format!("{base}{check}")).unwrap()
    })
}

pub fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Female), Just(Gender::Male), Just(Gender::Unknown)]
}

pub fn demographics_strategy() -> impl Strategy<Value = Demographics> {
    (name_strategy(), name_strategy(), birth_date_strategy(), gender_strategy()).prop_map(
        |(first_name, last_name, birth_date, gender)| Demographics {
            first_name,
            last_name,
            birth_date,
            gender,
        },
    )
}

pub fn subscriber_strategy() -> impl Strategy<Value = Subscriber> {
    (
        identifier_strategy("PAT"),
        identifier_strategy("POL"),
        identifier_strategy("MBR"),
        proptest::option::of(demographics_strategy()),
    )
        .prop_map(|(patient, policy, holder, demographics)| {
            let subscriber = Subscriber::new(patient, policy, holder);
            match demographics {
                Some(d) => subscriber.with_demographics(d),
                None => subscriber,
            }
        })
}

/// Strategy for CPT-style procedure codes
pub fn procedure_code_strategy() -> impl Strategy<Value = String> {
    "[0-9]{5}"
}

/// Strategy for ICD-10 codes in canonical spelling
pub fn diagnosis_code_strategy() -> impl Strategy<Value = String> {
    "[A-Z][0-9]{2}(\\.[0-9A-Z]{1,4})?"
}

/// Strategy for ICD-10 codes the way callers type them: dotted or not,
/// any case
pub fn diagnosis_spelling_strategy() -> impl Strategy<Value = String> {
    ("[A-Za-z][0-9]{2}", "[0-9A-Za-z]{0,4}", any::<bool>()).prop_map(|(category, rest, dotted)| {
        if dotted && !rest.is_empty() {
            format!("{category}.{rest}")
        } else {
            format!("{category}{rest}")
        }
    })
}

/// Strategy for positive USD amounts with cents
pub fn usd_amount_strategy() -> impl Strategy<Value = Money> {
    (1i64..5_000_000i64).prop_map(|cents| Money::usd(Decimal::new(cents, 2)))
}

pub fn urgency_strategy() -> impl Strategy<Value = Urgency> {
    prop_oneof![Just(Urgency::Routine), Just(Urgency::Urgent), Just(Urgency::Emergency)]
}

pub fn eligibility_request_strategy() -> impl Strategy<Value = EligibilityRequest> {
    (
        subscriber_strategy(),
        date_strategy(),
        npi_strategy(),
        prop_oneof![Just("30"), Just("1"), Just("98")],
    )
        .prop_map(|(subscriber, date, npi, service_type)| {
            EligibilityRequest::new(subscriber, date, npi).with_service_type(service_type)
        })
}

pub fn pre_auth_request_strategy() -> impl Strategy<Value = PreAuthRequest> {
    (
        subscriber_strategy(),
        date_strategy(),
        npi_strategy(),
        proptest::collection::vec(procedure_code_strategy(), 1..4),
        proptest::collection::vec(diagnosis_code_strategy(), 0..3),
        usd_amount_strategy(),
        urgency_strategy(),
    )
        .prop_map(|(subscriber, date, npi, procedures, diagnoses, cost, urgency)| {
            PreAuthRequest::new(subscriber, date, npi, procedures, cost)
                .with_diagnosis_codes(diagnoses)
                .with_urgency(urgency)
        })
}

/// Strategy for claims whose charges sum exactly to the total
pub fn claim_strategy() -> impl Strategy<Value = ClaimSubmission> {
    (
        identifier_strategy("CLM"),
        subscriber_strategy(),
        date_strategy(),
        0u64..5,
        npi_strategy(),
        npi_strategy(),
        proptest::collection::vec(diagnosis_code_strategy(), 1..4),
        proptest::collection::vec((procedure_code_strategy(), 1i64..500_000i64, 1u32..4), 1..5),
        proptest::option::of(npi_strategy()),
        proptest::option::of(identifier_strategy("PA")),
        0i64..=1000,
    )
        .prop_map(|(number, subscriber, start, span, billing, rendering, diagnoses, lines, facility, pre_auth, share)| {
            let end = core_kernel::temporal::add_days(start, span);
            let period = DateRange::new(start, end).unwrap();
            let charges: Vec<ClaimCharge> = lines
                .into_iter()
                .enumerate()
                .map(|(i, (code, cents, units))| {
                    let day = core_kernel::temporal::add_days(start, (i as u64).min(span));
                    ClaimCharge::new(code, Money::usd(Decimal::new(cents, 2)), day).with_units(units)
                })
                .collect();
            let total = Money::sum(charges.iter().map(|c| &c.amount), core_kernel::Currency::USD).unwrap();
            let patient_share = Money::usd((total.amount() * Decimal::new(share, 3)).round_dp(2));
            let mut procedure_codes: Vec<String> = Vec::new();
            for charge in &charges {
                if !procedure_codes.contains(&charge.procedure_code) {
                    procedure_codes.push(charge.procedure_code.clone());
                }
            }

            ClaimSubmission {
                claim_number: ClaimNumber::new(number).unwrap(),
                subscriber,
                providers: ProviderNpis {
                    billing,
                    rendering,
                    facility,
                },
                service_period: period,
                place_of_service: OFFICE_PLACE_OF_SERVICE.to_string(),
                diagnosis_codes: diagnoses,
                procedure_codes,
                charges,
                total_amount: total,
                patient_responsibility: patient_share,
                pre_auth_number: pre_auth.map(|n| PreAuthNumber::new(n).unwrap()),
            }
        })
}
