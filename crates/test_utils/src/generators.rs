//! Property-Based Test Generators
//!
//! Proptest strategies for claims-domain values.

use chrono::{Duration, NaiveDate};
use core_kernel::Role;
use domain_claims::{ClaimStatus, TreatmentInput};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Positive money amounts with two decimal places, 0.01 to 1,000,000.00
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Amounts at or below zero
pub fn non_positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..=0i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// `(limit, amount)` with `amount > limit`
pub fn over_limit_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (positive_amount_strategy(), 1i64..10_000_000i64)
        .prop_map(|(limit, excess)| (limit, limit + Decimal::new(excess, 2)))
}

/// `(limit, amount)` with `0 < amount <= limit`
pub fn within_limit_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (1i64..100_000_000i64, 0u32..=100u32).prop_map(|(limit_cents, percent)| {
        let limit = Decimal::new(limit_cents, 2);
        let amount = (limit * Decimal::from(percent) / Decimal::ONE_HUNDRED).round_dp(2);
        (limit, amount.max(Decimal::new(1, 2)).min(limit))
    })
}

pub fn claim_status_strategy() -> impl Strategy<Value = ClaimStatus> {
    proptest::sample::select(ClaimStatus::ALL.to_vec())
}

pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Admin),
        Just(Role::Customer),
        Just(Role::InsuranceAgent),
        Just(Role::ClaimsOfficer),
        Just(Role::HospitalManager),
    ]
}

/// Dates within 2024-2025
pub fn treatment_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..730i64).prop_map(|days| {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default() + Duration::days(days)
    })
}

pub fn diagnosis_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Fracture".to_string()),
        Just("Appendicitis".to_string()),
        Just("Migraine".to_string()),
        Just("Pneumonia".to_string()),
        "[A-Z][a-z]{4,12}",
    ]
}

/// Treatment input that passes validation
pub fn treatment_input_strategy() -> impl Strategy<Value = TreatmentInput> {
    (
        diagnosis_strategy(),
        "[a-z ]{0,40}",
        positive_amount_strategy(),
        treatment_date_strategy(),
    )
        .prop_map(|(diagnosis, treatment_details, cost, treatment_date)| TreatmentInput {
            diagnosis,
            treatment_details,
            cost,
            treatment_date,
        })
}
