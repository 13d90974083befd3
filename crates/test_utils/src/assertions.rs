//! Custom Test Assertions
//!
//! Assertion helpers for claims-domain results and ledger-wide invariants,
//! with failure messages that name the offending claim.

use std::fmt::Debug;

use domain_claims::ports::mock::LedgerState;
use domain_claims::{BusinessRuleViolation, ClaimError, ClaimStatus, ErrorKind, PaymentType};
use rust_decimal::Decimal;

/// Asserts that a result failed with the given error kind
pub fn assert_error_kind<T: Debug>(result: &Result<T, ClaimError>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {:?} error, got Ok({:?})", expected, value),
        Err(error) => assert_eq!(
            error.kind(),
            expected,
            "Expected {:?} error, got {:?}: {}",
            expected,
            error.kind(),
            error
        ),
    }
}

/// Asserts that a result failed with a business rule violation matching `predicate`
pub fn assert_violation<T: Debug>(
    result: &Result<T, ClaimError>,
    predicate: impl Fn(&BusinessRuleViolation) -> bool,
) {
    match result {
        Ok(value) => panic!("Expected business rule violation, got Ok({:?})", value),
        Err(error) => match error.violation() {
            Some(violation) => assert!(
                predicate(violation),
                "Unexpected business rule violation: {}",
                violation
            ),
            None => panic!("Expected business rule violation, got: {}", error),
        },
    }
}

/// Checks every claim in a ledger snapshot:
///
/// - `approved_amount > 0` only for Approved or Paid claims
/// - each Paid claim has exactly one payout, for its approved amount
/// - claims that are not Paid have no payout
/// - no two claims share a treatment record
pub fn assert_ledger_consistent(state: &LedgerState) {
    let mut seen_treatments = std::collections::BTreeSet::new();
    for claim in state.claims.values() {
        assert!(
            claim.approved_amount_consistent(),
            "Claim {} has approved amount {} in status {}",
            claim.id,
            claim.approved_amount,
            claim.status
        );

        let payouts: Vec<Decimal> = state
            .payments
            .values()
            .filter(|p| p.payment_type == PaymentType::Payout && p.claim_id == Some(claim.id))
            .map(|p| p.amount)
            .collect();
        if claim.status == ClaimStatus::Paid {
            assert_eq!(
                payouts,
                vec![claim.approved_amount],
                "Paid claim {} must have exactly one payout of its approved amount",
                claim.id
            );
            assert!(claim.processed_at.is_some(), "Paid claim {} has no processed_at", claim.id);
        } else {
            assert!(
                payouts.is_empty(),
                "Claim {} in status {} has payouts {:?}",
                claim.id,
                claim.status,
                payouts
            );
        }

        if let Some(treatment_id) = claim.treatment_id {
            assert!(
                seen_treatments.insert(treatment_id),
                "Treatment {} is attached to more than one claim",
                treatment_id
            );
        }
    }
}
