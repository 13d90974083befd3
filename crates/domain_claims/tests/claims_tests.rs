//! Lifecycle tests for the claims engine over in-memory adapters

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::TreatmentId;
use domain_claims::ports::mock::RecordingNotifier;
use domain_claims::{
    BusinessRuleViolation, ClaimStatus, ErrorKind, PaymentType, ReviewDecision, ReviewOutcome,
    AUTO_SETTLEMENT_METHOD,
};
use test_utils::{
    assert_error_kind, assert_ledger_consistent, assert_violation, ClaimsScenario,
    TreatmentInputBuilder, Users,
};

fn approve(amount: Decimal) -> ReviewDecision {
    ReviewDecision::Approve { amount }
}

// ============================================================================
// End-to-end scenario
// ============================================================================

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_lifecycle_from_initiation_to_payout() {
        let s = ClaimsScenario::seeded().await;
        let customer = Users::customer();

        // 1. Initiate on a paid, active policy
        let claim = s
            .engine
            .initiate_claim(&customer, s.gold_policy, s.hospital.id, "Fell from a ladder".into())
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Initiated);
        assert_eq!(claim.claim_amount, None);
        assert!(claim.claim_number.starts_with("CLM-"));

        // 2. Hospital records the treatment
        let updated = s
            .engine
            .hospital_update(
                &Users::hospital_manager(),
                claim.id,
                TreatmentInputBuilder::new()
                    .with_diagnosis("Fracture")
                    .with_cost(dec!(5000))
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ClaimStatus::AwaitingPolicy);
        assert_eq!(updated.claim_amount, Some(dec!(5000)));
        let treatment_id = updated.treatment_id.unwrap();
        let treatment = s.treatment(treatment_id).await.unwrap();
        assert_eq!(treatment.policy_id, None);
        assert_eq!(treatment.diagnosis, "Fracture");

        // 3. Finalize against a policy covering only 4000
        let result = s.engine.finalize_claim(&customer, claim.id, s.basic_policy).await;
        assert_violation(&result, |v| {
            matches!(v, BusinessRuleViolation::ExceedsCoverage { amount, limit }
                if *amount == dec!(5000) && *limit == dec!(4000))
        });
        assert_eq!(s.ledger.claim(claim.id).await.unwrap().status, ClaimStatus::AwaitingPolicy);

        // 4. Finalize against a policy covering 10000
        let submitted = s
            .engine
            .finalize_claim(&customer, claim.id, s.gold_policy)
            .await
            .unwrap();
        assert_eq!(submitted.status, ClaimStatus::Submitted);
        assert_eq!(submitted.policy_id, Some(s.gold_policy));
        assert_eq!(s.treatment(treatment_id).await.unwrap().policy_id, Some(s.gold_policy));

        // 5. Approve for the full amount
        let outcome = s
            .engine
            .review_claim(&Users::officer(), claim.id, approve(dec!(5000)))
            .await
            .unwrap();
        let ReviewOutcome::Paid { claim: paid, payment } = outcome else {
            panic!("approval must settle the claim");
        };
        assert_eq!(paid.status, ClaimStatus::Paid);
        assert!(paid.processed_at.is_some());
        assert_eq!(paid.approved_amount, dec!(5000));
        assert_eq!(payment.payment_type, PaymentType::Payout);
        assert_eq!(payment.amount, dec!(5000));
        assert_eq!(payment.payment_method, AUTO_SETTLEMENT_METHOD);
        assert_eq!(s.ledger.payouts_for(claim.id).await.len(), 1);

        // 6. A second review is refused
        let again = s
            .engine
            .review_claim(&Users::officer(), claim.id, approve(dec!(5000)))
            .await;
        assert_error_kind(&again, ErrorKind::InvalidState);
        assert_eq!(s.ledger.payouts_for(claim.id).await.len(), 1);
        assert_eq!(s.ledger.claim(claim.id).await.unwrap(), paid);

        assert_ledger_consistent(&s.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_lifecycle_notifications() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.submitted_claim(dec!(2500)).await;

        let manager = s.notifier.messages_for(Users::HOSPITAL_MANAGER).await;
        assert!(manager.iter().any(|m| m.contains(&claim.claim_number)));

        let officer = s.notifier.messages_for(Users::OFFICER).await;
        assert_eq!(officer.len(), 1);
        assert!(officer[0].contains("requires review"));
        assert!(s.notifier.messages_for(Users::SECOND_OFFICER).await.is_empty());

        s.engine
            .review_claim(&Users::officer(), claim.id, approve(dec!(2500)))
            .await
            .unwrap();
        let customer = s.notifier.messages_for(Users::CUSTOMER).await;
        assert!(customer.iter().any(|m| m == "Claim approved and payout of 2500 initiated."));
        let agent = s.notifier.messages_for(Users::AGENT).await;
        assert!(agent.iter().any(|m| m.contains("Payout of 2500")));
    }

    #[tokio::test]
    async fn test_notification_failures_never_fail_a_transition() {
        let s = ClaimsScenario::with_notifier(RecordingNotifier::failing()).await;
        let claim = s.paid_claim(dec!(1000)).await;
        assert_eq!(claim.status, ClaimStatus::Paid);
        assert!(s.notifier.sent().await.is_empty());
    }
}

// ============================================================================
// Initiation and hospital updates
// ============================================================================

mod initiation_tests {
    use super::*;

    #[tokio::test]
    async fn test_initiate_requires_paid_premium() {
        let s = ClaimsScenario::seeded().await;
        let result = s
            .engine
            .initiate_claim(&Users::customer(), s.unpaid_policy, s.hospital.id, "Checkup".into())
            .await;
        assert_violation(&result, |v| matches!(v, BusinessRuleViolation::PremiumNotPaid { .. }));
        assert!(s.ledger.snapshot().await.claims.is_empty());
    }

    #[tokio::test]
    async fn test_initiate_rejects_foreign_policy_and_wrong_role() {
        let s = ClaimsScenario::seeded().await;
        let foreign = s
            .engine
            .initiate_claim(&Users::customer(), s.other_policy, s.hospital.id, "Checkup".into())
            .await;
        assert_error_kind(&foreign, ErrorKind::Unauthorized);

        let officer = s
            .engine
            .initiate_claim(&Users::officer(), s.gold_policy, s.hospital.id, "Checkup".into())
            .await;
        assert_error_kind(&officer, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_initiate_unknown_references() {
        let s = ClaimsScenario::seeded().await;
        let hospital = s
            .engine
            .initiate_claim(&Users::customer(), s.gold_policy, core_kernel::HospitalId::new(999), "x".into())
            .await;
        assert_error_kind(&hospital, ErrorKind::NotFound);

        let policy = s
            .engine
            .initiate_claim(&Users::customer(), core_kernel::PolicyId::new(999), s.hospital.id, "x".into())
            .await;
        assert_error_kind(&policy, ErrorKind::NotFound);

        let blank = s
            .engine
            .initiate_claim(&Users::customer(), s.gold_policy, s.hospital.id, "   ".into())
            .await;
        assert_violation(&blank, |v| *v == BusinessRuleViolation::DescriptionRequired);
    }

    #[tokio::test]
    async fn test_hospital_update_only_by_claim_hospital() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.initiated_claim().await;

        let result = s
            .engine
            .hospital_update(&Users::other_manager(), claim.id, s.treatment_input(dec!(100)))
            .await;
        assert_error_kind(&result, ErrorKind::Unauthorized);
        assert_eq!(s.ledger.claim(claim.id).await.unwrap().status, ClaimStatus::Initiated);
        assert!(s.ledger.snapshot().await.treatments.is_empty());
    }

    #[tokio::test]
    async fn test_hospital_update_requires_initiated() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.awaiting_policy_claim(dec!(500)).await;
        let result = s
            .engine
            .hospital_update(&Users::hospital_manager(), claim.id, s.treatment_input(dec!(700)))
            .await;
        assert_error_kind(&result, ErrorKind::InvalidState);
        assert_eq!(s.ledger.claim(claim.id).await.unwrap().claim_amount, Some(dec!(500)));
        assert_eq!(s.ledger.snapshot().await.treatments.len(), 1);
    }

    #[tokio::test]
    async fn test_hospital_update_validates_input() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.initiated_claim().await;
        let result = s
            .engine
            .hospital_update(&Users::hospital_manager(), claim.id, s.treatment_input(dec!(0)))
            .await;
        assert_violation(&result, |v| matches!(v, BusinessRuleViolation::InvalidTreatment(_)));
    }

    #[tokio::test]
    async fn test_finalize_rejects_unpaid_and_foreign_policies() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.awaiting_policy_claim(dec!(500)).await;

        let unpaid = s.engine.finalize_claim(&Users::customer(), claim.id, s.unpaid_policy).await;
        assert_violation(&unpaid, |v| matches!(v, BusinessRuleViolation::PremiumNotPaid { .. }));

        let suspended = s
            .engine
            .finalize_claim(&Users::customer(), claim.id, s.suspended_policy)
            .await;
        assert_violation(&suspended, |v| matches!(v, BusinessRuleViolation::PolicyNotActive { .. }));

        let foreign = s.engine.finalize_claim(&Users::customer(), claim.id, s.other_policy).await;
        assert_error_kind(&foreign, ErrorKind::Unauthorized);

        let not_owner = s
            .engine
            .finalize_claim(&Users::other_customer(), claim.id, s.other_policy)
            .await;
        assert_error_kind(&not_owner, ErrorKind::Unauthorized);

        let stored = s.ledger.claim(claim.id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::AwaitingPolicy);
        assert_eq!(stored.policy_id, Some(s.gold_policy));
    }

    #[tokio::test]
    async fn test_finalize_requires_awaiting_policy() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.initiated_claim().await;
        let result = s.engine.finalize_claim(&Users::customer(), claim.id, s.gold_policy).await;
        assert_error_kind(&result, ErrorKind::InvalidState);
    }
}

// ============================================================================
// Direct submission
// ============================================================================

mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_submission_binds_treatment() {
        let s = ClaimsScenario::seeded().await;
        let treatment = s.recorded_treatment(500, None).await;

        let claim = s
            .engine
            .submit_claim(&Users::customer(), s.gold_policy, treatment.id, dec!(4500))
            .await
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Submitted);
        assert_eq!(claim.claim_amount, Some(dec!(4500)));
        assert_eq!(claim.treatment_id, Some(treatment.id));
        assert_eq!(claim.hospital_id, Some(s.hospital.id));
        assert_eq!(claim.treatment_date, Some(treatment.treatment_date));
        assert_eq!(s.treatment(treatment.id).await.unwrap().policy_id, Some(s.gold_policy));
    }

    #[tokio::test]
    async fn test_second_claim_on_treatment_is_rejected() {
        let s = ClaimsScenario::seeded().await;
        let treatment = s.recorded_treatment(500, Some(s.gold_policy)).await;
        let first = s
            .engine
            .submit_claim(&Users::customer(), s.gold_policy, treatment.id, dec!(1000))
            .await
            .unwrap();

        let second = s
            .engine
            .submit_claim(&Users::customer(), s.gold_policy, treatment.id, dec!(900))
            .await;
        assert_violation(&second, |v| {
            *v == BusinessRuleViolation::DuplicateTreatmentClaim { treatment_id: TreatmentId::new(500) }
        });
        assert_eq!(s.ledger.claim(first.id).await.unwrap(), first);
        assert_eq!(s.ledger.snapshot().await.claims.len(), 1);
    }

    #[tokio::test]
    async fn test_treatment_from_hospital_update_cannot_be_claimed_again() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.awaiting_policy_claim(dec!(800)).await;
        let treatment_id = claim.treatment_id.unwrap();

        let result = s
            .engine
            .submit_claim(&Users::customer(), s.gold_policy, treatment_id, dec!(800))
            .await;
        assert_violation(&result, |v| matches!(v, BusinessRuleViolation::DuplicateTreatmentClaim { .. }));
    }

    #[tokio::test]
    async fn test_submission_guards() {
        let s = ClaimsScenario::seeded().await;
        let treatment = s.recorded_treatment(500, Some(s.basic_policy)).await;

        let mismatch = s
            .engine
            .submit_claim(&Users::customer(), s.gold_policy, treatment.id, dec!(100))
            .await;
        assert_violation(&mismatch, |v| matches!(v, BusinessRuleViolation::TreatmentPolicyMismatch { .. }));

        let over = s
            .engine
            .submit_claim(&Users::customer(), s.basic_policy, treatment.id, dec!(4000.01))
            .await;
        assert_violation(&over, |v| matches!(v, BusinessRuleViolation::ExceedsCoverage { .. }));

        let zero = s
            .engine
            .submit_claim(&Users::customer(), s.basic_policy, treatment.id, dec!(0))
            .await;
        assert_violation(&zero, |v| *v == BusinessRuleViolation::ClaimAmountNotPositive);

        let unpaid = s
            .engine
            .submit_claim(&Users::customer(), s.unpaid_policy, treatment.id, dec!(100))
            .await;
        assert_violation(&unpaid, |v| matches!(v, BusinessRuleViolation::PremiumNotPaid { .. }));

        let missing = s
            .engine
            .submit_claim(&Users::customer(), s.basic_policy, TreatmentId::new(9999), dec!(100))
            .await;
        assert_error_kind(&missing, ErrorKind::NotFound);

        assert!(s.ledger.snapshot().await.claims.is_empty());
    }

    #[tokio::test]
    async fn test_cannot_claim_another_customers_treatment() {
        let s = ClaimsScenario::seeded().await;
        let treatment = test_utils::TreatmentBuilder::new(600, s.hospital.id)
            .with_customer(Users::OTHER_CUSTOMER)
            .build();
        s.ledger.add_treatment(treatment.clone()).await;

        let result = s
            .engine
            .submit_claim(&Users::customer(), s.gold_policy, treatment.id, dec!(100))
            .await;
        assert_error_kind(&result, ErrorKind::Unauthorized);
        assert_eq!(s.treatment(treatment.id).await.unwrap().policy_id, None);
    }
}

// ============================================================================
// Review and settlement
// ============================================================================

mod review_tests {
    use super::*;

    #[tokio::test]
    async fn test_begin_review_then_approve() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.submitted_claim(dec!(3000)).await;

        let in_review = s.engine.begin_review(&Users::officer(), claim.id).await.unwrap();
        assert_eq!(in_review.status, ClaimStatus::InReview);
        assert_eq!(in_review.reviewed_by, Some(Users::OFFICER));

        let twice = s.engine.begin_review(&Users::officer(), claim.id).await;
        assert_error_kind(&twice, ErrorKind::InvalidState);

        let outcome = s
            .engine
            .review_claim(&Users::officer(), claim.id, approve(dec!(2000)))
            .await
            .unwrap();
        assert_eq!(outcome.claim().status, ClaimStatus::Paid);
        assert_eq!(outcome.claim().approved_amount, dec!(2000));
        assert_ledger_consistent(&s.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_reject_then_reconsider() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.submitted_claim(dec!(3000)).await;

        let rejected = s
            .engine
            .review_claim(
                &Users::officer(),
                claim.id,
                ReviewDecision::from_form(false, None, Some("Missing invoice".into())),
            )
            .await
            .unwrap();
        let ReviewOutcome::Rejected(rejected) = rejected else {
            panic!("expected rejection");
        };
        assert_eq!(rejected.status, ClaimStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing invoice"));
        assert_eq!(rejected.approved_amount, Decimal::ZERO);
        assert!(s.ledger.payouts_for(claim.id).await.is_empty());
        assert!(s
            .notifier
            .messages_for(Users::CUSTOMER)
            .await
            .iter()
            .any(|m| m == "Your claim has been rejected. Reason: Missing invoice"));

        let approved = s
            .engine
            .review_claim(
                &Users::officer(),
                claim.id,
                ReviewDecision::from_form(true, Some(dec!(3000)), None),
            )
            .await
            .unwrap();
        assert_eq!(approved.claim().status, ClaimStatus::Paid);
        assert_eq!(approved.claim().rejection_reason, None);
        assert_ledger_consistent(&s.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_review_input_guards() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.submitted_claim(dec!(3000)).await;

        let blank = s
            .engine
            .review_claim(&Users::officer(), claim.id, ReviewDecision::Reject { reason: " ".into() })
            .await;
        assert_violation(&blank, |v| *v == BusinessRuleViolation::RejectionReasonRequired);

        let zero = s.engine.review_claim(&Users::officer(), claim.id, approve(dec!(0))).await;
        assert_violation(&zero, |v| *v == BusinessRuleViolation::ApprovedAmountNotPositive);

        let over = s.engine.review_claim(&Users::officer(), claim.id, approve(dec!(3000.01))).await;
        assert_violation(&over, |v| matches!(v, BusinessRuleViolation::ApprovedAmountExceedsClaim { .. }));

        let customer = s.engine.review_claim(&Users::customer(), claim.id, approve(dec!(10))).await;
        assert_error_kind(&customer, ErrorKind::Unauthorized);

        let stored = s.ledger.claim(claim.id).await.unwrap();
        assert_eq!(stored, claim);
    }

    #[tokio::test]
    async fn test_review_refuses_claims_not_yet_submitted() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.awaiting_policy_claim(dec!(300)).await;
        let result = s.engine.review_claim(&Users::officer(), claim.id, approve(dec!(300))).await;
        assert_error_kind(&result, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_failed_payout_leaves_claim_untouched() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.submitted_claim(dec!(1500)).await;

        s.ledger.fail_payment_inserts(true);
        let result = s.engine.review_claim(&Users::officer(), claim.id, approve(dec!(1500))).await;
        assert_error_kind(&result, ErrorKind::Store);

        let stored = s.ledger.claim(claim.id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::Submitted);
        assert_eq!(stored.approved_amount, Decimal::ZERO);
        assert_eq!(stored.processed_at, None);
        assert!(s.ledger.payouts_for(claim.id).await.is_empty());

        s.ledger.fail_payment_inserts(false);
        let retried = s
            .engine
            .review_claim(&Users::officer(), claim.id, approve(dec!(1500)))
            .await
            .unwrap();
        assert_eq!(retried.claim().status, ClaimStatus::Paid);
        assert_ledger_consistent(&s.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_concurrent_reviews_pay_once() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.submitted_claim(dec!(2000)).await;

        let first_officer = Users::officer();
        let second_officer = Users::second_officer();
        let (a, b) = tokio::join!(
            s.engine.review_claim(&first_officer, claim.id, approve(dec!(2000))),
            s.engine.review_claim(&second_officer, claim.id, approve(dec!(2000))),
        );
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        let loser = if a.is_ok() { b } else { a };
        assert_error_kind(&loser, ErrorKind::InvalidState);
        assert_eq!(s.ledger.payouts_for(claim.id).await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_reviews_across_tasks_pay_once() {
        let s = ClaimsScenario::seeded().await;
        let claim_id = s.submitted_claim(dec!(900)).await.id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = s.engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .review_claim(&Users::officer(), claim_id, approve(dec!(900)))
                    .await
                    .is_ok()
            }));
        }
        let mut paid = 0;
        for handle in handles {
            if handle.await.unwrap() {
                paid += 1;
            }
        }
        assert_eq!(paid, 1);
        assert_eq!(s.ledger.payouts_for(claim_id).await.len(), 1);
        assert_ledger_consistent(&s.ledger.snapshot().await);
    }
}

// ============================================================================
// Deletion and edits
// ============================================================================

mod maintenance_tests {
    use super::*;

    #[tokio::test]
    async fn test_customer_deletes_only_initiated_claims() {
        let s = ClaimsScenario::seeded().await;
        let fresh = s.initiated_claim().await;
        assert_eq!(s.engine.delete_claim(&Users::customer(), fresh.id).await.unwrap(), 0);
        assert!(s.ledger.claim(fresh.id).await.is_none());

        let progressed = s.awaiting_policy_claim(dec!(400)).await;
        let result = s.engine.delete_claim(&Users::customer(), progressed.id).await;
        assert_error_kind(&result, ErrorKind::InvalidState);
        assert!(s.ledger.claim(progressed.id).await.is_some());
    }

    #[tokio::test]
    async fn test_delete_ownership_and_privilege() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.initiated_claim().await;
        let stranger = s.engine.delete_claim(&Users::other_customer(), claim.id).await;
        assert_error_kind(&stranger, ErrorKind::Unauthorized);

        let paid = s.paid_claim(dec!(700)).await;
        let removed = s.engine.delete_claim(&Users::admin(), paid.id).await.unwrap();
        assert_eq!(removed, 1);
        assert!(s.ledger.claim(paid.id).await.is_none());
        assert!(s.ledger.payouts_for(paid.id).await.is_empty());

        let submitted = s.submitted_claim(dec!(300)).await;
        assert_eq!(s.engine.delete_claim(&Users::officer(), submitted.id).await.unwrap(), 0);
        assert_ledger_consistent(&s.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_update_description() {
        let s = ClaimsScenario::seeded().await;
        let claim = s.initiated_claim().await;

        let updated = s
            .engine
            .update_description(&Users::customer(), claim.id, "  Slipped on ice  ".into())
            .await
            .unwrap();
        assert_eq!(updated.treatment_description.as_deref(), Some("Slipped on ice"));

        let blank = s.engine.update_description(&Users::customer(), claim.id, "".into()).await;
        assert_violation(&blank, |v| *v == BusinessRuleViolation::DescriptionRequired);

        let stranger = s
            .engine
            .update_description(&Users::other_customer(), claim.id, "Mine now".into())
            .await;
        assert_error_kind(&stranger, ErrorKind::Unauthorized);

        let progressed = s.awaiting_policy_claim(dec!(100)).await;
        let late = s
            .engine
            .update_description(&Users::customer(), progressed.id, "Too late".into())
            .await;
        assert_error_kind(&late, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_missing_claim() {
        let s = ClaimsScenario::seeded().await;
        let result = s
            .engine
            .delete_claim(&Users::admin(), core_kernel::ClaimId::new(12345))
            .await;
        assert_error_kind(&result, ErrorKind::NotFound);
    }
}

// ============================================================================
// Property tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use test_utils::treatment_input_strategy;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn finalize_over_coverage_keeps_awaiting_policy(cents in 400_001i64..100_000_000i64) {
            let cost = Decimal::new(cents, 2);
            let (status, violation) = block_on(async {
                let s = ClaimsScenario::seeded().await;
                let claim = s.awaiting_policy_claim(cost).await;
                let result = s.engine.finalize_claim(&Users::customer(), claim.id, s.basic_policy).await;
                let violation = result.err().and_then(|e| e.violation().cloned());
                (s.ledger.claim(claim.id).await.unwrap().status, violation)
            });
            prop_assert_eq!(status, ClaimStatus::AwaitingPolicy);
            let is_coverage = matches!(violation, Some(BusinessRuleViolation::ExceedsCoverage { .. }));
            prop_assert!(is_coverage);
        }

        #[test]
        fn hospital_update_copies_treatment(input in treatment_input_strategy()) {
            let expected = input.clone();
            let claim = block_on(async {
                let s = ClaimsScenario::seeded().await;
                let claim = s.initiated_claim().await;
                s.engine
                    .hospital_update(&Users::hospital_manager(), claim.id, input)
                    .await
                    .unwrap()
            });
            prop_assert_eq!(claim.status, ClaimStatus::AwaitingPolicy);
            prop_assert_eq!(claim.claim_amount, Some(expected.cost));
            prop_assert_eq!(claim.treatment_date, Some(expected.treatment_date));
        }

        #[test]
        fn approved_amount_never_exceeds_claim(cost_cents in 1i64..=1_000_000i64, approved_cents in 1i64..=1_100_000i64) {
            let cost = Decimal::new(cost_cents, 2);
            let approved = Decimal::new(approved_cents, 2);
            let (result_ok, payouts) = block_on(async {
                let s = ClaimsScenario::seeded().await;
                let claim = s.submitted_claim(cost).await;
                let result = s.engine.review_claim(&Users::officer(), claim.id, approve(approved)).await;
                assert_ledger_consistent(&s.ledger.snapshot().await);
                (result.is_ok(), s.ledger.payouts_for(claim.id).await)
            });
            prop_assert_eq!(result_ok, approved <= cost);
            prop_assert_eq!(payouts.len(), usize::from(approved <= cost));
        }
    }
}
