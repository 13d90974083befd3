//! Settlement Processor
//!
//! Turns an approved claim into a payout. The payout insert and the claim's move
//! to `Paid` happen in the caller's transaction, so either both commit or neither does.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::claim::{Claim, ClaimStatus};
use crate::error::{BusinessRuleViolation, ClaimError};
use crate::payment::{NewPayment, Payment};
use crate::ports::LedgerTransaction;

/// Settles approved claims inside an open ledger transaction
#[derive(Debug, Default, Clone, Copy)]
pub struct SettlementProcessor;

impl SettlementProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Records the payout and moves `claim` from Approved to Paid.
    ///
    /// `stored_status` is the status the claim had when it was loaded in this
    /// transaction; the claim write is conditional on it. On any error the caller
    /// must drop the transaction.
    pub async fn settle(
        &self,
        tx: &mut dyn LedgerTransaction,
        claim: &mut Claim,
        stored_status: ClaimStatus,
    ) -> Result<Payment, ClaimError> {
        claim.require_status(ClaimStatus::Approved, "settle")?;
        let policy_id = claim
            .policy_id
            .ok_or(BusinessRuleViolation::PolicyNotBound(claim.id))?;
        if claim.approved_amount <= Decimal::ZERO {
            return Err(BusinessRuleViolation::ApprovedAmountNotPositive.into());
        }

        let payment = tx
            .insert_payment(NewPayment::payout(policy_id, claim.id, claim.approved_amount))
            .await?;

        claim.transition(ClaimStatus::Paid, "settle")?;
        claim.processed_at = Some(Utc::now());

        if !tx.update_claim(claim, stored_status).await? {
            warn!(claim_id = %claim.id, expected = %stored_status, "Lost settlement race");
            return Err(ClaimError::StaleState(claim.id));
        }

        info!(
            claim_id = %claim.id,
            payment_reference = %payment.reference,
            amount = %payment.amount,
            "Payout recorded"
        );
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::NewClaim;
    use crate::ports::mock::InMemoryLedger;
    use crate::ports::LedgerStore;
    use core_kernel::{ClaimId, PolicyId, UserId};
    use rust_decimal_macros::dec;

    async fn seeded(status: ClaimStatus) -> (InMemoryLedger, ClaimId) {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let claim = tx
            .insert_claim(NewClaim {
                claim_number: "CLM-5E771E00".into(),
                treatment_description: None,
                policy_id: Some(PolicyId::new(100)),
                customer_id: UserId::new(1),
                hospital_id: None,
                treatment_id: None,
                claim_amount: Some(dec!(5000)),
                treatment_date: None,
                treatment_details: None,
                status,
                submitted_at: Utc::now(),
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (ledger, claim.id)
    }

    fn approve(claim: &mut Claim, amount: Decimal) {
        claim.transition(ClaimStatus::Approved, "review").unwrap();
        claim.approved_amount = amount;
    }

    #[tokio::test]
    async fn test_settle_writes_payment_and_paid_status() {
        let (ledger, id) = seeded(ClaimStatus::Submitted).await;
        let mut tx = ledger.begin().await.unwrap();
        let mut claim = tx.claim_for_update(id).await.unwrap().unwrap();
        approve(&mut claim, dec!(5000));

        let payment = SettlementProcessor::new()
            .settle(tx.as_mut(), &mut claim, ClaimStatus::Submitted)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(payment.amount, dec!(5000));
        let stored = ledger.claim(id).await.unwrap();
        assert_eq!(stored.status, ClaimStatus::Paid);
        assert!(stored.processed_at.is_some());
        assert_eq!(ledger.payouts_for(id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_payment_failure_leaves_claim_untouched() {
        let (ledger, id) = seeded(ClaimStatus::Submitted).await;
        ledger.fail_payment_inserts(true);
        let mut tx = ledger.begin().await.unwrap();
        let mut claim = tx.claim_for_update(id).await.unwrap().unwrap();
        approve(&mut claim, dec!(5000));

        let err = SettlementProcessor::new()
            .settle(tx.as_mut(), &mut claim, ClaimStatus::Submitted)
            .await
            .unwrap_err();
        drop(tx);

        assert!(matches!(err, ClaimError::Store(_)));
        assert_eq!(ledger.claim(id).await.unwrap().status, ClaimStatus::Submitted);
        assert!(ledger.payouts_for(id).await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_status_rolls_back_payment() {
        let (ledger, id) = seeded(ClaimStatus::Submitted).await;
        let mut tx = ledger.begin().await.unwrap();
        let mut claim = tx.claim_for_update(id).await.unwrap().unwrap();
        approve(&mut claim, dec!(5000));

        let err = SettlementProcessor::new()
            .settle(tx.as_mut(), &mut claim, ClaimStatus::InReview)
            .await
            .unwrap_err();
        drop(tx);

        assert!(matches!(err, ClaimError::StaleState(_)));
        assert!(ledger.payouts_for(id).await.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unapproved_claim() {
        let (ledger, id) = seeded(ClaimStatus::Submitted).await;
        let mut tx = ledger.begin().await.unwrap();
        let mut claim = tx.claim_for_update(id).await.unwrap().unwrap();
        let err = SettlementProcessor::new()
            .settle(tx.as_mut(), &mut claim, ClaimStatus::Submitted)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::InvalidState { .. }));
    }
}
