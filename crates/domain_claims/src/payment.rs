//! Payments ledger entries
//!
//! Payments are immutable: inserted once, never updated.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, PaymentId, PolicyId, ReferenceKind, ReferenceNumber};

/// Method recorded on payouts created by the settlement processor
pub const AUTO_SETTLEMENT_METHOD: &str = "Bank Transfer (Auto)";

/// Payment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Paid by the customer to activate or renew a policy
    Premium,
    /// Paid to the customer on claim approval
    Payout,
}

/// Payment status. Only completed payments are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// `PAY-XXXXXXXX`
    pub reference: String,
    pub policy_id: PolicyId,
    /// Set only on payouts
    pub claim_id: Option<ClaimId>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn is_payout_for(&self, claim_id: ClaimId) -> bool {
        self.payment_type == PaymentType::Payout && self.claim_id == Some(claim_id)
    }

    pub fn is_completed_premium_for(&self, policy_id: PolicyId) -> bool {
        self.payment_type == PaymentType::Premium
            && self.status == PaymentStatus::Completed
            && self.policy_id == policy_id
    }
}

/// A payment not yet persisted
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub reference: String,
    pub policy_id: PolicyId,
    pub claim_id: Option<ClaimId>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
}

impl NewPayment {
    /// Completed premium payment against a policy
    pub fn premium(policy_id: PolicyId, amount: Decimal, method: impl Into<String>) -> Self {
        Self {
            reference: ReferenceNumber::generate(ReferenceKind::Payment).into_string(),
            policy_id,
            claim_id: None,
            amount,
            payment_type: PaymentType::Premium,
            status: PaymentStatus::Completed,
            payment_date: Utc::now(),
            payment_method: method.into(),
        }
    }

    /// Completed automatic payout for an approved claim
    pub fn payout(policy_id: PolicyId, claim_id: ClaimId, amount: Decimal) -> Self {
        Self {
            reference: ReferenceNumber::generate(ReferenceKind::Payment).into_string(),
            policy_id,
            claim_id: Some(claim_id),
            amount,
            payment_type: PaymentType::Payout,
            status: PaymentStatus::Completed,
            payment_date: Utc::now(),
            payment_method: AUTO_SETTLEMENT_METHOD.to_string(),
        }
    }

    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            reference: self.reference,
            policy_id: self.policy_id,
            claim_id: self.claim_id,
            amount: self.amount,
            payment_type: self.payment_type,
            status: self.status,
            payment_date: self.payment_date,
            payment_method: self.payment_method,
            created_at: Utc::now(),
        }
    }
}
