//! Premium payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ClaimId, PaymentId, PolicyId};
use domain_claims::{Payment, PaymentStatus, PaymentType};

use super::{not_blank, positive_amount};

#[derive(Debug, Deserialize, Validate)]
pub struct PayPremiumRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    #[validate(length(max = 50), custom(function = "not_blank"))]
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub reference: String,
    pub policy_id: PolicyId,
    pub claim_id: Option<ClaimId>,
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            reference: payment.reference,
            policy_id: payment.policy_id,
            claim_id: payment.claim_id,
            amount: payment.amount,
            payment_type: payment.payment_type,
            status: payment.status,
            payment_method: payment.payment_method,
            payment_date: payment.payment_date,
        }
    }
}
