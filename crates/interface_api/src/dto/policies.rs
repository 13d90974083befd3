//! Policy DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{PlanId, PolicyId, UserId};
use domain_claims::{Enrollment, Policy, PolicyStatus};

#[derive(Debug, Deserialize)]
pub struct EnrollPolicyRequest {
    pub customer_id: UserId,
    pub plan_id: PlanId,
    pub start_date: NaiveDate,
}

impl From<EnrollPolicyRequest> for Enrollment {
    fn from(request: EnrollPolicyRequest) -> Self {
        Enrollment {
            customer_id: request.customer_id,
            plan_id: request.plan_id,
            start_date: request.start_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub id: PolicyId,
    pub policy_number: String,
    pub customer_id: UserId,
    pub agent_id: Option<UserId>,
    pub plan_id: PlanId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PolicyStatus,
    pub premium_paid: bool,
    pub premium_amount: Decimal,
}

impl From<Policy> for PolicyResponse {
    fn from(policy: Policy) -> Self {
        Self {
            id: policy.id,
            policy_number: policy.policy_number,
            customer_id: policy.customer_id,
            agent_id: policy.agent_id,
            plan_id: policy.plan_id,
            start_date: policy.start_date,
            end_date: policy.end_date,
            status: policy.status,
            premium_paid: policy.premium_paid,
            premium_amount: policy.premium_amount,
        }
    }
}
