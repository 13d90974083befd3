//! Coverage Policy Validator
//!
//! Pure checks run before a claim is created or bound to a policy. Premium
//! gating is the central rule: an unpaid policy never produces a payable claim.

use rust_decimal::Decimal;

use crate::error::BusinessRuleViolation;
use crate::policy::{Plan, Policy, PolicyWithPlan};

/// Premium must be flagged paid and backed by a completed premium payment
pub fn ensure_premium_paid(policy: &Policy, premium_recorded: bool) -> Result<(), BusinessRuleViolation> {
    if policy.premium_paid && premium_recorded {
        Ok(())
    } else {
        Err(BusinessRuleViolation::PremiumNotPaid {
            policy_number: policy.policy_number.clone(),
        })
    }
}

pub fn ensure_active(policy: &Policy) -> Result<(), BusinessRuleViolation> {
    if policy.is_active() {
        Ok(())
    } else {
        Err(BusinessRuleViolation::PolicyNotActive {
            policy_number: policy.policy_number.clone(),
            status: policy.status,
        })
    }
}

/// `amount <= plan.coverage_limit`
pub fn ensure_within_coverage(amount: Decimal, plan: &Plan) -> Result<(), BusinessRuleViolation> {
    if amount <= plan.coverage_limit {
        Ok(())
    } else {
        Err(BusinessRuleViolation::ExceedsCoverage {
            amount,
            limit: plan.coverage_limit,
        })
    }
}

/// Full gate for binding `amount` to a policy: premium, status, then coverage
pub fn validate_claim_against(
    target: &PolicyWithPlan,
    premium_recorded: bool,
    amount: Decimal,
) -> Result<(), BusinessRuleViolation> {
    ensure_premium_paid(&target.policy, premium_recorded)?;
    ensure_active(&target.policy)?;
    ensure_within_coverage(amount, &target.plan)
}
