//! Plans and policies
//!
//! A policy is enrolled by an insurance agent, becomes claimable once its
//! premium is paid, and goes back to unpaid on every renewal.

use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument};

use core_kernel::{Identity, PlanId, PolicyId, ReferenceKind, ReferenceNumber, Role, UserId};

use crate::engine::{load_policy, require_role, ClaimsEngine};
use crate::error::{BusinessRuleViolation, ClaimError};
use crate::notifier::Outbound;

/// Premium multiplier applied on renewal (+8%)
pub const RENEWAL_LOADING: Decimal = Decimal::from_parts(108, 0, 0, false, 2);

/// A product template defining premium, coverage limit, and duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub premium_amount: Decimal,
    pub coverage_limit: Decimal,
    pub duration_in_months: u32,
    pub is_active: bool,
}

/// Policy status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyStatus {
    Active,
    Suspended,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Active => "Active",
            PolicyStatus::Suspended => "Suspended",
            PolicyStatus::Expired => "Expired",
            PolicyStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's enrollment in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    /// `POL-XXXXXXXX`, unique
    pub policy_number: String,
    pub customer_id: UserId,
    /// Agent who enrolled the customer
    pub agent_id: Option<UserId>,
    pub plan_id: PlanId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PolicyStatus,
    pub premium_paid: bool,
    /// Plan premium cached at enrollment or renewal
    pub premium_amount: Decimal,
}

impl Policy {
    /// End date of a term starting on `start` for a plan of `months`
    pub fn term_end(start: NaiveDate, months: u32) -> Option<NaiveDate> {
        start.checked_add_months(Months::new(months))
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.customer_id == user
    }

    /// Active and Suspended swap; Expired and Cancelled are final
    pub fn toggled_status(&self) -> Result<PolicyStatus, BusinessRuleViolation> {
        match self.status {
            PolicyStatus::Active => Ok(PolicyStatus::Suspended),
            PolicyStatus::Suspended => Ok(PolicyStatus::Active),
            status @ (PolicyStatus::Expired | PolicyStatus::Cancelled) => {
                Err(BusinessRuleViolation::PolicyStatusLocked {
                    policy_number: self.policy_number.clone(),
                    status,
                })
            }
        }
    }
}

/// A policy not yet persisted
#[derive(Debug, Clone)]
pub struct NewPolicy {
    pub policy_number: String,
    pub customer_id: UserId,
    pub agent_id: Option<UserId>,
    pub plan_id: PlanId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub premium_amount: Decimal,
}

impl NewPolicy {
    /// Fresh enrollment: Active, premium unpaid, premium cached from the plan
    pub fn enroll(
        customer_id: UserId,
        agent_id: UserId,
        plan: &Plan,
        start_date: NaiveDate,
    ) -> Result<Self, BusinessRuleViolation> {
        let end_date = Policy::term_end(start_date, plan.duration_in_months)
            .ok_or(BusinessRuleViolation::InvalidPolicyTerm { start: start_date })?;
        Ok(Self {
            policy_number: ReferenceNumber::generate(ReferenceKind::Policy).into_string(),
            customer_id,
            agent_id: Some(agent_id),
            plan_id: plan.id,
            start_date,
            end_date,
            premium_amount: plan.premium_amount,
        })
    }

    pub fn into_policy(self, id: PolicyId) -> Policy {
        Policy {
            id,
            policy_number: self.policy_number,
            customer_id: self.customer_id,
            agent_id: self.agent_id,
            plan_id: self.plan_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status: PolicyStatus::Active,
            premium_paid: false,
            premium_amount: self.premium_amount,
        }
    }
}

/// What an agent supplies to enroll a customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub customer_id: UserId,
    pub plan_id: PlanId,
    pub start_date: NaiveDate,
}

/// A policy loaded together with its plan
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyWithPlan {
    pub policy: Policy,
    pub plan: Plan,
}

impl PolicyWithPlan {
    /// Premium due: the policy's cached amount if set, else the plan's
    pub fn required_premium(&self) -> Decimal {
        if self.policy.premium_amount > Decimal::ZERO {
            self.policy.premium_amount
        } else {
            self.plan.premium_amount
        }
    }

    /// `EndDate = StartDate + plan.DurationInMonths`
    pub fn has_consistent_term(&self) -> bool {
        Policy::term_end(self.policy.start_date, self.plan.duration_in_months)
            == Some(self.policy.end_date)
    }

    /// Starts the next term and raises the premium.
    ///
    /// The new term begins where the current one ends, or `today` if it has
    /// already lapsed. The premium is re-armed: claims are refused until it is
    /// paid again.
    pub fn renew(&mut self, today: NaiveDate) -> Result<(), BusinessRuleViolation> {
        if self.policy.status == PolicyStatus::Cancelled {
            return Err(BusinessRuleViolation::PolicyStatusLocked {
                policy_number: self.policy.policy_number.clone(),
                status: self.policy.status,
            });
        }
        let start = self.policy.end_date.max(today);
        let end = Policy::term_end(start, self.plan.duration_in_months)
            .ok_or(BusinessRuleViolation::InvalidPolicyTerm { start })?;

        self.policy.premium_amount = (self.required_premium() * RENEWAL_LOADING).round_dp(2);
        self.policy.start_date = start;
        self.policy.end_date = end;
        self.policy.premium_paid = false;
        self.policy.status = PolicyStatus::Active;
        Ok(())
    }
}

/// Renewals and status changes belong to the enrolling agent or an admin
fn ensure_servicing_agent(identity: &Identity, policy: &Policy, action: &str) -> Result<(), ClaimError> {
    require_role(identity, &[Role::InsuranceAgent, Role::Admin], action)?;
    if identity.is(Role::InsuranceAgent) && policy.agent_id != Some(identity.user_id) {
        return Err(ClaimError::unauthorized("policy was enrolled by another agent"));
    }
    Ok(())
}

impl ClaimsEngine {
    /// Agent enrolls a registered customer in a plan.
    ///
    /// The policy starts Active with its premium unpaid, so it cannot carry a
    /// claim until [`ClaimsEngine::pay_premium`] succeeds.
    #[instrument(skip(self), fields(user_id = %identity.user_id, customer_id = %enrollment.customer_id))]
    pub async fn enroll_policy(&self, identity: &Identity, enrollment: Enrollment) -> Result<Policy, ClaimError> {
        require_role(identity, &[Role::InsuranceAgent], "enroll policies")?;
        match self.directory.role_of(enrollment.customer_id).await? {
            Some(Role::Customer) => {}
            Some(role) => {
                return Err(BusinessRuleViolation::NotACustomer {
                    user_id: enrollment.customer_id,
                    role,
                }
                .into())
            }
            None => return Err(ClaimError::not_found("Customer", enrollment.customer_id)),
        }

        let mut tx = self.store.begin().await?;
        let plan = tx
            .plan(enrollment.plan_id)
            .await?
            .ok_or_else(|| ClaimError::not_found("Plan", enrollment.plan_id))?;
        if !plan.is_active {
            return Err(BusinessRuleViolation::PlanInactive { plan_id: plan.id }.into());
        }
        if tx.active_policy_exists(enrollment.customer_id, plan.id).await? {
            debug!(plan_id = %plan.id, "Customer already enrolled in plan");
            return Err(BusinessRuleViolation::DuplicateActivePolicy { plan_id: plan.id }.into());
        }

        let new_policy = NewPolicy::enroll(enrollment.customer_id, identity.user_id, &plan, enrollment.start_date)?;
        let policy = tx.insert_policy(new_policy).await?;
        tx.commit().await?;
        info!(policy_id = %policy.id, policy_number = %policy.policy_number, "Policy enrolled");

        self.dispatch(vec![
            Outbound::new(
                policy.customer_id,
                format!(
                    "Policy {} has been successfully enrolled for you. Please pay the premium to activate it.",
                    policy.policy_number
                ),
            ),
            Outbound::new(
                identity.user_id,
                format!("You successfully enrolled Policy {}.", policy.policy_number),
            ),
        ])
        .await;
        Ok(policy)
    }

    /// Starts the next policy term at an 8% higher premium and re-arms premium gating
    #[instrument(skip(self), fields(user_id = %identity.user_id, policy_id = %policy_id))]
    pub async fn renew_policy(&self, identity: &Identity, policy_id: PolicyId) -> Result<Policy, ClaimError> {
        let mut tx = self.store.begin().await?;
        let mut target = load_policy(tx.as_mut(), policy_id).await?;
        ensure_servicing_agent(identity, &target.policy, "renew policies")?;
        target.renew(Utc::now().date_naive())?;
        tx.update_policy(&target.policy).await?;
        tx.commit().await?;

        let policy = target.policy;
        info!(
            policy_id = %policy.id,
            premium = %policy.premium_amount,
            end_date = %policy.end_date,
            "Policy renewed"
        );

        let mut outbox = vec![Outbound::new(
            policy.customer_id,
            format!(
                "Your Policy {} has been renewed. Please pay the renewal premium of {}.",
                policy.policy_number, policy.premium_amount
            ),
        )];
        if let Some(agent) = policy.agent_id {
            outbox.push(Outbound::new(
                agent,
                format!(
                    "Policy {} renewed successfully. New End Date: {}",
                    policy.policy_number, policy.end_date
                ),
            ));
        }
        self.dispatch(outbox).await;
        Ok(policy)
    }

    /// Suspends an active policy or reactivates a suspended one
    #[instrument(skip(self), fields(user_id = %identity.user_id, policy_id = %policy_id))]
    pub async fn toggle_policy_status(&self, identity: &Identity, policy_id: PolicyId) -> Result<Policy, ClaimError> {
        let mut tx = self.store.begin().await?;
        let mut target = load_policy(tx.as_mut(), policy_id).await?;
        ensure_servicing_agent(identity, &target.policy, "change policy status")?;
        let previous = target.policy.status;
        target.policy.status = target.policy.toggled_status()?;
        tx.update_policy(&target.policy).await?;
        tx.commit().await?;
        info!(policy_id = %policy_id, from = %previous, to = %target.policy.status, "Policy status changed");
        Ok(target.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(premium_amount: Decimal) -> PolicyWithPlan {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        PolicyWithPlan {
            policy: Policy {
                id: PolicyId::new(1),
                policy_number: "POL-1A2B3C4D".into(),
                customer_id: UserId::new(5),
                agent_id: None,
                plan_id: PlanId::new(1),
                start_date: start,
                end_date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                status: PolicyStatus::Active,
                premium_paid: true,
                premium_amount,
            },
            plan: Plan {
                id: PlanId::new(1),
                name: "Silver".into(),
                premium_amount: dec!(1200),
                coverage_limit: dec!(10000),
                duration_in_months: 1,
                is_active: true,
            },
        }
    }

    #[test]
    fn test_required_premium_prefers_cached_amount() {
        assert_eq!(sample(dec!(900)).required_premium(), dec!(900));
        assert_eq!(sample(Decimal::ZERO).required_premium(), dec!(1200));
    }

    #[test]
    fn test_term_end_clamps_to_month_end() {
        assert!(sample(Decimal::ZERO).has_consistent_term());
    }

    #[test]
    fn test_renewal_continues_from_current_end() {
        let mut target = sample(dec!(999.99));
        target.renew(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()).unwrap();
        assert_eq!(target.policy.start_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(target.policy.end_date, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert_eq!(target.policy.premium_amount, dec!(1079.99));
        assert!(!target.policy.premium_paid);
        assert!(target.has_consistent_term());
    }

    #[test]
    fn test_lapsed_renewal_starts_today() {
        let mut target = sample(Decimal::ZERO);
        target.policy.status = PolicyStatus::Expired;
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        target.renew(today).unwrap();
        assert_eq!(target.policy.start_date, today);
        assert_eq!(target.policy.premium_amount, dec!(1296.00));
        assert_eq!(target.policy.status, PolicyStatus::Active);
    }

    #[test]
    fn test_cancelled_policy_cannot_renew_or_toggle() {
        let mut target = sample(dec!(100));
        target.policy.status = PolicyStatus::Cancelled;
        assert!(matches!(
            target.renew(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()),
            Err(BusinessRuleViolation::PolicyStatusLocked { .. })
        ));
        assert!(target.policy.toggled_status().is_err());
    }

    #[test]
    fn test_toggle_swaps_active_and_suspended() {
        let mut target = sample(dec!(100));
        assert_eq!(target.policy.toggled_status().unwrap(), PolicyStatus::Suspended);
        target.policy.status = PolicyStatus::Suspended;
        assert_eq!(target.policy.toggled_status().unwrap(), PolicyStatus::Active);
        target.policy.status = PolicyStatus::Expired;
        assert!(target.policy.toggled_status().is_err());
    }

    #[test]
    fn test_enrollment_derives_term_and_number() {
        let plan = sample(Decimal::ZERO).plan;
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let policy = NewPolicy::enroll(UserId::new(5), UserId::new(4), &plan, start)
            .unwrap()
            .into_policy(PolicyId::new(9));
        assert_eq!(policy.end_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(policy.premium_amount, dec!(1200));
        assert!(!policy.premium_paid);
        assert!(ReferenceNumber::is_well_formed(&policy.policy_number, ReferenceKind::Policy));
    }
}
