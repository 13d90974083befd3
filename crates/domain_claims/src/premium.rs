//! Premium payments
//!
//! Paying the premium is what makes a policy claimable.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use core_kernel::{Identity, PolicyId, Role};

use crate::engine::{load_policy, non_blank, ClaimsEngine};
use crate::error::{BusinessRuleViolation, ClaimError};
use crate::notifier::Outbound;
use crate::payment::{NewPayment, Payment};

impl ClaimsEngine {
    /// Records a completed premium payment and flags the policy paid.
    ///
    /// Allowed for the policy's customer, its enrolling agent, or an admin.
    #[instrument(skip(self), fields(user_id = %identity.user_id, policy_id = %policy_id))]
    pub async fn pay_premium(
        &self,
        identity: &Identity,
        policy_id: PolicyId,
        amount: Decimal,
        payment_method: String,
    ) -> Result<Payment, ClaimError> {
        let payment_method = non_blank(payment_method).ok_or(BusinessRuleViolation::PaymentMethodRequired)?;

        let mut tx = self.store.begin().await?;
        let mut target = load_policy(tx.as_mut(), policy_id).await?;
        let policy = &target.policy;
        let permitted = identity.is(Role::Admin)
            || policy.is_owned_by(identity.user_id)
            || policy.agent_id == Some(identity.user_id);
        if !permitted {
            return Err(ClaimError::unauthorized("caller cannot pay this policy's premium"));
        }
        if policy.premium_paid {
            return Err(BusinessRuleViolation::PremiumAlreadyPaid {
                policy_number: policy.policy_number.clone(),
            }
            .into());
        }
        let required = target.required_premium();
        if amount < required {
            return Err(BusinessRuleViolation::InsufficientPremium {
                required,
                offered: amount,
            }
            .into());
        }

        let payment = tx
            .insert_payment(NewPayment::premium(policy_id, amount, payment_method))
            .await?;
        target.policy.premium_paid = true;
        tx.update_policy(&target.policy).await?;
        tx.commit().await?;

        let policy = target.policy;
        info!(policy_id = %policy.id, payment_reference = %payment.reference, "Premium paid");

        let mut outbox = vec![Outbound::new(
            policy.customer_id,
            format!(
                "Premium payment of {} received. Policy {} is now active.",
                amount, policy.policy_number
            ),
        )];
        if let Some(agent) = policy.agent_id {
            outbox.push(Outbound::new(
                agent,
                format!(
                    "Premium paid for Policy {}. Policy is now Active.",
                    policy.policy_number
                ),
            ));
        }
        self.dispatch(outbox).await;
        Ok(payment)
    }
}
