//! Claim Lifecycle Engine
//!
//! Every operation follows the same shape: check the caller's role, open one ledger
//! transaction, load the claim with a row lock, validate guards against that fresh
//! state, write conditionally on the loaded status, commit, then send notifications.
//! Notifications go out only after commit and their failures are swallowed.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    ClaimId, HospitalId, Identity, PolicyId, ReferenceKind, ReferenceNumber, Role, TreatmentId,
};

use crate::claim::{Claim, ClaimStatus, NewClaim};
use crate::coverage;
use crate::error::{BusinessRuleViolation, ClaimError};
use crate::notifier::Outbound;
use crate::payment::Payment;
use crate::policy::PolicyWithPlan;
use crate::ports::{CapabilityDirectory, LedgerStore, LedgerTransaction, NotificationSink};
use crate::query::{ClaimListQuery, ClaimScope, Page};
use crate::settlement::SettlementProcessor;
use crate::treatment::{NewTreatment, TreatmentInput};

/// An officer's decision on a claim
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewDecision {
    Approve { amount: Decimal },
    Reject { reason: String },
}

impl ReviewDecision {
    /// Builds a decision from the flag-style review form
    pub fn from_form(approve: bool, approved_amount: Option<Decimal>, rejection_reason: Option<String>) -> Self {
        if approve {
            ReviewDecision::Approve {
                amount: approved_amount.unwrap_or(Decimal::ZERO),
            }
        } else {
            ReviewDecision::Reject {
                reason: rejection_reason.unwrap_or_default(),
            }
        }
    }
}

/// Result of a review
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Rejected(Claim),
    Paid { claim: Claim, payment: Payment },
}

impl ReviewOutcome {
    pub fn claim(&self) -> &Claim {
        match self {
            ReviewOutcome::Rejected(claim) => claim,
            ReviewOutcome::Paid { claim, .. } => claim,
        }
    }
}

/// The claims lifecycle and settlement engine
#[derive(Clone)]
pub struct ClaimsEngine {
    pub(crate) store: Arc<dyn LedgerStore>,
    pub(crate) directory: Arc<dyn CapabilityDirectory>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    settlement: SettlementProcessor,
}

impl ClaimsEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn CapabilityDirectory>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            settlement: SettlementProcessor::new(),
        }
    }

    /// Opens a claim on a paid policy, waiting for the hospital's treatment details
    #[instrument(skip(self, description), fields(user_id = %identity.user_id))]
    pub async fn initiate_claim(
        &self,
        identity: &Identity,
        policy_id: PolicyId,
        hospital_id: HospitalId,
        description: String,
    ) -> Result<Claim, ClaimError> {
        require_role(identity, &[Role::Customer], "initiate a claim")?;
        let description = non_blank(description).ok_or(BusinessRuleViolation::DescriptionRequired)?;
        let hospital = self
            .directory
            .hospital(hospital_id)
            .await?
            .ok_or_else(|| ClaimError::not_found("Hospital", hospital_id))?;

        let mut tx = self.store.begin().await?;
        let target = load_policy(tx.as_mut(), policy_id).await?;
        if !target.policy.is_owned_by(identity.user_id) {
            return Err(ClaimError::unauthorized("policy does not belong to the caller"));
        }
        let premium_recorded = tx.has_completed_premium(policy_id).await?;
        coverage::ensure_premium_paid(&target.policy, premium_recorded)?;

        let claim = tx
            .insert_claim(NewClaim {
                claim_number: ReferenceNumber::generate(ReferenceKind::Claim).into_string(),
                treatment_description: Some(description),
                policy_id: Some(policy_id),
                customer_id: identity.user_id,
                hospital_id: Some(hospital.id),
                treatment_id: None,
                claim_amount: None,
                treatment_date: None,
                treatment_details: None,
                status: ClaimStatus::Initiated,
                submitted_at: Utc::now(),
            })
            .await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, status = %claim.status, "Claim initiated");

        let mut outbox = vec![Outbound::new(
            identity.user_id,
            "Claim initiated. Please wait for hospital to update treatment details.",
        )];
        if let Some(manager) = hospital.manager_id {
            outbox.push(Outbound::new(
                manager,
                format!("New claim initiated for patient. Claim #{}", claim.claim_number),
            ));
        }
        self.dispatch(outbox).await;
        Ok(claim)
    }

    /// Hospital records treatment details against an initiated claim
    #[instrument(skip(self, input), fields(user_id = %identity.user_id, claim_id = %claim_id))]
    pub async fn hospital_update(
        &self,
        identity: &Identity,
        claim_id: ClaimId,
        input: TreatmentInput,
    ) -> Result<Claim, ClaimError> {
        require_role(identity, &[Role::HospitalManager], "update treatment details")?;
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let mut claim = load_claim(tx.as_mut(), claim_id).await?;
        let hospital = match claim.hospital_id {
            Some(hospital_id) => self.directory.hospital(hospital_id).await?,
            None => None,
        };
        let hospital_id = match hospital {
            Some(hospital) if hospital.is_managed_by(identity.user_id) => hospital.id,
            _ => {
                return Err(ClaimError::unauthorized(
                    "caller does not manage the hospital for this claim",
                ))
            }
        };
        let loaded = claim.status;
        claim.require_status(ClaimStatus::Initiated, "record treatment details")?;

        let treatment = tx
            .insert_treatment(NewTreatment {
                hospital_id,
                policy_id: None,
                customer_id: claim.customer_id,
                input,
                submitted_at: Utc::now(),
            })
            .await?;

        claim.treatment_id = Some(treatment.id);
        claim.claim_amount = Some(treatment.cost);
        claim.treatment_date = Some(treatment.treatment_date);
        claim.treatment_details = Some(treatment.treatment_details.clone());
        claim.transition(ClaimStatus::AwaitingPolicy, "record treatment details")?;
        write_claim(tx.as_mut(), &claim, loaded).await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, treatment_id = %treatment.id, status = %claim.status, "Treatment details recorded");

        self.dispatch(vec![Outbound::new(
            claim.customer_id,
            format!(
                "Hospital has updated treatment details for Claim {}. Please finalize the claim.",
                claim.claim_number
            ),
        )])
        .await;
        Ok(claim)
    }

    /// Customer binds a policy to a claim awaiting one and submits it for review
    #[instrument(skip(self), fields(user_id = %identity.user_id, claim_id = %claim_id))]
    pub async fn finalize_claim(
        &self,
        identity: &Identity,
        claim_id: ClaimId,
        policy_id: PolicyId,
    ) -> Result<Claim, ClaimError> {
        require_role(identity, &[Role::Customer], "finalize a claim")?;

        let mut tx = self.store.begin().await?;
        let mut claim = load_claim(tx.as_mut(), claim_id).await?;
        if !claim.is_owned_by(identity.user_id) {
            return Err(ClaimError::unauthorized("claim does not belong to the caller"));
        }
        let loaded = claim.status;
        claim.require_status(ClaimStatus::AwaitingPolicy, "finalize")?;
        let amount = claim
            .claim_amount
            .ok_or_else(|| ClaimError::invalid_state(claim.id, claim.status, "finalize"))?;

        let target = load_policy(tx.as_mut(), policy_id).await?;
        if !target.policy.is_owned_by(identity.user_id) {
            return Err(ClaimError::unauthorized("policy does not belong to the caller"));
        }
        let premium_recorded = tx.has_completed_premium(policy_id).await?;
        if let Err(violation) = coverage::validate_claim_against(&target, premium_recorded, amount) {
            debug!(claim_id = %claim.id, %violation, "Finalize rejected");
            return Err(violation.into());
        }

        if let Some(treatment_id) = claim.treatment_id {
            let mut treatment = tx
                .treatment_for_update(treatment_id)
                .await?
                .ok_or_else(|| ClaimError::not_found("TreatmentRecord", treatment_id))?;
            treatment.policy_id = Some(policy_id);
            tx.update_treatment(&treatment).await?;
        }
        claim.policy_id = Some(policy_id);
        claim.transition(ClaimStatus::Submitted, "finalize")?;
        write_claim(tx.as_mut(), &claim, loaded).await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, policy_id = %policy_id, status = %claim.status, "Claim finalized");

        let mut outbox = vec![Outbound::new(
            claim.customer_id,
            format!("Claim {} submitted for review.", claim.claim_number),
        )];
        outbox.extend(self.officer_alert(&claim).await);
        self.dispatch(outbox).await;
        Ok(claim)
    }

    /// Direct submission against an existing treatment record
    #[instrument(skip(self), fields(user_id = %identity.user_id, treatment_id = %treatment_id))]
    pub async fn submit_claim(
        &self,
        identity: &Identity,
        policy_id: PolicyId,
        treatment_id: TreatmentId,
        claim_amount: Decimal,
    ) -> Result<Claim, ClaimError> {
        require_role(identity, &[Role::Customer], "submit a claim")?;
        if claim_amount <= Decimal::ZERO {
            return Err(BusinessRuleViolation::ClaimAmountNotPositive.into());
        }

        let mut tx = self.store.begin().await?;
        let target = load_policy(tx.as_mut(), policy_id).await?;
        if !target.policy.is_owned_by(identity.user_id) {
            return Err(ClaimError::unauthorized("policy does not belong to the caller"));
        }
        let premium_recorded = tx.has_completed_premium(policy_id).await?;
        coverage::validate_claim_against(&target, premium_recorded, claim_amount)?;

        let mut treatment = tx
            .treatment_for_update(treatment_id)
            .await?
            .ok_or_else(|| ClaimError::not_found("TreatmentRecord", treatment_id))?;
        if treatment.customer_id != identity.user_id {
            return Err(ClaimError::unauthorized("treatment record belongs to another customer"));
        }
        match treatment.policy_id {
            Some(recorded) if recorded != policy_id => {
                return Err(BusinessRuleViolation::TreatmentPolicyMismatch {
                    treatment_id,
                    recorded,
                    requested: policy_id,
                }
                .into());
            }
            Some(_) => {}
            None => {
                treatment.policy_id = Some(policy_id);
                tx.update_treatment(&treatment).await?;
            }
        }
        if tx.claim_exists_for_treatment(treatment_id).await? {
            debug!(treatment_id = %treatment_id, "Duplicate claim for treatment");
            return Err(BusinessRuleViolation::DuplicateTreatmentClaim { treatment_id }.into());
        }

        let claim = tx
            .insert_claim(NewClaim {
                claim_number: ReferenceNumber::generate(ReferenceKind::Claim).into_string(),
                treatment_description: None,
                policy_id: Some(policy_id),
                customer_id: identity.user_id,
                hospital_id: Some(treatment.hospital_id),
                treatment_id: Some(treatment_id),
                claim_amount: Some(claim_amount),
                treatment_date: Some(treatment.treatment_date),
                treatment_details: Some(treatment.treatment_details.clone()),
                status: ClaimStatus::Submitted,
                submitted_at: Utc::now(),
            })
            .await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, status = %claim.status, "Claim submitted");

        let mut outbox = vec![Outbound::new(
            claim.customer_id,
            format!("Claim {} submitted for review.", claim.claim_number),
        )];
        outbox.extend(self.officer_alert(&claim).await);
        self.dispatch(outbox).await;
        Ok(claim)
    }

    /// Officer picks up a submitted claim
    #[instrument(skip(self), fields(user_id = %identity.user_id, claim_id = %claim_id))]
    pub async fn begin_review(&self, identity: &Identity, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        require_role(identity, &[Role::ClaimsOfficer], "review claims")?;

        let mut tx = self.store.begin().await?;
        let mut claim = load_claim(tx.as_mut(), claim_id).await?;
        let loaded = claim.status;
        claim.transition(ClaimStatus::InReview, "begin review")?;
        claim.reviewed_by = Some(identity.user_id);
        write_claim(tx.as_mut(), &claim, loaded).await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, status = %claim.status, "Claim in review");
        Ok(claim)
    }

    /// Officer approves (and settles) or rejects a claim.
    ///
    /// Not idempotent: reviewing a Paid claim fails with `InvalidState`.
    #[instrument(skip(self, decision), fields(user_id = %identity.user_id, claim_id = %claim_id))]
    pub async fn review_claim(
        &self,
        identity: &Identity,
        claim_id: ClaimId,
        decision: ReviewDecision,
    ) -> Result<ReviewOutcome, ClaimError> {
        require_role(identity, &[Role::ClaimsOfficer], "review claims")?;

        let mut tx = self.store.begin().await?;
        let mut claim = load_claim(tx.as_mut(), claim_id).await?;
        let loaded = claim.status;
        if !loaded.is_reviewable() {
            debug!(claim_id = %claim.id, status = %loaded, "Review refused");
            return Err(ClaimError::invalid_state(claim.id, loaded, "review"));
        }
        let now = Utc::now();
        claim.reviewed_by = Some(identity.user_id);
        claim.reviewed_at = Some(now);

        match decision {
            ReviewDecision::Reject { reason } => {
                let reason = non_blank(reason).ok_or(BusinessRuleViolation::RejectionReasonRequired)?;
                claim.transition(ClaimStatus::Rejected, "reject")?;
                claim.approved_amount = Decimal::ZERO;
                claim.rejection_reason = Some(reason.clone());
                write_claim(tx.as_mut(), &claim, loaded).await?;
                tx.commit().await?;
                info!(claim_id = %claim.id, status = %claim.status, "Claim rejected");

                self.dispatch(vec![
                    Outbound::new(
                        claim.customer_id,
                        format!("Your claim has been rejected. Reason: {}", reason),
                    ),
                    Outbound::new(
                        identity.user_id,
                        format!("You rejected Claim {}.", claim.claim_number),
                    ),
                ])
                .await;
                Ok(ReviewOutcome::Rejected(claim))
            }
            ReviewDecision::Approve { amount } => {
                if amount <= Decimal::ZERO {
                    return Err(BusinessRuleViolation::ApprovedAmountNotPositive.into());
                }
                let claimed = claim.claim_amount.unwrap_or(Decimal::ZERO);
                if amount > claimed {
                    return Err(BusinessRuleViolation::ApprovedAmountExceedsClaim {
                        approved: amount,
                        claimed,
                    }
                    .into());
                }
                let policy_id = claim
                    .policy_id
                    .ok_or(BusinessRuleViolation::PolicyNotBound(claim.id))?;
                let agent = tx
                    .policy_with_plan(policy_id)
                    .await?
                    .and_then(|target| target.policy.agent_id);

                claim.transition(ClaimStatus::Approved, "approve")?;
                claim.approved_amount = amount;
                claim.rejection_reason = None;
                let payment = self.settlement.settle(tx.as_mut(), &mut claim, loaded).await?;
                tx.commit().await?;
                info!(claim_id = %claim.id, status = %claim.status, amount = %amount, "Claim approved and paid");

                let mut outbox = vec![
                    Outbound::new(
                        claim.customer_id,
                        format!("Claim approved and payout of {} initiated.", amount),
                    ),
                    Outbound::new(
                        identity.user_id,
                        format!("You approved Claim {}. Payout initiated.", claim.claim_number),
                    ),
                ];
                if let Some(agent) = agent {
                    outbox.push(Outbound::new(
                        agent,
                        format!(
                            "Payout of {} settled for Claim {} ({}).",
                            amount, claim.claim_number, payment.reference
                        ),
                    ));
                }
                self.dispatch(outbox).await;
                Ok(ReviewOutcome::Paid { claim, payment })
            }
        }
    }

    /// Removes a claim and any payments referencing it.
    ///
    /// Customers may delete only their own claims, and only while Initiated.
    /// Admins and claims officers may delete in any state. Returns the number of
    /// payments removed with the claim.
    #[instrument(skip(self), fields(user_id = %identity.user_id, claim_id = %claim_id))]
    pub async fn delete_claim(&self, identity: &Identity, claim_id: ClaimId) -> Result<u64, ClaimError> {
        let mut tx = self.store.begin().await?;
        let claim = load_claim(tx.as_mut(), claim_id).await?;
        if !identity.role.is_privileged() {
            if !claim.is_owned_by(identity.user_id) {
                return Err(ClaimError::unauthorized("claim does not belong to the caller"));
            }
            claim.require_status(ClaimStatus::Initiated, "delete")?;
        }
        let removed = tx.delete_payments_for_claim(claim.id).await?;
        tx.delete_claim(claim.id).await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, status = %claim.status, payments_removed = removed, "Claim deleted");
        Ok(removed)
    }

    /// Customer edits the free-text description of an Initiated claim
    #[instrument(skip(self, description), fields(user_id = %identity.user_id, claim_id = %claim_id))]
    pub async fn update_description(
        &self,
        identity: &Identity,
        claim_id: ClaimId,
        description: String,
    ) -> Result<Claim, ClaimError> {
        let description = non_blank(description).ok_or(BusinessRuleViolation::DescriptionRequired)?;

        let mut tx = self.store.begin().await?;
        let mut claim = load_claim(tx.as_mut(), claim_id).await?;
        if !claim.is_owned_by(identity.user_id) {
            return Err(ClaimError::unauthorized("claim does not belong to the caller"));
        }
        let loaded = claim.status;
        claim.require_status(ClaimStatus::Initiated, "edit")?;
        claim.treatment_description = Some(description);
        write_claim(tx.as_mut(), &claim, loaded).await?;
        tx.commit().await?;
        info!(claim_id = %claim.id, "Claim description updated");
        Ok(claim)
    }

    /// Reads one claim visible to the caller; invisible claims are reported missing
    pub async fn get_claim(&self, identity: &Identity, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        let scope = self.scope_for(identity).await?;
        self.store
            .get_claim(claim_id, scope)
            .await?
            .ok_or_else(|| ClaimError::not_found("Claim", claim_id))
    }

    /// Lists claims visible to the caller
    pub async fn list_claims(
        &self,
        identity: &Identity,
        query: &ClaimListQuery,
    ) -> Result<Page<Claim>, ClaimError> {
        query.validate()?;
        let scope = self.scope_for(identity).await?;
        Ok(self.store.find_claims(scope, query).await?)
    }

    /// Visibility for reads. Managers see every hospital they manage, the same
    /// set `hospital_update` accepts.
    pub(crate) async fn scope_for(&self, identity: &Identity) -> Result<ClaimScope, ClaimError> {
        Ok(match identity.role {
            Role::Admin | Role::ClaimsOfficer => ClaimScope::All,
            Role::Customer => ClaimScope::Customer(identity.user_id),
            Role::InsuranceAgent => ClaimScope::Agent(identity.user_id),
            Role::HospitalManager => ClaimScope::hospitals(
                self.directory
                    .hospitals_managed_by(identity.user_id)
                    .await?
                    .into_iter()
                    .map(|hospital| hospital.id)
                    .collect(),
            ),
        })
    }

    /// Alert for the reviewing officer, if one can be picked
    async fn officer_alert(&self, claim: &Claim) -> Option<Outbound> {
        match self.directory.pick_reviewing_officer().await {
            Ok(Some(officer)) => Some(Outbound::new(
                officer,
                format!("New claim {} requires review.", claim.claim_number),
            )),
            Ok(None) => {
                warn!(claim_id = %claim.id, "No active claims officer to notify");
                None
            }
            Err(error) => {
                warn!(claim_id = %claim.id, %error, "Officer lookup failed");
                None
            }
        }
    }

    /// Sends notifications; failures are logged and never surface
    pub(crate) async fn dispatch(&self, outbox: Vec<Outbound>) {
        for outbound in outbox {
            if let Err(error) = self.notifier.notify(outbound.user_id, &outbound.message).await {
                warn!(user_id = %outbound.user_id, %error, "Notification failed");
            }
        }
    }
}

pub(crate) fn require_role(identity: &Identity, allowed: &[Role], action: &str) -> Result<(), ClaimError> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(ClaimError::unauthorized(format!(
            "role {} cannot {}",
            identity.role, action
        )))
    }
}

pub(crate) async fn load_claim(tx: &mut dyn LedgerTransaction, id: ClaimId) -> Result<Claim, ClaimError> {
    tx.claim_for_update(id)
        .await?
        .ok_or_else(|| ClaimError::not_found("Claim", id))
}

pub(crate) async fn load_policy(
    tx: &mut dyn LedgerTransaction,
    id: PolicyId,
) -> Result<PolicyWithPlan, ClaimError> {
    tx.policy_with_plan(id)
        .await?
        .ok_or_else(|| ClaimError::not_found("Policy", id))
}

/// Conditional claim write; a changed stored status means another writer won
async fn write_claim(
    tx: &mut dyn LedgerTransaction,
    claim: &Claim,
    expected: ClaimStatus,
) -> Result<(), ClaimError> {
    if tx.update_claim(claim, expected).await? {
        Ok(())
    } else {
        warn!(claim_id = %claim.id, expected = %expected, "Claim changed underneath transition");
        Err(ClaimError::StaleState(claim.id))
    }
}

pub(crate) fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
