//! Treatment records
//!
//! A hospital's account of a medical encounter, independent of any claim.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{HospitalId, Identity, PolicyId, Role, TreatmentId, UserId};

use crate::coverage;
use crate::engine::{require_role, ClaimsEngine};
use crate::error::{BusinessRuleViolation, ClaimError};

/// A hospital's treatment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentRecord {
    pub id: TreatmentId,
    pub hospital_id: HospitalId,
    /// Null until a claim against this record is finalized
    pub policy_id: Option<PolicyId>,
    pub customer_id: UserId,
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub treatment_details: String,
    pub cost: Decimal,
    pub submitted_at: DateTime<Utc>,
}

impl TreatmentRecord {
    /// Overwrites the hospital-editable fields
    pub fn apply(&mut self, input: TreatmentInput) {
        self.treatment_date = input.treatment_date;
        self.diagnosis = input.diagnosis;
        self.treatment_details = input.treatment_details;
        self.cost = input.cost;
    }
}

/// Hospital-supplied treatment facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentInput {
    pub diagnosis: String,
    pub treatment_details: String,
    pub cost: Decimal,
    pub treatment_date: NaiveDate,
}

impl TreatmentInput {
    pub fn validate(&self) -> Result<(), BusinessRuleViolation> {
        if self.diagnosis.trim().is_empty() {
            return Err(BusinessRuleViolation::InvalidTreatment(
                "diagnosis must not be empty".into(),
            ));
        }
        if self.cost <= Decimal::ZERO {
            return Err(BusinessRuleViolation::InvalidTreatment(
                "cost must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A treatment record not yet persisted
#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub hospital_id: HospitalId,
    pub policy_id: Option<PolicyId>,
    pub customer_id: UserId,
    pub input: TreatmentInput,
    pub submitted_at: DateTime<Utc>,
}

impl NewTreatment {
    pub fn into_record(self, id: TreatmentId) -> TreatmentRecord {
        TreatmentRecord {
            id,
            hospital_id: self.hospital_id,
            policy_id: self.policy_id,
            customer_id: self.customer_id,
            treatment_date: self.input.treatment_date,
            diagnosis: self.input.diagnosis,
            treatment_details: self.input.treatment_details,
            cost: self.input.cost,
            submitted_at: self.submitted_at,
        }
    }
}

impl ClaimsEngine {
    /// Hospital self-service entry of a treatment against a policy number.
    ///
    /// The record is bound to the policy and its customer. No claim is created.
    /// A manager of several hospitals names one with `hospital_id`; without it the
    /// lowest-id hospital they manage is used.
    #[instrument(skip(self, input), fields(user_id = %identity.user_id))]
    pub async fn submit_treatment(
        &self,
        identity: &Identity,
        hospital_id: Option<HospitalId>,
        policy_number: &str,
        input: TreatmentInput,
    ) -> Result<TreatmentRecord, ClaimError> {
        require_role(identity, &[Role::HospitalManager], "submit treatments")?;
        input.validate()?;
        let mut managed = self.directory.hospitals_managed_by(identity.user_id).await?;
        let hospital = match hospital_id {
            Some(id) => managed
                .into_iter()
                .find(|h| h.id == id)
                .ok_or_else(|| ClaimError::unauthorized(format!("caller does not manage hospital {}", id)))?,
            None if managed.is_empty() => {
                return Err(ClaimError::not_found(
                    "Hospital",
                    format!("managed by user {}", identity.user_id),
                ))
            }
            None => managed.swap_remove(0),
        };

        let mut tx = self.store.begin().await?;
        let policy = tx
            .policy_by_number(policy_number)
            .await?
            .ok_or_else(|| ClaimError::not_found("Policy", policy_number.trim()))?;
        coverage::ensure_active(&policy)?;

        let record = tx
            .insert_treatment(NewTreatment {
                hospital_id: hospital.id,
                policy_id: Some(policy.id),
                customer_id: policy.customer_id,
                input,
                submitted_at: Utc::now(),
            })
            .await?;
        tx.commit().await?;
        info!(treatment_id = %record.id, hospital_id = %hospital.id, "Treatment recorded");
        Ok(record)
    }

    /// Hospital edits its own treatment record.
    ///
    /// Claims keep the snapshot taken when they were linked.
    #[instrument(skip(self, input), fields(user_id = %identity.user_id, treatment_id = %treatment_id))]
    pub async fn update_treatment(
        &self,
        identity: &Identity,
        treatment_id: TreatmentId,
        input: TreatmentInput,
    ) -> Result<TreatmentRecord, ClaimError> {
        require_role(identity, &[Role::HospitalManager], "edit treatments")?;
        input.validate()?;
        let managed = self.directory.hospitals_managed_by(identity.user_id).await?;

        let mut tx = self.store.begin().await?;
        let mut record = tx
            .treatment_for_update(treatment_id)
            .await?
            .ok_or_else(|| ClaimError::not_found("TreatmentRecord", treatment_id))?;
        if !managed.iter().any(|h| h.id == record.hospital_id) {
            return Err(ClaimError::unauthorized(
                "treatment record belongs to another hospital",
            ));
        }
        record.apply(input);
        tx.update_treatment(&record).await?;
        tx.commit().await?;
        info!(treatment_id = %record.id, "Treatment updated");
        Ok(record)
    }

    /// Treatment records visible to the caller, newest first.
    ///
    /// Customers see their own, managers those of every hospital they manage,
    /// agents those on policies they enrolled, officers and admins all of them.
    pub async fn list_treatments(&self, identity: &Identity) -> Result<Vec<TreatmentRecord>, ClaimError> {
        let scope = self.scope_for(identity).await?;
        Ok(self.store.find_treatments(scope).await?)
    }
}
