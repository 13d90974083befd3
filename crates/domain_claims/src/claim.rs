//! Claim entity and its state machine

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, HospitalId, PolicyId, TreatmentId, UserId};

use crate::error::ClaimError;

/// Claim status
///
/// ```text
/// Initiated -> AwaitingPolicy -> Submitted -> InReview -> Approved -> Paid
///                                    |            |
///                                    +------------+--> Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Submitted for review, policy and amount bound
    Submitted,
    /// Picked up by a claims officer
    InReview,
    /// Approved; only ever observed inside a settlement transaction
    Approved,
    /// Rejected with a reason
    Rejected,
    /// Payout recorded
    Paid,
    /// Opened by the customer, waiting for the hospital's treatment details
    Initiated,
    /// Reserved storage value. No transition produces or accepts it.
    AwaitingHospital,
    /// Treatment details recorded, waiting for the customer to pick a policy
    AwaitingPolicy,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 8] = [
        ClaimStatus::Submitted,
        ClaimStatus::InReview,
        ClaimStatus::Approved,
        ClaimStatus::Rejected,
        ClaimStatus::Paid,
        ClaimStatus::Initiated,
        ClaimStatus::AwaitingHospital,
        ClaimStatus::AwaitingPolicy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Submitted => "Submitted",
            ClaimStatus::InReview => "InReview",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::Paid => "Paid",
            ClaimStatus::Initiated => "Initiated",
            ClaimStatus::AwaitingHospital => "AwaitingHospital",
            ClaimStatus::AwaitingPolicy => "AwaitingPolicy",
        }
    }

    /// Paid and Rejected claims are archived in listings
    pub fn is_archived(&self) -> bool {
        matches!(self, ClaimStatus::Paid | ClaimStatus::Rejected)
    }

    /// States a claims officer may decide from
    pub fn is_reviewable(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Submitted | ClaimStatus::InReview | ClaimStatus::Rejected
        )
    }

    /// Checks if transition is valid
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (*self, target),
            (Initiated, AwaitingPolicy)
                | (AwaitingPolicy, Submitted)
                | (Submitted, InReview)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (InReview, Approved)
                | (InReview, Rejected)
                | (Rejected, Approved)
                | (Rejected, Rejected)
                | (Approved, Paid)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    /// Case-insensitive; underscores are ignored so `in_review` parses as `InReview`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown claim status '{}'", s))
    }
}

/// A claim against a policy for a treatment's cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// Generated `CLM-XXXXXXXX` reference
    pub claim_number: String,
    /// Customer's free-text description, used before a treatment record exists
    pub treatment_description: Option<String>,
    pub policy_id: Option<PolicyId>,
    pub customer_id: UserId,
    pub hospital_id: Option<HospitalId>,
    pub treatment_id: Option<TreatmentId>,
    pub claim_amount: Option<Decimal>,
    pub approved_amount: Decimal,
    /// Snapshot of the treatment date, written only on hospital update or direct submission
    pub treatment_date: Option<NaiveDate>,
    /// Snapshot of the treatment details, same write points as `treatment_date`
    pub treatment_details: Option<String>,
    pub status: ClaimStatus,
    pub reviewed_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Claim {
    /// Moves the claim to `target`, failing with `InvalidState` on an illegal edge
    pub fn transition(&mut self, target: ClaimStatus, operation: &'static str) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(target) {
            return Err(ClaimError::invalid_state(self.id, self.status, operation));
        }
        self.status = target;
        Ok(())
    }

    /// Fails with `InvalidState` unless the claim is currently in `expected`
    pub fn require_status(&self, expected: ClaimStatus, operation: &'static str) -> Result<(), ClaimError> {
        if self.status != expected {
            return Err(ClaimError::invalid_state(self.id, self.status, operation));
        }
        Ok(())
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.customer_id == user
    }

    /// A positive approved amount only exists on Approved or Paid claims
    pub fn approved_amount_consistent(&self) -> bool {
        self.approved_amount <= Decimal::ZERO
            || matches!(self.status, ClaimStatus::Approved | ClaimStatus::Paid)
    }
}

/// A claim not yet persisted; the store assigns its id
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub claim_number: String,
    pub treatment_description: Option<String>,
    pub policy_id: Option<PolicyId>,
    pub customer_id: UserId,
    pub hospital_id: Option<HospitalId>,
    pub treatment_id: Option<TreatmentId>,
    pub claim_amount: Option<Decimal>,
    pub treatment_date: Option<NaiveDate>,
    pub treatment_details: Option<String>,
    pub status: ClaimStatus,
    pub submitted_at: DateTime<Utc>,
}

impl NewClaim {
    /// Materializes the stored claim under the assigned id
    pub fn into_claim(self, id: ClaimId) -> Claim {
        Claim {
            id,
            claim_number: self.claim_number,
            treatment_description: self.treatment_description,
            policy_id: self.policy_id,
            customer_id: self.customer_id,
            hospital_id: self.hospital_id,
            treatment_id: self.treatment_id,
            claim_amount: self.claim_amount,
            approved_amount: Decimal::ZERO,
            treatment_date: self.treatment_date,
            treatment_details: self.treatment_details,
            status: self.status,
            reviewed_by: None,
            rejection_reason: None,
            submitted_at: self.submitted_at,
            reviewed_at: None,
            processed_at: None,
        }
    }
}
