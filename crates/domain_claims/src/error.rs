//! Claims domain errors
//!
//! Every rejected operation maps to one of four caller-facing kinds
//! (not found, unauthorized, invalid state, business rule) plus store failures.
//! None of them are retried inside the domain.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{ClaimId, PlanId, PolicyId, PortError, Role, TreatmentId, UserId};

use crate::claim::ClaimStatus;
use crate::policy::PolicyStatus;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Claim {claim_id} is {status}; cannot {operation}")]
    InvalidState {
        claim_id: ClaimId,
        status: ClaimStatus,
        operation: &'static str,
    },

    #[error("Claim {0} was modified concurrently; reload and retry")]
    StaleState(ClaimId),

    #[error(transparent)]
    BusinessRule(#[from] BusinessRuleViolation),

    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

/// Caller-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    BusinessRuleViolation,
    Store,
}

impl ClaimError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ClaimError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ClaimError::Unauthorized(message.into())
    }

    pub fn invalid_state(claim_id: ClaimId, status: ClaimStatus, operation: &'static str) -> Self {
        ClaimError::InvalidState {
            claim_id,
            status,
            operation,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClaimError::NotFound { .. } => ErrorKind::NotFound,
            ClaimError::Unauthorized(_) => ErrorKind::Unauthorized,
            ClaimError::InvalidState { .. } | ClaimError::StaleState(_) => ErrorKind::InvalidState,
            ClaimError::BusinessRule(_) => ErrorKind::BusinessRuleViolation,
            ClaimError::Store(PortError::NotFound { .. }) => ErrorKind::NotFound,
            ClaimError::Store(PortError::Conflict { .. }) => ErrorKind::InvalidState,
            ClaimError::Store(_) => ErrorKind::Store,
        }
    }

    /// Returns the violated business rule, if that is what failed
    pub fn violation(&self) -> Option<&BusinessRuleViolation> {
        match self {
            ClaimError::BusinessRule(rule) => Some(rule),
            _ => None,
        }
    }
}

/// A business rule that rejected the operation, each with its own message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessRuleViolation {
    #[error("Premium has not been paid for policy {policy_number} yet")]
    PremiumNotPaid { policy_number: String },

    #[error("Claim amount ({amount}) exceeds the policy coverage limit of {limit}")]
    ExceedsCoverage { amount: Decimal, limit: Decimal },

    #[error("Claim already submitted for treatment {treatment_id}")]
    DuplicateTreatmentClaim { treatment_id: TreatmentId },

    #[error("Policy {policy_number} is not active (status: {status})")]
    PolicyNotActive {
        policy_number: String,
        status: PolicyStatus,
    },

    #[error("Premium already paid for policy {policy_number}")]
    PremiumAlreadyPaid { policy_number: String },

    #[error("Insufficient payment amount {offered}. Required: {required}")]
    InsufficientPremium { required: Decimal, offered: Decimal },

    #[error("Payment method is required")]
    PaymentMethodRequired,

    #[error("Claim amount must be positive")]
    ClaimAmountNotPositive,

    #[error("Approved amount must be positive")]
    ApprovedAmountNotPositive,

    #[error("Approved amount ({approved}) exceeds the claimed amount ({claimed})")]
    ApprovedAmountExceedsClaim { approved: Decimal, claimed: Decimal },

    #[error("A rejection reason is required")]
    RejectionReasonRequired,

    #[error("Claim description must not be empty")]
    DescriptionRequired,

    #[error("Invalid treatment details: {0}")]
    InvalidTreatment(String),

    #[error("Treatment {treatment_id} is recorded against policy {recorded}, not {requested}")]
    TreatmentPolicyMismatch {
        treatment_id: TreatmentId,
        recorded: PolicyId,
        requested: PolicyId,
    },

    #[error("Claim {0} has no policy bound")]
    PolicyNotBound(ClaimId),

    #[error("Invalid claim query: {0}")]
    InvalidQuery(String),

    #[error("Policies can only be enrolled for customers; user {user_id} is {role}")]
    NotACustomer { user_id: UserId, role: Role },

    #[error("Customer already has an active policy for plan {plan_id}")]
    DuplicateActivePolicy { plan_id: PlanId },

    #[error("Plan {plan_id} is not open for enrollment")]
    PlanInactive { plan_id: PlanId },

    #[error("Policy {policy_number} is {status}; its status cannot be changed")]
    PolicyStatusLocked {
        policy_number: String,
        status: PolicyStatus,
    },

    #[error("Policy term starting {start} cannot be computed")]
    InvalidPolicyTerm { start: NaiveDate },
}
