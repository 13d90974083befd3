//! Claims ledger row types
//!
//! Row structs mirror the tables in `migrations/0001_claims_ledger.sql` and
//! convert into domain entities. PostgreSQL enums have their own `Db*` types so
//! the domain crate stays free of SQLx.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{
    ClaimId, HospitalId, NotificationId, PaymentId, PlanId, PolicyId, TreatmentId, UserId,
};
use domain_claims::{
    Claim, ClaimStatus, Hospital, Notification, Payment, PaymentStatus, PaymentType, Plan, Policy,
    PolicyStatus, PolicyWithPlan, TreatmentRecord,
};

/// Columns selected for a claim, qualified by the `c` alias
pub const CLAIM_COLUMNS: &str = "c.id, c.claim_number, c.treatment_description, c.policy_id, \
    c.customer_id, c.hospital_id, c.treatment_id, c.claim_amount, c.approved_amount, \
    c.treatment_date, c.treatment_details, c.status, c.reviewed_by, c.rejection_reason, \
    c.submitted_at, c.reviewed_at, c.processed_at";

/// Columns selected for a treatment record
pub const TREATMENT_COLUMNS: &str = "id, hospital_id, policy_id, customer_id, treatment_date, \
    diagnosis, treatment_details, cost, submitted_at";

/// Columns selected for a payment
pub const PAYMENT_COLUMNS: &str = "id, reference, policy_id, claim_id, amount, payment_type, \
    status, payment_date, payment_method, created_at";

/// Columns selected for a plan
pub const PLAN_COLUMNS: &str = "id, name, premium_amount, coverage_limit, duration_in_months, is_active";

/// Columns selected for a policy
pub const POLICY_COLUMNS: &str = "id, policy_number, customer_id, agent_id, plan_id, start_date, \
    end_date, status, premium_paid, premium_amount";

/// Claim status as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum DbClaimStatus {
    Submitted,
    InReview,
    Approved,
    Rejected,
    Paid,
    Initiated,
    AwaitingHospital,
    AwaitingPolicy,
}

impl From<ClaimStatus> for DbClaimStatus {
    fn from(status: ClaimStatus) -> Self {
        match status {
            ClaimStatus::Submitted => DbClaimStatus::Submitted,
            ClaimStatus::InReview => DbClaimStatus::InReview,
            ClaimStatus::Approved => DbClaimStatus::Approved,
            ClaimStatus::Rejected => DbClaimStatus::Rejected,
            ClaimStatus::Paid => DbClaimStatus::Paid,
            ClaimStatus::Initiated => DbClaimStatus::Initiated,
            ClaimStatus::AwaitingHospital => DbClaimStatus::AwaitingHospital,
            ClaimStatus::AwaitingPolicy => DbClaimStatus::AwaitingPolicy,
        }
    }
}

impl From<DbClaimStatus> for ClaimStatus {
    fn from(status: DbClaimStatus) -> Self {
        match status {
            DbClaimStatus::Submitted => ClaimStatus::Submitted,
            DbClaimStatus::InReview => ClaimStatus::InReview,
            DbClaimStatus::Approved => ClaimStatus::Approved,
            DbClaimStatus::Rejected => ClaimStatus::Rejected,
            DbClaimStatus::Paid => ClaimStatus::Paid,
            DbClaimStatus::Initiated => ClaimStatus::Initiated,
            DbClaimStatus::AwaitingHospital => ClaimStatus::AwaitingHospital,
            DbClaimStatus::AwaitingPolicy => ClaimStatus::AwaitingPolicy,
        }
    }
}

/// Policy status as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "policy_status", rename_all = "snake_case")]
pub enum DbPolicyStatus {
    Active,
    Suspended,
    Expired,
    Cancelled,
}

impl From<DbPolicyStatus> for PolicyStatus {
    fn from(status: DbPolicyStatus) -> Self {
        match status {
            DbPolicyStatus::Active => PolicyStatus::Active,
            DbPolicyStatus::Suspended => PolicyStatus::Suspended,
            DbPolicyStatus::Expired => PolicyStatus::Expired,
            DbPolicyStatus::Cancelled => PolicyStatus::Cancelled,
        }
    }
}

impl From<PolicyStatus> for DbPolicyStatus {
    fn from(status: PolicyStatus) -> Self {
        match status {
            PolicyStatus::Active => DbPolicyStatus::Active,
            PolicyStatus::Suspended => DbPolicyStatus::Suspended,
            PolicyStatus::Expired => DbPolicyStatus::Expired,
            PolicyStatus::Cancelled => DbPolicyStatus::Cancelled,
        }
    }
}

/// Payment type as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
pub enum DbPaymentType {
    Premium,
    Payout,
}

impl From<PaymentType> for DbPaymentType {
    fn from(payment_type: PaymentType) -> Self {
        match payment_type {
            PaymentType::Premium => DbPaymentType::Premium,
            PaymentType::Payout => DbPaymentType::Payout,
        }
    }
}

impl From<DbPaymentType> for PaymentType {
    fn from(payment_type: DbPaymentType) -> Self {
        match payment_type {
            DbPaymentType::Premium => PaymentType::Premium,
            DbPaymentType::Payout => PaymentType::Payout,
        }
    }
}

/// Payment status as stored in PostgreSQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum DbPaymentStatus {
    Completed,
}

impl From<PaymentStatus> for DbPaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Completed => DbPaymentStatus::Completed,
        }
    }
}

impl From<DbPaymentStatus> for PaymentStatus {
    fn from(status: DbPaymentStatus) -> Self {
        match status {
            DbPaymentStatus::Completed => PaymentStatus::Completed,
        }
    }
}

/// Database row for a claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub id: i64,
    pub claim_number: String,
    pub treatment_description: Option<String>,
    pub policy_id: Option<i64>,
    pub customer_id: i64,
    pub hospital_id: Option<i64>,
    pub treatment_id: Option<i64>,
    pub claim_amount: Option<Decimal>,
    pub approved_amount: Decimal,
    pub treatment_date: Option<NaiveDate>,
    pub treatment_details: Option<String>,
    pub status: DbClaimStatus,
    pub reviewed_by: Option<i64>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<ClaimRow> for Claim {
    fn from(row: ClaimRow) -> Self {
        Claim {
            id: ClaimId::new(row.id),
            claim_number: row.claim_number,
            treatment_description: row.treatment_description,
            policy_id: row.policy_id.map(PolicyId::new),
            customer_id: UserId::new(row.customer_id),
            hospital_id: row.hospital_id.map(HospitalId::new),
            treatment_id: row.treatment_id.map(TreatmentId::new),
            claim_amount: row.claim_amount,
            approved_amount: row.approved_amount,
            treatment_date: row.treatment_date,
            treatment_details: row.treatment_details,
            status: row.status.into(),
            reviewed_by: row.reviewed_by.map(UserId::new),
            rejection_reason: row.rejection_reason,
            submitted_at: row.submitted_at,
            reviewed_at: row.reviewed_at,
            processed_at: row.processed_at,
        }
    }
}

/// Database row for a policy
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyRow {
    pub id: i64,
    pub policy_number: String,
    pub customer_id: i64,
    pub agent_id: Option<i64>,
    pub plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: DbPolicyStatus,
    pub premium_paid: bool,
    pub premium_amount: Decimal,
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        Policy {
            id: PolicyId::new(row.id),
            policy_number: row.policy_number,
            customer_id: UserId::new(row.customer_id),
            agent_id: row.agent_id.map(UserId::new),
            plan_id: PlanId::new(row.plan_id),
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.into(),
            premium_paid: row.premium_paid,
            premium_amount: row.premium_amount,
        }
    }
}

/// Database row for a plan
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanRow {
    pub id: i64,
    pub name: String,
    pub premium_amount: Decimal,
    pub coverage_limit: Decimal,
    pub duration_in_months: i32,
    pub is_active: bool,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan {
            id: PlanId::new(row.id),
            name: row.name,
            premium_amount: row.premium_amount,
            coverage_limit: row.coverage_limit,
            duration_in_months: u32::try_from(row.duration_in_months).unwrap_or_default(),
            is_active: row.is_active,
        }
    }
}

/// Database row for a policy joined with its plan
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyPlanRow {
    #[sqlx(flatten)]
    pub policy: PolicyRow,
    pub plan_name: String,
    pub plan_premium_amount: Decimal,
    pub coverage_limit: Decimal,
    pub duration_in_months: i32,
    pub plan_is_active: bool,
}

impl From<PolicyPlanRow> for PolicyWithPlan {
    fn from(row: PolicyPlanRow) -> Self {
        let plan = Plan {
            id: PlanId::new(row.policy.plan_id),
            name: row.plan_name,
            premium_amount: row.plan_premium_amount,
            coverage_limit: row.coverage_limit,
            duration_in_months: u32::try_from(row.duration_in_months).unwrap_or_default(),
            is_active: row.plan_is_active,
        };
        PolicyWithPlan {
            policy: row.policy.into(),
            plan,
        }
    }
}

/// Database row for a treatment record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TreatmentRow {
    pub id: i64,
    pub hospital_id: i64,
    pub policy_id: Option<i64>,
    pub customer_id: i64,
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub treatment_details: String,
    pub cost: Decimal,
    pub submitted_at: DateTime<Utc>,
}

impl From<TreatmentRow> for TreatmentRecord {
    fn from(row: TreatmentRow) -> Self {
        TreatmentRecord {
            id: TreatmentId::new(row.id),
            hospital_id: HospitalId::new(row.hospital_id),
            policy_id: row.policy_id.map(PolicyId::new),
            customer_id: UserId::new(row.customer_id),
            treatment_date: row.treatment_date,
            diagnosis: row.diagnosis,
            treatment_details: row.treatment_details,
            cost: row.cost,
            submitted_at: row.submitted_at,
        }
    }
}

/// Database row for a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub reference: String,
    pub policy_id: i64,
    pub claim_id: Option<i64>,
    pub amount: Decimal,
    pub payment_type: DbPaymentType,
    pub status: DbPaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: PaymentId::new(row.id),
            reference: row.reference,
            policy_id: PolicyId::new(row.policy_id),
            claim_id: row.claim_id.map(ClaimId::new),
            amount: row.amount,
            payment_type: row.payment_type.into(),
            status: row.status.into(),
            payment_date: row.payment_date,
            payment_method: row.payment_method,
            created_at: row.created_at,
        }
    }
}

/// Database row for a hospital
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HospitalRow {
    pub id: i64,
    pub name: String,
    pub user_id: Option<i64>,
}

impl From<HospitalRow> for Hospital {
    fn from(row: HospitalRow) -> Self {
        Hospital {
            id: HospitalId::new(row.id),
            name: row.name,
            manager_id: row.user_id.map(UserId::new),
        }
    }
}

/// Database row for a notification
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: NotificationId::new(row.id),
            user_id: UserId::new(row.user_id),
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}
