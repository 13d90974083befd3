//! Row types and SQL fragments for the claims ledger tables

pub mod claims;

pub use claims::{
    ClaimRow, DbClaimStatus, DbPaymentStatus, DbPaymentType, DbPolicyStatus, HospitalRow,
    NotificationRow, PaymentRow, PlanRow, PolicyPlanRow, PolicyRow, TreatmentRow,
};
