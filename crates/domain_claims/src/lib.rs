//! Claims Lifecycle Domain
//!
//! This crate implements the health-insurance claims lifecycle from customer
//! initiation through hospital treatment updates, officer review, and payout settlement.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Initiated -> AwaitingPolicy -> Submitted -> InReview -> Approved -> Paid
//!                                    \            \
//!                                     +------------+-> Rejected
//! ```
//!
//! Direct submission against an existing treatment record enters at `Submitted`.
//! Claims are only accepted on policies whose premium is paid; enrolling or
//! renewing a policy leaves the premium unpaid.
//! All storage, directory, and notification access goes through [`ports`].

pub mod claim;
pub mod policy;
pub mod treatment;
pub mod payment;
pub mod hospital;
pub mod coverage;
pub mod settlement;
pub mod engine;
pub mod premium;
pub mod query;
pub mod notifier;
pub mod ports;
pub mod error;

pub use claim::{Claim, ClaimStatus, NewClaim};
pub use policy::{Enrollment, NewPolicy, Plan, Policy, PolicyStatus, PolicyWithPlan, RENEWAL_LOADING};
pub use treatment::{NewTreatment, TreatmentInput, TreatmentRecord};
pub use payment::{NewPayment, Payment, PaymentStatus, PaymentType, AUTO_SETTLEMENT_METHOD};
pub use hospital::Hospital;
pub use settlement::SettlementProcessor;
pub use engine::{ClaimsEngine, ReviewDecision, ReviewOutcome};
pub use query::{ClaimListQuery, ClaimScope, ClaimSortField, Page, SortDirection};
pub use notifier::{Inbox, Notification, Outbound, QueuedNotifier};
pub use ports::{
    CapabilityDirectory, LedgerStore, LedgerTransaction, NotificationInbox, NotificationSink,
};
pub use error::{BusinessRuleViolation, ClaimError, ErrorKind};
