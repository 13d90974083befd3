//! Core Kernel - Foundational types shared by the claims system
//!
//! This crate provides the building blocks used across all crates:
//! - Numeric identifiers and human reference numbers
//! - The verified caller identity and organizational roles
//! - The port error vocabulary for adapters

pub mod identifiers;
pub mod identity;
pub mod ports;
pub mod error;

pub use identifiers::{
    PlanId, PolicyId, ClaimId, TreatmentId, PaymentId, HospitalId, UserId, NotificationId,
    ReferenceKind, ReferenceNumber,
};
pub use identity::{Identity, Role};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckable, HealthCheckResult,
};
pub use error::CoreError;
