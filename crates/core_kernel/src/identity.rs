//! Caller identity
//!
//! Every domain operation receives an already-verified `(user_id, role)` pair.
//! Identity is never taken from request payload fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::identifiers::UserId;

/// Organizational role of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Customer,
    InsuranceAgent,
    ClaimsOfficer,
    HospitalManager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Customer => "Customer",
            Role::InsuranceAgent => "InsuranceAgent",
            Role::ClaimsOfficer => "ClaimsOfficer",
            Role::HospitalManager => "HospitalManager",
        }
    }

    /// Roles allowed to delete a claim regardless of its state or owner
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::ClaimsOfficer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            "insuranceagent" | "insurance_agent" | "agent" => Ok(Role::InsuranceAgent),
            "claimsofficer" | "claims_officer" => Ok(Role::ClaimsOfficer),
            "hospitalmanager" | "hospital_manager" => Ok(Role::HospitalManager),
            other => Err(CoreError::validation(format!("unknown role '{}'", other))),
        }
    }
}

/// Verified caller identity supplied to every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn customer(user_id: UserId) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn claims_officer(user_id: UserId) -> Self {
        Self::new(user_id, Role::ClaimsOfficer)
    }

    pub fn hospital_manager(user_id: UserId) -> Self {
        Self::new(user_id, Role::HospitalManager)
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}
