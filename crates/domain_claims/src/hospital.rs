//! Hospitals

use serde::{Deserialize, Serialize};

use core_kernel::{HospitalId, UserId};

/// A hospital and the user account that manages it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    /// Linked HospitalManager account, if any
    pub manager_id: Option<UserId>,
}

impl Hospital {
    pub fn is_managed_by(&self, user: UserId) -> bool {
        self.manager_id == Some(user)
    }
}
